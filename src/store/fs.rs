//! Filesystem-backed problem store.
//!
//! Layout:
//!
//! ```text
//! Problems/
//!   1_matrix_times_vector/
//!     learn.md        explanation (learn.html also accepted)
//!     solution.py     reference solution (falls back to solution*.py)
//!     video.txt       optional, single URL
//!   interactive_learn/
//!     problem-1/notebook.py
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::{
    ExplanationFormat, FileKind, Problem, ProblemId, ProblemStore, ProblemSummary, StoreError,
    parse_problem_dir,
};

pub const EXPLANATION_FILE: &str = "learn.md";
pub const EXPLANATION_HTML_FILE: &str = "learn.html";
pub const SOLUTION_FILE: &str = "solution.py";
pub const VIDEO_LINK_FILE: &str = "video.txt";
const INTERACTIVE_DIR: &str = "interactive_learn";
const NOTEBOOK_FILE: &str = "notebook.py";

/// Problem store rooted at a `Problems/` directory.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding problem `id`.
    ///
    /// When several directories share a number the first by name wins.
    fn problem_dir(&self, id: ProblemId) -> Result<PathBuf, StoreError> {
        let mut matches: Vec<String> = self
            .dir_names()?
            .into_iter()
            .filter(|name| parse_problem_dir(name).is_some_and(|(found, _)| found == id))
            .collect();
        matches.sort();
        matches
            .into_iter()
            .next()
            .map(|name| self.root.join(name))
            .ok_or_else(|| StoreError::NotFound {
                id,
                what: format!("no problem directory under {}", self.root.display()),
            })
    }

    fn dir_names(&self) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());
            if is_dir {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn notebook_path(&self, id: ProblemId) -> Option<PathBuf> {
        let path = self
            .root
            .join(INTERACTIVE_DIR)
            .join(format!("problem-{id}"))
            .join(NOTEBOOK_FILE);
        path.is_file().then_some(path)
    }
}

/// Explanation file present in `dir`, if any.
fn explanation_file(dir: &Path) -> Option<(PathBuf, ExplanationFormat)> {
    let md = dir.join(EXPLANATION_FILE);
    if md.is_file() {
        return Some((md, ExplanationFormat::Markdown));
    }
    let html = dir.join(EXPLANATION_HTML_FILE);
    html.is_file().then_some((html, ExplanationFormat::Html))
}

/// All `solution*.py` file names in `dir`, primary first.
///
/// `solution.py` is primary when present, otherwise the first by name.
fn solution_files(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = fs::read_dir(dir).map_err(|e| StoreError::io(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| StoreError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("solution")
            && Path::new(&name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("py"))
            && entry.file_type().is_ok_and(|t| t.is_file())
        {
            names.push(name);
        }
    }
    names.sort();
    if let Some(pos) = names.iter().position(|n| n == SOLUTION_FILE) {
        let primary = names.remove(pos);
        names.insert(0, primary);
    }
    Ok(names)
}

fn read_text(path: &Path) -> Result<String, StoreError> {
    let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
    String::from_utf8(bytes)
        .map_err(|e| StoreError::io(path, io::Error::new(io::ErrorKind::InvalidData, e)))
}

fn read_video_link(dir: &Path) -> Result<Option<String>, StoreError> {
    let path = dir.join(VIDEO_LINK_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    let text = read_text(&path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(ToOwned::to_owned))
}

/// Replace `path` with `contents` via a temp file in the same directory.
///
/// A symlinked `path` is resolved so the link survives, and the existing
/// file's permissions carry over to the replacement.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let target = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    if let Ok(existing) = fs::metadata(&target) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

impl ProblemStore for FsStore {
    fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        let mut problems: Vec<ProblemSummary> = self
            .dir_names()?
            .iter()
            .filter_map(|name| ProblemSummary::from_dir_name(name))
            .collect();
        problems.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.slug.cmp(&b.slug)));
        tracing::debug!(root = %self.root.display(), count = problems.len(), "listed problems");
        Ok(problems)
    }

    fn load(&self, id: ProblemId) -> Result<Problem, StoreError> {
        let dir = self.problem_dir(id)?;
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let summary = ProblemSummary::from_dir_name(&dir_name).ok_or_else(|| {
            StoreError::NotFound {
                id,
                what: dir.display().to_string(),
            }
        })?;

        let (explanation_path, explanation_format) =
            explanation_file(&dir).ok_or_else(|| StoreError::NotFound {
                id,
                what: dir.join(EXPLANATION_FILE).display().to_string(),
            })?;

        let mut solutions = solution_files(&dir)?;
        if solutions.is_empty() {
            return Err(StoreError::NotFound {
                id,
                what: dir.join(SOLUTION_FILE).display().to_string(),
            });
        }
        let solution_file = solutions.remove(0);

        let problem = Problem {
            summary,
            explanation_text: read_text(&explanation_path)?,
            explanation_format,
            solution_text: read_text(&dir.join(&solution_file))?,
            solution_file,
            alternate_solutions: solutions,
            video_link: read_video_link(&dir)?,
            notebook: self.notebook_path(id),
        };
        tracing::debug!(%id, dir = %dir.display(), solution = %problem.solution_file, "loaded problem");
        Ok(problem)
    }

    fn save(&self, id: ProblemId, explanation: &str, solution: &str) -> Result<(), StoreError> {
        let dir = self.problem_dir(id)?;
        let explanation_path =
            explanation_file(&dir).map_or_else(|| dir.join(EXPLANATION_FILE), |(path, _)| path);
        let solution_path = solution_files(&dir)?
            .into_iter()
            .next()
            .map_or_else(|| dir.join(SOLUTION_FILE), |name| dir.join(name));
        write_pair(id, &explanation_path, explanation, &solution_path, solution)
    }

    fn save_loaded(
        &self,
        problem: &Problem,
        explanation: &str,
        solution: &str,
    ) -> Result<(), StoreError> {
        let id = problem.id();
        let dir = self.root.join(&problem.summary.slug);
        if !dir.is_dir() {
            return Err(StoreError::NotFound {
                id,
                what: dir.display().to_string(),
            });
        }
        let explanation_name = match problem.explanation_format {
            ExplanationFormat::Markdown => EXPLANATION_FILE,
            ExplanationFormat::Html => EXPLANATION_HTML_FILE,
        };
        write_pair(
            id,
            &dir.join(explanation_name),
            explanation,
            &dir.join(&problem.solution_file),
            solution,
        )
    }

    fn load_solution_variant(&self, id: ProblemId, file: &str) -> Result<String, StoreError> {
        let dir = self.problem_dir(id)?;
        if !solution_files(&dir)?.iter().any(|name| name == file) {
            return Err(StoreError::NotFound {
                id,
                what: dir.join(file).display().to_string(),
            });
        }
        read_text(&dir.join(file))
    }
}

/// Write the explanation, then the solution.
fn write_pair(
    id: ProblemId,
    explanation_path: &Path,
    explanation: &str,
    solution_path: &Path,
    solution: &str,
) -> Result<(), StoreError> {
    write_atomic(explanation_path, explanation)
        .map_err(|e| StoreError::io(explanation_path, e))?;
    if let Err(source) = write_atomic(solution_path, solution) {
        tracing::warn!(
            %id,
            path = %solution_path.display(),
            error = %source,
            "solution write failed after explanation was saved"
        );
        return Err(StoreError::PartialSave {
            id,
            written: FileKind::Explanation,
            failed: FileKind::Solution,
            source,
        });
    }
    tracing::info!(%id, solution = %solution_path.display(), "saved problem");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_solution_files_prefers_solution_py() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("solution_2.py"), "b");
        write(&dir.path().join("solution.py"), "a");
        write(&dir.path().join("solution_1.py"), "c");
        write(&dir.path().join("notes.py"), "x");
        let names = solution_files(dir.path()).unwrap();
        assert_eq!(names, vec!["solution.py", "solution_1.py", "solution_2.py"]);
    }

    #[test]
    fn test_solution_files_falls_back_to_first_variant() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("solution_4.py"), "x");
        let names = solution_files(dir.path()).unwrap();
        assert_eq!(names, vec!["solution_4.py"]);
    }

    #[test]
    fn test_explanation_file_falls_back_to_html() {
        let dir = tempdir().unwrap();
        write(&dir.path().join("learn.html"), "<p>hi</p>");
        let (path, format) = explanation_file(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "learn.html");
        assert_eq!(format, ExplanationFormat::Html);
    }

    #[test]
    fn test_video_link_takes_first_non_empty_line() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join(VIDEO_LINK_FILE),
            "\n  https://youtu.be/abc  \nignored\n",
        );
        let link = read_video_link(dir.path()).unwrap();
        assert_eq!(link.as_deref(), Some("https://youtu.be/abc"));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learn.md");
        write(&path, "old");
        write_atomic(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1, "temp file should be renamed into place");
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_mode_and_symlink() {
        use std::os::unix::fs::{PermissionsExt, symlink};

        let dir = tempdir().unwrap();
        let script = dir.path().join("solution.py");
        write(&script, "print(1)\n");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        write_atomic(&script, "print(2)\n").unwrap();
        let mode = fs::metadata(&script).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);

        let real = dir.path().join("shared.md");
        write(&real, "old");
        let link = dir.path().join("learn.md");
        symlink(&real, &link).unwrap();
        write_atomic(&link, "new").unwrap();
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), "new");
    }

    #[test]
    fn test_read_text_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("learn.md");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = read_text(&path).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_notebook_path_detected() {
        let dir = tempdir().unwrap();
        write(
            &dir.path().join("interactive_learn/problem-3/notebook.py"),
            "import marimo",
        );
        let store = FsStore::new(dir.path());
        assert!(store.notebook_path(ProblemId(3)).is_some());
        assert!(store.notebook_path(ProblemId(4)).is_none());
    }
}
