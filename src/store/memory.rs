//! In-memory problem store.
//!
//! Same contract as the filesystem store, with switchable write failures so
//! callers can exercise their error paths.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{
    ExplanationFormat, FileKind, Problem, ProblemId, ProblemStore, ProblemSummary, SOLUTION_FILE,
    StoreError,
};

#[derive(Debug, Clone)]
struct Entry {
    summary: ProblemSummary,
    explanation: String,
    solution: String,
    /// Read-only `solution*.py` variants by file name.
    alternates: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<ProblemId, Entry>>,
    fail_on: Cell<Option<FileKind>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a problem keyed by its directory-style slug.
    ///
    /// # Panics
    /// Panics when `slug` is not of the form `<N>_<name>`.
    #[must_use]
    pub fn with_problem(self, slug: &str, explanation: &str, solution: &str) -> Self {
        let summary = ProblemSummary::from_dir_name(slug)
            .unwrap_or_else(|| panic!("slug {slug:?} must look like <N>_<name>"));
        self.entries.borrow_mut().insert(
            summary.id,
            Entry {
                summary,
                explanation: explanation.to_string(),
                solution: solution.to_string(),
                alternates: BTreeMap::new(),
            },
        );
        self
    }

    /// Add an alternate solution file to problem `id`.
    ///
    /// # Panics
    /// Panics when `id` has not been added.
    #[must_use]
    pub fn with_alternate_solution(self, id: ProblemId, file: &str, text: &str) -> Self {
        self.entries
            .borrow_mut()
            .get_mut(&id)
            .unwrap_or_else(|| panic!("problem {id} must be added first"))
            .alternates
            .insert(file.to_string(), text.to_string());
        self
    }

    /// Make the next writes of `kind` fail. `None` clears the fault.
    pub fn fail_writes(&self, kind: Option<FileKind>) {
        self.fail_on.set(kind);
    }

    /// Number of successful `save` calls.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    /// Current stored text of one file.
    pub fn file_text(&self, id: ProblemId, kind: FileKind) -> Option<String> {
        self.entries.borrow().get(&id).map(|e| match kind {
            FileKind::Explanation => e.explanation.clone(),
            FileKind::Solution => e.solution.clone(),
        })
    }

    /// Remove a problem, as an external edit would.
    pub fn remove(&self, id: ProblemId) {
        self.entries.borrow_mut().remove(&id);
    }
}

fn injected(kind: FileKind) -> std::io::Error {
    std::io::Error::other(format!("injected {kind} write failure"))
}

impl ProblemStore for MemoryStore {
    fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        Ok(self
            .entries
            .borrow()
            .values()
            .map(|e| e.summary.clone())
            .collect())
    }

    fn load(&self, id: ProblemId) -> Result<Problem, StoreError> {
        let entries = self.entries.borrow();
        let entry = entries.get(&id).ok_or_else(|| StoreError::NotFound {
            id,
            what: "not in memory store".to_string(),
        })?;
        Ok(Problem {
            summary: entry.summary.clone(),
            explanation_text: entry.explanation.clone(),
            explanation_format: ExplanationFormat::Markdown,
            solution_text: entry.solution.clone(),
            solution_file: SOLUTION_FILE.to_string(),
            alternate_solutions: entry.alternates.keys().cloned().collect(),
            video_link: None,
            notebook: None,
        })
    }

    fn save(&self, id: ProblemId, explanation: &str, solution: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            id,
            what: "not in memory store".to_string(),
        })?;
        if self.fail_on.get() == Some(FileKind::Explanation) {
            return Err(StoreError::io(
                format!("memory://{}", entry.summary.slug),
                injected(FileKind::Explanation),
            ));
        }
        entry.explanation = explanation.to_string();
        if self.fail_on.get() == Some(FileKind::Solution) {
            return Err(StoreError::PartialSave {
                id,
                written: FileKind::Explanation,
                failed: FileKind::Solution,
                source: injected(FileKind::Solution),
            });
        }
        entry.solution = solution.to_string();
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load_solution_variant(&self, id: ProblemId, file: &str) -> Result<String, StoreError> {
        self.entries
            .borrow()
            .get(&id)
            .and_then(|entry| entry.alternates.get(file).cloned())
            .ok_or_else(|| StoreError::NotFound {
                id,
                what: format!("{file} not in memory store"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_problem("2_transpose_matrix", "# T", "def t(): pass\n")
            .with_problem("1_matrix_times_vector", "# M", "def m(): pass\n")
    }

    #[test]
    fn test_list_is_sorted_by_id() {
        let ids: Vec<_> = store().list_problems().unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![ProblemId(1), ProblemId(2)]);
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let err = store().load(ProblemId(99)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_partial_save_keeps_explanation_write() {
        let store = store();
        store.fail_writes(Some(FileKind::Solution));
        let err = store.save(ProblemId(1), "# new", "new").unwrap_err();
        assert!(matches!(err, StoreError::PartialSave { .. }));
        assert_eq!(
            store.file_text(ProblemId(1), FileKind::Explanation).as_deref(),
            Some("# new")
        );
        assert_eq!(
            store.file_text(ProblemId(1), FileKind::Solution).as_deref(),
            Some("def m(): pass\n")
        );
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_alternate_solutions_are_listed_and_readable() {
        let store = store().with_alternate_solution(ProblemId(1), "solution_2.py", "def m2(): pass\n");
        let problem = store.load(ProblemId(1)).unwrap();
        assert_eq!(problem.alternate_solutions, vec!["solution_2.py".to_string()]);
        assert_eq!(
            store.load_solution_variant(ProblemId(1), "solution_2.py").unwrap(),
            "def m2(): pass\n"
        );
        assert!(store.load_solution_variant(ProblemId(1), "solution_9.py").unwrap_err().is_not_found());
    }
}
