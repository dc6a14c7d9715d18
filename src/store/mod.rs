//! Problem storage.
//!
//! A problem store maps a [`ProblemId`] to the explanation document and
//! reference solution of one exercise. The filesystem tree is the source of
//! truth ([`FsStore`]); [`MemoryStore`] provides the same capability set
//! without touching disk.

mod fs;
mod memory;
mod metadata;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub use crate::render::ExplanationFormat;
pub use fs::{EXPLANATION_FILE, EXPLANATION_HTML_FILE, FsStore, SOLUTION_FILE, VIDEO_LINK_FILE};
pub use memory::MemoryStore;
pub use metadata::{Category, Difficulty};

/// `<N>_<slug>` directory names.
static PROBLEM_DIR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)_(.+)$").expect("valid problem dir regex"));

/// Stable numeric identifier of a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProblemId(pub u32);

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProblemId {
    type Err = StoreError;

    /// Accepts a bare number (`"1"`) or a full slug (`"1_matrix_times_vector"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u32>() {
            return Ok(Self(n));
        }
        parse_problem_dir(trimmed)
            .map(|(id, _)| id)
            .ok_or_else(|| StoreError::InvalidId(s.to_string()))
    }
}

/// Split a directory name into its id and the title-bearing remainder.
pub fn parse_problem_dir(name: &str) -> Option<(ProblemId, &str)> {
    let caps = PROBLEM_DIR_RE.captures(name)?;
    let number = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let rest = caps.get(2)?.as_str();
    Some((ProblemId(number), rest))
}

/// Listing entry for one problem directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemSummary {
    pub id: ProblemId,
    /// Directory name, e.g. `1_matrix_times_vector`.
    pub slug: String,
    /// Human title derived from the slug, e.g. `matrix times vector`.
    pub title: String,
    pub difficulty: Difficulty,
    pub category: Category,
}

impl ProblemSummary {
    /// Build a summary from a `<N>_<slug>` directory name.
    ///
    /// Returns `None` for directories that do not follow the convention.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let (id, rest) = parse_problem_dir(name)?;
        Some(Self {
            id,
            slug: name.to_string(),
            title: rest.replace('_', " "),
            difficulty: Difficulty::for_id(id),
            category: Category::for_slug(rest),
        })
    }
}

/// A fully loaded problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub summary: ProblemSummary,
    pub explanation_text: String,
    pub explanation_format: ExplanationFormat,
    pub solution_text: String,
    /// File name the solution was read from (saves go back here).
    pub solution_file: String,
    /// Other `solution*.py` files in the directory, read-only.
    pub alternate_solutions: Vec<String>,
    pub video_link: Option<String>,
    /// Interactive-learning notebook for this problem, when one exists.
    pub notebook: Option<PathBuf>,
}

impl Problem {
    pub const fn id(&self) -> ProblemId {
        self.summary.id
    }
}

/// Which of a problem's two editable files an operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileKind {
    #[default]
    Explanation,
    Solution,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explanation => write!(f, "explanation"),
            Self::Solution => write!(f, "solution"),
        }
    }
}

/// Errors raised by a [`ProblemStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The problem directory or one of its expected files is missing.
    #[error("problem {id} not found: {what}")]
    NotFound { id: ProblemId, what: String },

    /// Read or write failure at the filesystem layer.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first file was written but the second failed; the two files are
    /// now out of sync and nothing was rolled back.
    #[error(
        "problem {id}: {written} saved but {failed} failed ({source}); files are out of sync"
    )]
    PartialSave {
        id: ProblemId,
        written: FileKind,
        failed: FileKind,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid problem id: {0:?}")]
    InvalidId(String),
}

impl StoreError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Capability set shared by every problem backing store.
pub trait ProblemStore {
    /// Enumerate problems, sorted by id.
    ///
    /// Re-reads the backing store on every call; nothing is cached.
    ///
    /// # Errors
    /// Returns [`StoreError::Io`] when the store cannot be enumerated.
    fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError>;

    /// Load the explanation and solution for `id`.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when the problem or one of its files is
    /// missing, [`StoreError::Io`] when a file cannot be read.
    fn load(&self, id: ProblemId) -> Result<Problem, StoreError>;

    /// Overwrite both files of `id`. Explanation is written first.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] for an unknown problem, [`StoreError::Io`]
    /// when the first write fails, [`StoreError::PartialSave`] when only the
    /// second one does.
    fn save(&self, id: ProblemId, explanation: &str, solution: &str) -> Result<(), StoreError>;

    /// Overwrite the two files `problem` was loaded from, even when a
    /// preferred file has appeared next to them since.
    ///
    /// Stores without file fallbacks can keep the default, which is
    /// [`ProblemStore::save`].
    ///
    /// # Errors
    /// Same as [`ProblemStore::save`].
    fn save_loaded(
        &self,
        problem: &Problem,
        explanation: &str,
        solution: &str,
    ) -> Result<(), StoreError> {
        self.save(problem.id(), explanation, solution)
    }

    /// Read one of the problem's alternate `solution*.py` files.
    ///
    /// # Errors
    /// [`StoreError::NotFound`] when `file` is not a solution file of `id`,
    /// [`StoreError::Io`] when it cannot be read.
    fn load_solution_variant(&self, id: ProblemId, file: &str) -> Result<String, StoreError>;
}

impl<S: ProblemStore + ?Sized> ProblemStore for Box<S> {
    fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        (**self).list_problems()
    }

    fn load(&self, id: ProblemId) -> Result<Problem, StoreError> {
        (**self).load(id)
    }

    fn save(&self, id: ProblemId, explanation: &str, solution: &str) -> Result<(), StoreError> {
        (**self).save(id, explanation, solution)
    }

    fn save_loaded(
        &self,
        problem: &Problem,
        explanation: &str,
        solution: &str,
    ) -> Result<(), StoreError> {
        (**self).save_loaded(problem, explanation, solution)
    }

    fn load_solution_variant(&self, id: ProblemId, file: &str) -> Result<String, StoreError> {
        (**self).load_solution_variant(id, file)
    }
}

impl<S: ProblemStore + ?Sized> ProblemStore for std::rc::Rc<S> {
    fn list_problems(&self) -> Result<Vec<ProblemSummary>, StoreError> {
        (**self).list_problems()
    }

    fn load(&self, id: ProblemId) -> Result<Problem, StoreError> {
        (**self).load(id)
    }

    fn save(&self, id: ProblemId, explanation: &str, solution: &str) -> Result<(), StoreError> {
        (**self).save(id, explanation, solution)
    }

    fn save_loaded(
        &self,
        problem: &Problem,
        explanation: &str,
        solution: &str,
    ) -> Result<(), StoreError> {
        (**self).save_loaded(problem, explanation, solution)
    }

    fn load_solution_variant(&self, id: ProblemId, file: &str) -> Result<String, StoreError> {
        (**self).load_solution_variant(id, file)
    }
}
