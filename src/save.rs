//! Validation and persistence of edited problem files.

use thiserror::Error;

use crate::store::{FileKind, Problem, ProblemId, ProblemStore, StoreError};

/// Which buffers must hold something other than whitespace before a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveRules {
    pub require_solution: bool,
    pub require_explanation: bool,
}

impl Default for SaveRules {
    fn default() -> Self {
        Self {
            require_solution: true,
            require_explanation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is empty")]
    Empty(FileKind),
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("not saved: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub id: ProblemId,
    pub explanation_bytes: usize,
    pub solution_bytes: usize,
}

impl SaveReport {
    pub const fn total_bytes(&self) -> usize {
        self.explanation_bytes + self.solution_bytes
    }
}

/// Validates buffers and hands them to a store unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveController {
    rules: SaveRules,
}

impl SaveController {
    pub const fn new(rules: SaveRules) -> Self {
        Self { rules }
    }

    pub const fn rules(&self) -> SaveRules {
        self.rules
    }

    /// Check both texts against the rules. Solution is checked first.
    ///
    /// # Errors
    /// [`ValidationError::Empty`] naming the first required file that is
    /// blank.
    pub fn validate(&self, explanation: &str, solution: &str) -> Result<(), ValidationError> {
        if self.rules.require_solution && is_blank(solution) {
            return Err(ValidationError::Empty(FileKind::Solution));
        }
        if self.rules.require_explanation && is_blank(explanation) {
            return Err(ValidationError::Empty(FileKind::Explanation));
        }
        Ok(())
    }

    /// Validate, then write both texts verbatim with a single store call.
    ///
    /// # Errors
    /// [`SaveError::Validation`] without touching the store, or
    /// [`SaveError::Store`] carrying whatever the store reported.
    pub fn save<S: ProblemStore + ?Sized>(
        &self,
        store: &S,
        id: ProblemId,
        explanation: &str,
        solution: &str,
    ) -> Result<SaveReport, SaveError> {
        self.validate(explanation, solution)?;
        store.save(id, explanation, solution)?;
        Ok(saved(id, explanation, solution))
    }

    /// Like [`SaveController::save`], but writes back to the files
    /// `problem` was loaded from.
    ///
    /// # Errors
    /// Same as [`SaveController::save`].
    pub fn save_loaded<S: ProblemStore + ?Sized>(
        &self,
        store: &S,
        problem: &Problem,
        explanation: &str,
        solution: &str,
    ) -> Result<SaveReport, SaveError> {
        self.validate(explanation, solution)?;
        store.save_loaded(problem, explanation, solution)?;
        Ok(saved(problem.id(), explanation, solution))
    }
}

fn saved(id: ProblemId, explanation: &str, solution: &str) -> SaveReport {
    tracing::info!(%id, "problem saved");
    SaveReport {
        id,
        explanation_bytes: explanation.len(),
        solution_bytes: solution.len(),
    }
}

fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}
