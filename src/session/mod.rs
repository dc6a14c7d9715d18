//! The problem currently open for editing.
//!
//! ```text
//!  Unselected --select ok--> Loaded --save--> Saving --done--> Loaded
//!       ^                      |  ^
//!       +-------close----------+  +--select ok (replaces buffers)
//! ```
//!
//! A failed `select` leaves the session exactly as it was. `Saving` only
//! exists for the duration of [`EditorSession::save`]; the session is
//! `Loaded` again afterwards whether the save worked or not.

use thiserror::Error;

use crate::editor::EditorBuffer;
use crate::save::{SaveController, SaveError, SaveReport};
use crate::store::{FileKind, Problem, ProblemId, ProblemStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unselected,
    Loaded,
    Saving,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no problem selected")]
    NothingSelected,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// A loaded problem and its two editable buffers.
#[derive(Debug)]
pub struct OpenProblem {
    problem: Problem,
    explanation: EditorBuffer,
    solution: EditorBuffer,
}

impl OpenProblem {
    fn new(problem: Problem) -> Self {
        Self {
            explanation: EditorBuffer::from_text(&problem.explanation_text),
            solution: EditorBuffer::from_text(&problem.solution_text),
            problem,
        }
    }

    /// The problem as it was loaded or last saved.
    pub const fn problem(&self) -> &Problem {
        &self.problem
    }

    pub const fn buffer(&self, kind: FileKind) -> &EditorBuffer {
        match kind {
            FileKind::Explanation => &self.explanation,
            FileKind::Solution => &self.solution,
        }
    }

    pub const fn buffer_mut(&mut self, kind: FileKind) -> &mut EditorBuffer {
        match kind {
            FileKind::Explanation => &mut self.explanation,
            FileKind::Solution => &mut self.solution,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.explanation.is_dirty() || self.solution.is_dirty()
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Unselected,
    Loaded(OpenProblem),
    Saving(OpenProblem),
}

#[derive(Debug, Default)]
pub struct EditorSession {
    state: State,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn phase(&self) -> SessionPhase {
        match self.state {
            State::Unselected => SessionPhase::Unselected,
            State::Loaded(_) => SessionPhase::Loaded,
            State::Saving(_) => SessionPhase::Saving,
        }
    }

    /// Load `id` from the store, replacing any open problem and its edits.
    ///
    /// # Errors
    /// Whatever the store reports; the session is left untouched.
    pub fn select<S: ProblemStore + ?Sized>(
        &mut self,
        store: &S,
        id: ProblemId,
    ) -> Result<&Problem, SessionError> {
        let problem = store.load(id).inspect_err(|err| {
            tracing::warn!(%id, error = %err, "problem selection failed");
        })?;
        tracing::debug!(%id, slug = %problem.summary.slug, "problem selected");
        self.state = State::Loaded(OpenProblem::new(problem));
        match &self.state {
            State::Loaded(open) => Ok(open.problem()),
            _ => Err(SessionError::NothingSelected),
        }
    }

    /// Drop the open problem and any unsaved edits.
    pub fn close(&mut self) {
        if let State::Loaded(open) = &self.state {
            if open.is_dirty() {
                tracing::debug!(id = %open.problem.id(), "discarding unsaved edits");
            }
        }
        self.state = State::Unselected;
    }

    pub const fn open(&self) -> Option<&OpenProblem> {
        match &self.state {
            State::Loaded(open) | State::Saving(open) => Some(open),
            State::Unselected => None,
        }
    }

    pub const fn problem(&self) -> Option<&Problem> {
        match self.open() {
            Some(open) => Some(open.problem()),
            None => None,
        }
    }

    pub fn selected_id(&self) -> Option<ProblemId> {
        self.problem().map(Problem::id)
    }

    pub fn buffer(&self, kind: FileKind) -> Option<&EditorBuffer> {
        self.open().map(|open| open.buffer(kind))
    }

    /// Mutable access to one buffer for in-place edits.
    ///
    /// # Errors
    /// [`SessionError::NothingSelected`] outside the `Loaded` phase.
    pub fn buffer_mut(&mut self, kind: FileKind) -> Result<&mut EditorBuffer, SessionError> {
        match &mut self.state {
            State::Loaded(open) => Ok(open.buffer_mut(kind)),
            _ => Err(SessionError::NothingSelected),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.open().is_some_and(OpenProblem::is_dirty)
    }

    /// Validate and persist both buffers.
    ///
    /// On success both buffers become clean and the loaded problem reflects
    /// the saved text. On failure the edits stay in place for a retry.
    ///
    /// # Errors
    /// [`SessionError::NothingSelected`] when nothing is loaded, otherwise
    /// [`SessionError::Save`] with the validation or store failure.
    pub fn save<S: ProblemStore + ?Sized>(
        &mut self,
        store: &S,
        controller: &SaveController,
    ) -> Result<SaveReport, SessionError> {
        let open = match std::mem::take(&mut self.state) {
            State::Loaded(open) => open,
            other => {
                self.state = other;
                return Err(SessionError::NothingSelected);
            }
        };

        let explanation = open.explanation.text();
        let solution = open.solution.text();
        self.state = State::Saving(open);
        let result = match &self.state {
            State::Saving(saving) => {
                controller.save_loaded(store, &saving.problem, &explanation, &solution)
            }
            _ => return Err(SessionError::NothingSelected),
        };

        let State::Saving(mut open) = std::mem::take(&mut self.state) else {
            return Err(SessionError::NothingSelected);
        };
        if result.is_ok() {
            open.explanation.mark_clean();
            open.solution.mark_clean();
            open.problem.explanation_text = explanation;
            open.problem.solution_text = solution;
        }
        self.state = State::Loaded(open);
        result.map_err(SessionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store() -> MemoryStore {
        MemoryStore::new()
            .with_problem("1_matrix_times_vector", "# Matrix times vector\n", "def f(a, b):\n    pass\n")
            .with_problem("2_transpose_matrix", "# Transpose\n", "def t(a):\n    pass\n")
    }

    #[test]
    fn test_new_session_is_unselected() {
        let session = EditorSession::new();
        assert_eq!(session.phase(), SessionPhase::Unselected);
        assert!(session.problem().is_none());
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_select_loads_both_buffers() {
        let store = store();
        let mut session = EditorSession::new();
        session.select(&store, ProblemId(1)).unwrap();
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert_eq!(
            session.buffer(FileKind::Solution).unwrap().text(),
            "def f(a, b):\n    pass\n"
        );
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_failed_select_keeps_previous_problem() {
        let store = store();
        let mut session = EditorSession::new();
        session.select(&store, ProblemId(1)).unwrap();
        session.buffer_mut(FileKind::Solution).unwrap().insert_str("# wip\n");

        let err = session.select(&store, ProblemId(99)).unwrap_err();
        assert!(matches!(err, SessionError::Store(ref e) if e.is_not_found()));
        assert_eq!(session.selected_id(), Some(ProblemId(1)));
        assert!(session.is_dirty());
    }

    #[test]
    fn test_buffer_mut_requires_selection() {
        let mut session = EditorSession::new();
        assert!(matches!(
            session.buffer_mut(FileKind::Explanation),
            Err(SessionError::NothingSelected)
        ));
    }

    #[test]
    fn test_save_marks_clean_and_updates_problem() {
        let store = store();
        let mut session = EditorSession::new();
        session.select(&store, ProblemId(2)).unwrap();
        let buffer = session.buffer_mut(FileKind::Solution).unwrap();
        buffer.move_to_end();
        buffer.insert_str("# done\n");

        let report = session.save(&store, &SaveController::default()).unwrap();
        assert_eq!(report.id, ProblemId(2));
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert!(!session.is_dirty());
        assert_eq!(
            session.problem().unwrap().solution_text,
            "def t(a):\n    pass\n# done\n"
        );
    }

    #[test]
    fn test_failed_save_keeps_edits() {
        let store = store();
        store.fail_writes(Some(FileKind::Explanation));
        let mut session = EditorSession::new();
        session.select(&store, ProblemId(1)).unwrap();
        session.buffer_mut(FileKind::Explanation).unwrap().insert_char('!');

        let err = session.save(&store, &SaveController::default()).unwrap_err();
        assert!(matches!(err, SessionError::Save(SaveError::Store(_))));
        assert_eq!(session.phase(), SessionPhase::Loaded);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_save_without_selection() {
        let store = store();
        let mut session = EditorSession::new();
        assert!(matches!(
            session.save(&store, &SaveController::default()),
            Err(SessionError::NothingSelected)
        ));
        assert_eq!(session.phase(), SessionPhase::Unselected);
    }

    #[test]
    fn test_close_discards_edits() {
        let store = store();
        let mut session = EditorSession::new();
        session.select(&store, ProblemId(1)).unwrap();
        session.buffer_mut(FileKind::Solution).unwrap().insert_char('x');
        session.close();
        assert_eq!(session.phase(), SessionPhase::Unselected);

        session.select(&store, ProblemId(1)).unwrap();
        assert!(!session.is_dirty());
    }
}
