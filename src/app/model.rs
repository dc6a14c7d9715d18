use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::editor::EditorBuffer;
use crate::render::{InlineSpan, Preview};
use crate::session::EditorSession;
use crate::store::{Category, Difficulty, FileKind, Problem, ProblemId, ProblemSummary};

const TOAST_DURATION: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which pane receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    List,
    Editor,
}

/// Narrowing applied to the problem list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemFilter {
    /// Case-insensitive substring of the title, or an exact id.
    pub query: String,
    pub difficulty: Option<Difficulty>,
    pub category: Option<Category>,
}

impl ProblemFilter {
    pub fn matches(&self, problem: &ProblemSummary) -> bool {
        if self.difficulty.is_some_and(|d| d != problem.difficulty) {
            return false;
        }
        if self.category.is_some_and(|c| c != problem.category) {
            return false;
        }
        let query = self.query.trim();
        query.is_empty()
            || problem.id.to_string() == query
            || problem.title.to_lowercase().contains(&query.to_lowercase())
    }

    pub fn is_active(&self) -> bool {
        !self.query.trim().is_empty() || self.difficulty.is_some() || self.category.is_some()
    }
}

/// Step through `None -> all[0] -> .. -> all[last] -> None`.
pub(super) fn cycle<T: Copy + PartialEq>(current: Option<T>, all: &[T]) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => all
            .iter()
            .position(|v| *v == value)
            .and_then(|i| all.get(i + 1))
            .copied(),
    }
}

/// An alternate `solution*.py` shown read-only in the solution pane.
#[derive(Debug)]
pub struct SolutionVariant {
    pub file: String,
    pub buffer: EditorBuffer,
}

#[derive(Debug)]
struct PreviewCache {
    key: (u64, u64, u16),
    preview: Preview,
}

#[derive(Debug)]
struct HighlightCache {
    key: (u64, u64),
    lines: Vec<Vec<InlineSpan>>,
}

/// The complete application state.
#[derive(Debug, Default)]
pub struct Model {
    /// Store root shown in titles and help.
    pub root: PathBuf,
    /// Last listing of the store, sorted by id.
    pub problems: Vec<ProblemSummary>,
    pub filter: ProblemFilter,
    /// Whether keystrokes currently edit the filter query
    pub filter_editing: bool,
    /// Index into [`Model::visible_problems`]
    pub list_selected: usize,
    pub list_scroll: usize,
    pub session: EditorSession,
    pub focus: Focus,
    /// Buffer shown in the editor pane
    pub active_kind: FileKind,
    pub preview_visible: bool,
    /// First visible buffer line in the editor pane
    pub editor_scroll: usize,
    pub preview_scroll: usize,
    /// Terminal size in cells
    pub width: u16,
    pub height: u16,
    pub watch_enabled: bool,
    pub help_visible: bool,
    pub should_quit: bool,
    /// Set after a first quit attempt with unsaved edits
    pub quit_confirmed: bool,
    /// Problem whose selection was refused once because of unsaved edits
    pub discard_confirmed: Option<ProblemId>,
    /// Selection approved by `update`, performed by the side-effect pass
    pub(super) load_requested: Option<ProblemId>,
    /// Alternate solution shown instead of the editable one
    pub solution_variant: Option<SolutionVariant>,
    /// Alternate solution file to read in the side-effect pass
    pub(super) variant_requested: Option<String>,
    /// Bumped whenever a problem is (re)loaded into the session
    pub(super) generation: u64,
    pub config_global_path: Option<PathBuf>,
    pub config_local_path: Option<PathBuf>,
    toast: Option<Toast>,
    preview_cache: Option<PreviewCache>,
    highlight_cache: Option<HighlightCache>,
}

impl Model {
    pub fn new(root: PathBuf, terminal_size: (u16, u16)) -> Self {
        Self {
            root,
            width: terminal_size.0,
            height: terminal_size.1,
            preview_visible: true,
            ..Self::default()
        }
    }

    /// Problems passing the current filter, in listing order.
    pub fn visible_problems(&self) -> Vec<&ProblemSummary> {
        self.problems
            .iter()
            .filter(|p| self.filter.matches(p))
            .collect()
    }

    /// The list entry under the selection bar.
    pub fn highlighted_problem(&self) -> Option<&ProblemSummary> {
        self.visible_problems().get(self.list_selected).copied()
    }

    /// Replace the listing, keeping the selection on the same problem when
    /// it still exists.
    pub fn set_problems(&mut self, problems: Vec<ProblemSummary>) {
        let previous = self.highlighted_problem().map(|p| p.id);
        self.problems = problems;
        self.reselect(previous);
    }

    pub(super) fn reselect(&mut self, id: Option<ProblemId>) {
        let visible = self.visible_problems();
        let index = id
            .and_then(|id| visible.iter().position(|p| p.id == id))
            .unwrap_or(self.list_selected);
        let count = visible.len();
        self.list_selected = index.min(count.saturating_sub(1));
    }

    pub fn problem(&self) -> Option<&Problem> {
        self.session.problem()
    }

    /// The alternate solution on screen, if the solution pane shows one.
    pub fn shown_variant(&self) -> Option<&SolutionVariant> {
        match self.active_kind {
            FileKind::Solution => self.solution_variant.as_ref(),
            FileKind::Explanation => None,
        }
    }

    /// Buffer shown in the editor pane.
    pub fn active_buffer(&self) -> Option<&EditorBuffer> {
        match self.shown_variant() {
            Some(variant) => Some(&variant.buffer),
            None => self.session.buffer(self.active_kind),
        }
    }

    /// Buffer shown in the editor pane, for cursor movement and edits.
    ///
    /// Alternate solutions are returned too; callers that change text
    /// check [`Model::shown_variant`] first.
    pub fn active_buffer_mut(&mut self) -> Option<&mut EditorBuffer> {
        if self.active_kind == FileKind::Solution {
            if let Some(variant) = self.solution_variant.as_mut() {
                return Some(&mut variant.buffer);
            }
        }
        self.session.buffer_mut(self.active_kind).ok()
    }

    /// Show `text` of alternate solution `file` read-only in the solution pane.
    pub(super) fn show_variant(&mut self, file: String, text: &str) {
        self.solution_variant = Some(SolutionVariant {
            file,
            buffer: EditorBuffer::from_text(text),
        });
        self.variant_changed();
    }

    /// Return the solution pane to the editable solution.
    pub(super) fn clear_variant(&mut self) {
        if self.solution_variant.take().is_some() {
            self.variant_changed();
        }
    }

    fn variant_changed(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.editor_scroll = 0;
        self.highlight_cache = None;
    }

    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    /// Rows available for buffer text in the editor pane.
    pub const fn editor_rows(&self) -> usize {
        // status bar plus the pane border
        self.height.saturating_sub(3) as usize
    }

    /// Rows available for the problem list.
    pub const fn list_rows(&self) -> usize {
        self.height.saturating_sub(3) as usize
    }

    /// Terminal preview of the explanation buffer, cached per edit and width.
    pub fn preview(&mut self, width: u16) -> Option<&Preview> {
        let problem = self.session.problem()?;
        let buffer = self.session.buffer(FileKind::Explanation)?;
        let key = (self.generation, buffer.revision(), width);
        if self.preview_cache.as_ref().is_none_or(|c| c.key != key) {
            let preview = crate::render::render_lines(
                &buffer.text(),
                problem.explanation_format,
                width,
            );
            self.preview_cache = Some(PreviewCache { key, preview });
        }
        self.preview_cache.as_ref().map(|c| &c.preview)
    }

    /// Highlighted lines of the solution pane, cached per edit.
    pub fn solution_highlight(&mut self) -> Option<&[Vec<InlineSpan>]> {
        let buffer = match self.solution_variant.as_ref() {
            Some(variant) => &variant.buffer,
            None => self.session.buffer(FileKind::Solution)?,
        };
        let key = (self.generation, buffer.revision());
        if self.highlight_cache.as_ref().is_none_or(|c| c.key != key) {
            let lines = crate::highlight::highlight_solution(&buffer.text());
            self.highlight_cache = Some(HighlightCache { key, lines });
        }
        self.highlight_cache.as_ref().map(|c| c.lines.as_slice())
    }

    /// Reset per-problem view state after a successful selection.
    pub(super) fn problem_loaded(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.editor_scroll = 0;
        self.preview_scroll = 0;
        self.active_kind = FileKind::Explanation;
        self.focus = Focus::Editor;
        self.discard_confirmed = None;
        self.solution_variant = None;
        self.variant_requested = None;
        self.preview_cache = None;
        self.highlight_cache = None;
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}
