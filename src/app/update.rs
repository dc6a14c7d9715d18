use crate::app::model::cycle;
use crate::app::{Focus, Model, ToastLevel};
use crate::editor::Direction;
use crate::store::{Category, Difficulty, FileKind, ProblemId};
use crate::watcher::StoreChanges;

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Problem list
    ListUp,
    ListDown,
    ListTop,
    ListBottom,
    /// Open a problem in the session (confirmed twice when edits would be lost)
    SelectProblem(ProblemId),
    /// Re-read the problem listing from the store
    Refresh,
    /// Debounced change notification from the store watcher
    StoreChanged(StoreChanges),
    ToggleWatch,

    // Filtering
    StartFilter,
    /// Replace the filter query while typing
    FilterInput(String),
    /// Stop typing and keep the query
    ApplyFilter,
    ClearFilter,
    CycleDifficulty,
    CycleCategory,

    // Panes
    SwitchFocus,
    FocusList,
    /// Swap the editor pane between explanation and solution
    ToggleBuffer,
    /// Step the solution pane through the alternate solution files
    CycleSolution,
    TogglePreview,
    PreviewScrollUp(usize),
    PreviewScrollDown(usize),
    ToggleHelp,
    HideHelp,

    // Editor
    EditorInsertChar(char),
    EditorInsertIndent,
    EditorDeleteBack,
    EditorDeleteForward,
    EditorSplitLine,
    EditorMoveCursor(Direction),
    EditorMoveHome,
    EditorMoveEnd,
    EditorMoveWordLeft,
    EditorMoveWordRight,
    EditorMoveToStart,
    EditorMoveToEnd,
    EditorPageUp,
    EditorPageDown,
    /// Validate and write both buffers
    Save,

    // Outside the terminal
    /// Write the explanation as an HTML page and open it in a browser
    ExportPreview,
    /// Open the problem's video link
    OpenVideo,

    // Window
    Resize(u16, u16),

    // Application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// Store access, file output and watcher management happen afterwards in
/// `App::handle_message_side_effects`.
pub fn update(mut model: Model, msg: Message) -> Model {
    // Confirmations only survive the message that completes them. Save keeps
    // a pending quit so Ctrl+S then Ctrl+Q still works.
    if !matches!(msg, Message::Quit | Message::Save) {
        model.quit_confirmed = false;
    }
    if !matches!(msg, Message::SelectProblem(_)) {
        model.discard_confirmed = None;
    }

    match msg {
        Message::ListUp => {
            model.list_selected = model.list_selected.saturating_sub(1);
            list_ensure_selection_visible(&mut model);
        }
        Message::ListDown => {
            let last = model.visible_problems().len().saturating_sub(1);
            model.list_selected = (model.list_selected + 1).min(last);
            list_ensure_selection_visible(&mut model);
        }
        Message::ListTop => {
            model.list_selected = 0;
            list_ensure_selection_visible(&mut model);
        }
        Message::ListBottom => {
            model.list_selected = model.visible_problems().len().saturating_sub(1);
            list_ensure_selection_visible(&mut model);
        }
        Message::SelectProblem(id) => {
            let switching = model.session.selected_id() != Some(id);
            if switching && model.is_dirty() && model.discard_confirmed != Some(id) {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Enter again to discard them, or Ctrl+S to save",
                );
                model.discard_confirmed = Some(id);
            } else if switching {
                model.discard_confirmed = None;
                model.load_requested = Some(id);
            } else {
                model.focus = Focus::Editor;
            }
        }
        Message::Refresh | Message::StoreChanged(_) | Message::Save => {
            // side effect in event loop
        }
        Message::ToggleWatch => {
            model.watch_enabled = !model.watch_enabled;
        }

        Message::StartFilter => {
            model.filter_editing = true;
            model.focus = Focus::List;
        }
        Message::FilterInput(query) => {
            let previous = model.highlighted_problem().map(|p| p.id);
            model.filter.query = query;
            model.reselect(previous);
            list_ensure_selection_visible(&mut model);
        }
        Message::ApplyFilter => {
            model.filter_editing = false;
        }
        Message::ClearFilter => {
            let previous = model.highlighted_problem().map(|p| p.id);
            model.filter_editing = false;
            model.filter = crate::app::ProblemFilter::default();
            model.reselect(previous);
            list_ensure_selection_visible(&mut model);
        }
        Message::CycleDifficulty => {
            let previous = model.highlighted_problem().map(|p| p.id);
            model.filter.difficulty = cycle(model.filter.difficulty, &Difficulty::ALL);
            model.reselect(previous);
            list_ensure_selection_visible(&mut model);
        }
        Message::CycleCategory => {
            let previous = model.highlighted_problem().map(|p| p.id);
            model.filter.category = cycle(model.filter.category, &Category::ALL);
            model.reselect(previous);
            list_ensure_selection_visible(&mut model);
        }

        Message::SwitchFocus => {
            model.focus = match model.focus {
                Focus::List if model.problem().is_some() => Focus::Editor,
                _ => Focus::List,
            };
        }
        Message::FocusList => {
            model.focus = Focus::List;
        }
        Message::ToggleBuffer => {
            if model.problem().is_some() {
                model.clear_variant();
                model.active_kind = match model.active_kind {
                    FileKind::Explanation => FileKind::Solution,
                    FileKind::Solution => FileKind::Explanation,
                };
                editor_ensure_cursor_visible(&mut model);
            }
        }
        Message::CycleSolution => cycle_solution(&mut model),
        Message::TogglePreview => {
            model.preview_visible = !model.preview_visible;
        }
        Message::PreviewScrollUp(n) => {
            model.preview_scroll = model.preview_scroll.saturating_sub(n);
        }
        Message::PreviewScrollDown(n) => {
            // clamped against the rendered length when drawn
            model.preview_scroll = model.preview_scroll.saturating_add(n);
        }
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
        }
        Message::HideHelp => {
            model.help_visible = false;
        }

        Message::EditorInsertChar(ch) => edit(&mut model, |buf| buf.insert_char(ch)),
        Message::EditorInsertIndent => edit(&mut model, |buf| buf.insert_indent()),
        Message::EditorDeleteBack => edit(&mut model, |buf| {
            buf.delete_back();
        }),
        Message::EditorDeleteForward => edit(&mut model, |buf| {
            buf.delete_forward();
        }),
        Message::EditorSplitLine => edit(&mut model, |buf| buf.split_line()),
        Message::EditorMoveCursor(dir) => navigate(&mut model, |buf| buf.move_cursor(dir)),
        Message::EditorMoveHome => navigate(&mut model, |buf| buf.move_home()),
        Message::EditorMoveEnd => navigate(&mut model, |buf| buf.move_end()),
        Message::EditorMoveWordLeft => navigate(&mut model, |buf| buf.move_word_left()),
        Message::EditorMoveWordRight => navigate(&mut model, |buf| buf.move_word_right()),
        Message::EditorMoveToStart => navigate(&mut model, |buf| buf.move_to_start()),
        Message::EditorMoveToEnd => navigate(&mut model, |buf| buf.move_to_end()),
        Message::EditorPageUp => {
            let page = page_lines(&model);
            navigate(&mut model, |buf| buf.move_vertical(-page));
        }
        Message::EditorPageDown => {
            let page = page_lines(&model);
            navigate(&mut model, |buf| buf.move_vertical(page));
        }

        Message::ExportPreview | Message::OpenVideo => {
            // side effect in event loop
        }

        Message::Resize(width, height) => {
            model.width = width;
            model.height = height;
            list_ensure_selection_visible(&mut model);
            editor_ensure_cursor_visible(&mut model);
        }

        Message::Quit => {
            if model.is_dirty() && !model.quit_confirmed {
                model.show_toast(
                    ToastLevel::Warning,
                    "Unsaved changes! Press Ctrl+Q again to quit, or Ctrl+S to save",
                );
                model.quit_confirmed = true;
            } else {
                model.should_quit = true;
            }
        }
    }
    model
}

/// Change the text of the active buffer, then keep the cursor on screen.
fn edit(model: &mut Model, f: impl FnOnce(&mut crate::editor::EditorBuffer)) {
    if let Some(file) = model.shown_variant().map(|v| v.file.clone()) {
        model.show_toast(
            ToastLevel::Warning,
            format!("{file} is read-only; Ctrl+N returns to the editable solution"),
        );
        return;
    }
    navigate(model, f);
}

/// Apply `f` to the active buffer, then keep the cursor on screen.
fn navigate(model: &mut Model, f: impl FnOnce(&mut crate::editor::EditorBuffer)) {
    if let Some(buf) = model.active_buffer_mut() {
        f(buf);
        editor_ensure_cursor_visible(model);
    }
}

/// Step `solution.py -> alternates[0] -> .. -> alternates[last] -> solution.py`.
///
/// The file is read in the side-effect pass; returning to the editable
/// solution needs no store access.
fn cycle_solution(model: &mut Model) {
    let Some(problem) = model.problem() else {
        return;
    };
    let alternates = &problem.alternate_solutions;
    if alternates.is_empty() {
        model.show_toast(ToastLevel::Info, "No other solution files");
        return;
    }
    let next = match model.shown_variant() {
        None => alternates.first(),
        Some(variant) => alternates
            .iter()
            .position(|file| *file == variant.file)
            .and_then(|i| alternates.get(i + 1)),
    }
    .cloned();
    let primary = problem.solution_file.clone();

    model.active_kind = FileKind::Solution;
    model.focus = Focus::Editor;
    if let Some(file) = next {
        model.variant_requested = Some(file);
    } else {
        model.clear_variant();
        editor_ensure_cursor_visible(model);
        model.show_toast(ToastLevel::Info, format!("Editing {primary}"));
    }
}

fn page_lines(model: &Model) -> isize {
    isize::try_from(model.editor_rows().max(1)).unwrap_or(isize::MAX)
}

/// Ensure the editor cursor line is visible in the editor pane.
pub(super) fn editor_ensure_cursor_visible(model: &mut Model) {
    let Some(cursor_line) = model.active_buffer().map(|buf| buf.cursor().line) else {
        return;
    };
    let visible_height = model.editor_rows();
    if visible_height == 0 {
        model.editor_scroll = cursor_line;
        return;
    }

    if cursor_line < model.editor_scroll {
        model.editor_scroll = cursor_line;
    } else if cursor_line >= model.editor_scroll + visible_height {
        model.editor_scroll = cursor_line + 1 - visible_height;
    }
}

fn list_ensure_selection_visible(model: &mut Model) {
    let rows = model.list_rows().max(1);
    if model.list_selected < model.list_scroll {
        model.list_scroll = model.list_selected;
    } else if model.list_selected >= model.list_scroll + rows {
        model.list_scroll = model.list_selected + 1 - rows;
    }
}
