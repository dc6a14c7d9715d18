use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::app::{App, Focus, Message, Model};
use crate::editor::Direction;

use super::event_loop::ResizeDebouncer;

/// Lines moved per mouse wheel notch or Alt+arrow in the preview.
const PREVIEW_SCROLL_STEP: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Resize(w, h) => {
                tracing::trace!(width = w, height = h, "resize queued");
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible {
            return None;
        }
        let up = match mouse.kind {
            MouseEventKind::ScrollUp => true,
            MouseEventKind::ScrollDown => false,
            _ => return None,
        };
        let panes = crate::ui::split_panes(
            Rect::new(0, 0, model.width, model.height),
            model.preview_visible,
        );
        let at = Position::new(mouse.column, mouse.row);
        if panes.preview.is_some_and(|area| area.contains(at)) {
            return Some(if up {
                Message::PreviewScrollUp(PREVIEW_SCROLL_STEP)
            } else {
                Message::PreviewScrollDown(PREVIEW_SCROLL_STEP)
            });
        }
        if panes.list.contains(at) {
            return Some(if up { Message::ListUp } else { Message::ListDown });
        }
        if panes.editor.contains(at) && model.active_buffer().is_some() {
            return Some(Message::EditorMoveCursor(if up {
                Direction::Up
            } else {
                Direction::Down
            }));
        }
        None
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if model.help_visible {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') | KeyCode::F(1) => Some(Message::HideHelp),
                _ => None,
            };
        }

        if model.filter_editing {
            return match key.code {
                KeyCode::Esc => Some(Message::ClearFilter),
                KeyCode::Enter => Some(Message::ApplyFilter),
                KeyCode::Backspace => {
                    let mut next = model.filter.query.clone();
                    next.pop();
                    Some(Message::FilterInput(next))
                }
                KeyCode::Char(c) if !ctrl && !alt => {
                    let mut next = model.filter.query.clone();
                    next.push(c);
                    Some(Message::FilterInput(next))
                }
                _ => None,
            };
        }

        if ctrl {
            let global = match key.code {
                KeyCode::Char('q' | 'c') => Some(Message::Quit),
                KeyCode::Char('s') => Some(Message::Save),
                KeyCode::Char('t') => Some(Message::ToggleBuffer),
                KeyCode::Char('p') => Some(Message::TogglePreview),
                KeyCode::Char('r') => Some(Message::Refresh),
                KeyCode::Char('e') => Some(Message::ExportPreview),
                KeyCode::Char('o') => Some(Message::OpenVideo),
                KeyCode::Char('n') => Some(Message::CycleSolution),
                _ => None,
            };
            if global.is_some() {
                return global;
            }
        }
        if key.code == KeyCode::F(1) {
            return Some(Message::ToggleHelp);
        }

        match model.focus {
            Focus::List => Self::handle_list_key(key, model),
            Focus::Editor => Self::handle_editor_key(key, model),
        }
    }

    fn handle_list_key(key: KeyEvent, model: &Model) -> Option<Message> {
        match key.code {
            KeyCode::Char('k') | KeyCode::Up => Some(Message::ListUp),
            KeyCode::Char('j') | KeyCode::Down => Some(Message::ListDown),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::ListTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::ListBottom),
            KeyCode::Enter => model
                .highlighted_problem()
                .map(|problem| Message::SelectProblem(problem.id)),
            KeyCode::Tab => Some(Message::SwitchFocus),

            KeyCode::Char('/') => Some(Message::StartFilter),
            KeyCode::Char('d') => Some(Message::CycleDifficulty),
            KeyCode::Char('c') => Some(Message::CycleCategory),
            KeyCode::Esc if model.filter.is_active() => Some(Message::ClearFilter),

            KeyCode::Char('w') => Some(Message::ToggleWatch),
            KeyCode::Char('?') => Some(Message::ToggleHelp),
            KeyCode::Char('q') => Some(Message::Quit),
            _ => None,
        }
    }

    fn handle_editor_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);
        if model.active_buffer().is_none() {
            return match key.code {
                KeyCode::Esc | KeyCode::Tab => Some(Message::FocusList),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => Some(Message::FocusList),
            KeyCode::Up if alt => Some(Message::PreviewScrollUp(PREVIEW_SCROLL_STEP)),
            KeyCode::Down if alt => Some(Message::PreviewScrollDown(PREVIEW_SCROLL_STEP)),
            KeyCode::Up => Some(Message::EditorMoveCursor(Direction::Up)),
            KeyCode::Down => Some(Message::EditorMoveCursor(Direction::Down)),
            KeyCode::Left if ctrl => Some(Message::EditorMoveWordLeft),
            KeyCode::Right if ctrl => Some(Message::EditorMoveWordRight),
            KeyCode::Left => Some(Message::EditorMoveCursor(Direction::Left)),
            KeyCode::Right => Some(Message::EditorMoveCursor(Direction::Right)),
            KeyCode::Home if ctrl => Some(Message::EditorMoveToStart),
            KeyCode::End if ctrl => Some(Message::EditorMoveToEnd),
            KeyCode::Home => Some(Message::EditorMoveHome),
            KeyCode::End => Some(Message::EditorMoveEnd),
            KeyCode::PageUp => Some(Message::EditorPageUp),
            KeyCode::PageDown => Some(Message::EditorPageDown),
            KeyCode::Enter => Some(Message::EditorSplitLine),
            KeyCode::Tab => Some(Message::EditorInsertIndent),
            KeyCode::Backspace => Some(Message::EditorDeleteBack),
            KeyCode::Delete => Some(Message::EditorDeleteForward),
            KeyCode::Char(c) if !ctrl && !alt => Some(Message::EditorInsertChar(c)),
            _ => None,
        }
    }
}
