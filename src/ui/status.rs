use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Focus, Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let watch_indicator = if model.watch_enabled {
        " [watching]"
    } else {
        ""
    };

    let status = if let Some(problem) = model.problem() {
        let dirty_indicator = if model.is_dirty() { " [modified]" } else { "" };
        let cursor_info = model.active_buffer().map_or_else(String::new, |buf| {
            let c = buf.cursor();
            format!("  Ln {}, Col {}", c.line + 1, buf.cursor_display_col() + 1)
        });
        let mode = match model.focus {
            Focus::List => "LIST",
            Focus::Editor => "EDIT",
        };
        format!(
            " {mode}  {} {}  [{}]{dirty_indicator}{cursor_info}{watch_indicator}  Ctrl+S:save  Ctrl+T:swap  ?:help",
            problem.id(),
            problem.summary.title,
            model.active_kind,
        )
    } else {
        format!(
            " {}  {} problems{watch_indicator}  Enter:open  /:filter  ?:help",
            model.root.display(),
            model.problems.len(),
        )
    };

    let bg = if model.focus == Focus::Editor && model.problem().is_some() {
        Color::Magenta
    } else {
        Color::DarkGray
    };
    let status_bar = Paragraph::new(status).style(Style::default().bg(bg).fg(Color::White));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
