use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::Model;

const HELP_SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Problem list",
        &[
            ("j/k or Up/Down", "Move selection"),
            ("g / G", "First / last problem"),
            ("Enter", "Open problem (twice to drop edits)"),
            ("Tab", "Focus the editor"),
            ("/", "Filter by title or id"),
            ("d / c", "Cycle difficulty / category"),
            ("Esc", "Clear filter"),
            ("w", "Toggle watch"),
        ],
    ),
    (
        "Editor",
        &[
            ("Arrows, Home/End", "Navigate"),
            ("Ctrl+Left/Right", "Word movement"),
            ("Ctrl+Home/End", "Buffer start / end"),
            ("PageUp/PageDown", "Page"),
            ("Tab", "Indent"),
            ("Alt+Up/Down", "Scroll preview"),
            ("Esc", "Back to the list"),
        ],
    ),
    (
        "Anywhere",
        &[
            ("Ctrl+S", "Save explanation and solution"),
            ("Ctrl+T", "Swap explanation / solution"),
            ("Ctrl+N", "View next solution file (read-only)"),
            ("Ctrl+P", "Toggle preview"),
            ("Ctrl+E", "Open preview in browser"),
            ("Ctrl+O", "Open video link"),
            ("Ctrl+R", "Rescan problems"),
            ("Ctrl+Q", "Quit (twice with unsaved edits)"),
            ("? / F1", "Toggle help"),
        ],
    ),
];

/// All lines of the help text, before clipping to the popup.
pub fn help_lines(model: &Model) -> Vec<Line<'static>> {
    let section_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    for (title, keys) in HELP_SECTIONS {
        lines.push(Line::styled(*title, section_style));
        for (key, action) in *keys {
            lines.push(Line::raw(format!("  {key:<20}{action}")));
        }
        lines.push(Line::raw(""));
    }

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());
    lines.push(Line::styled("Config", section_style));
    lines.push(Line::raw(format!("  Store: {}", model.root.display())));
    lines.push(Line::raw(format!("  Global: {global_cfg}")));
    lines.push(Line::raw(format!("  Local override: {local_cfg}")));
    lines
}

pub fn render_help_overlay(model: &Model, frame: &mut Frame, area: Rect) {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(4).max(12);
    let popup = centered_popup_rect(popup_width, popup_height, area);

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // Reserve 1 row at bottom for footer hint
    let content_height = inner.height.saturating_sub(1);
    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height);
    frame.render_widget(Paragraph::new(help_lines(model)), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height, inner.width, 1);
    let footer = Line::styled("Esc closes", Style::default().fg(Color::Indexed(245)));
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
