use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::app::{Focus, Model};
use crate::render::InlineSpan;
use crate::store::{EXPLANATION_FILE, EXPLANATION_HTML_FILE, ExplanationFormat, FileKind};

use super::{LIST_MAX_WIDTH, PREVIEW_PADDING, overlays, status, style};

/// Screen regions of the main layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panes {
    pub list: Rect,
    pub editor: Rect,
    pub preview: Option<Rect>,
    /// Status bar row, shared with toasts.
    pub footer: Rect,
}

/// Split the terminal into list, editor, optional preview and footer.
pub fn split_panes(area: Rect, preview_visible: bool) -> Panes {
    let [main, footer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(area);
    let list_width = (area.width / 3).min(LIST_MAX_WIDTH);
    let [list, rest] =
        Layout::horizontal([Constraint::Length(list_width), Constraint::Min(0)]).areas(main);
    if preview_visible {
        let [editor, preview] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(rest);
        Panes {
            list,
            editor,
            preview: Some(preview),
            footer,
        }
    } else {
        Panes {
            list,
            editor: rest,
            preview: None,
            footer,
        }
    }
}

/// Width available to preview text inside a preview pane of `area`.
pub const fn preview_content_width(area: Rect) -> u16 {
    let width = area.width.saturating_sub(2 + 2 * PREVIEW_PADDING);
    if width == 0 { 1 } else { width }
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let panes = split_panes(area, model.preview_visible);

    render_list(model, frame, panes.list);
    if model.problem().is_some() {
        render_editor(model, frame, panes.editor);
        if let Some(preview) = panes.preview {
            render_preview(model, frame, preview);
        }
    } else {
        let width = area.width.saturating_sub(panes.list.width);
        let welcome = Rect::new(panes.list.right(), panes.list.y, width, panes.list.height);
        render_welcome(model, frame, welcome);
    }

    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, panes.footer);
    } else {
        status::render_status_bar(model, frame, panes.footer);
    }

    if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn focus_border(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn list_title(model: &Model) -> String {
    let mut parts = Vec::new();
    if model.filter_editing {
        parts.push(format!("/{}_", model.filter.query));
    } else if !model.filter.query.trim().is_empty() {
        parts.push(format!("\"{}\"", model.filter.query.trim()));
    }
    if let Some(difficulty) = model.filter.difficulty {
        parts.push(difficulty.to_string());
    }
    if let Some(category) = model.filter.category {
        parts.push(category.to_string());
    }
    let visible = model.visible_problems().len();
    if parts.is_empty() {
        format!(" Problems ({visible}) ")
    } else {
        format!(" Problems ({visible}/{}) {} ", model.problems.len(), parts.join(" · "))
    }
}

fn render_list(model: &Model, frame: &mut Frame, area: Rect) {
    let visible = model.visible_problems();
    let rows = area.height.saturating_sub(2) as usize;
    let max_start = visible.len().saturating_sub(rows);
    let start = model.list_scroll.min(max_start);
    let open_id = model.session.selected_id();

    let items: Vec<Line> = visible
        .iter()
        .enumerate()
        .skip(start)
        .take(rows)
        .map(|(i, problem)| {
            let selected = i == model.list_selected;
            let marker = if selected { ">" } else { " " };
            let open = if open_id == Some(problem.id) {
                if model.is_dirty() { "*" } else { "•" }
            } else {
                " "
            };
            let tag = match problem.difficulty {
                crate::store::Difficulty::Easy => "E",
                crate::store::Difficulty::Medium => "M",
                crate::store::Difficulty::Hard => "H",
            };
            let line = Line::from(vec![
                Span::raw(format!("{marker}{open}{:>3} ", problem.id)),
                Span::styled(tag, style::difficulty_style(problem.difficulty)),
                Span::raw(format!(" {}", problem.title)),
            ]);
            if selected && model.focus == Focus::List {
                line.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect();

    let block = Block::default()
        .title(list_title(model))
        .borders(Borders::ALL)
        .border_style(focus_border(model.focus == Focus::List));
    frame.render_widget(Paragraph::new(items).block(block), area);
}

fn render_editor(model: &mut Model, frame: &mut Frame, area: Rect) {
    let kind = model.active_kind;
    let focused = model.focus == Focus::Editor;
    let Some(problem) = model.problem() else {
        return;
    };
    let file_name = match kind {
        FileKind::Explanation => match problem.explanation_format {
            ExplanationFormat::Markdown => EXPLANATION_FILE.to_string(),
            ExplanationFormat::Html => EXPLANATION_HTML_FILE.to_string(),
        },
        FileKind::Solution => problem.solution_file.clone(),
    };
    let slug = problem.summary.slug.clone();
    let title = if let Some(variant) = model.shown_variant() {
        format!(" {slug}/{} [read-only] ", variant.file)
    } else {
        let dirty = model.active_buffer().is_some_and(crate::editor::EditorBuffer::is_dirty);
        format!(" {slug}/{file_name}{} ", if dirty { " [+]" } else { "" })
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(focus_border(focused));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let highlighted = if kind == FileKind::Solution {
        model.solution_highlight().map(<[Vec<InlineSpan>]>::to_vec)
    } else {
        None
    };
    let Some(buf) = model.active_buffer() else {
        return;
    };

    let total_lines = buf.line_count();
    let gutter_width = line_number_width(total_lines);
    let [gutter_area, text_area] = Layout::horizontal([
        Constraint::Length(gutter_width + 1),
        Constraint::Min(0),
    ])
    .areas(inner);

    let visible_height = inner.height as usize;
    let start = model.editor_scroll;
    let end = (start + visible_height).min(total_lines);
    let cursor = buf.cursor();

    let mut gutter: Vec<Line> = Vec::new();
    let mut content: Vec<Line> = Vec::new();
    for line_idx in start..end {
        let line_text = buf.line_at(line_idx).unwrap_or_default();
        gutter.push(Line::styled(
            format!("{:>width$} ", line_idx + 1, width = gutter_width as usize),
            Style::default().fg(Color::DarkGray),
        ));

        let segments = highlighted
            .as_ref()
            .and_then(|lines| lines.get(line_idx))
            .filter(|spans| spans.iter().map(InlineSpan::text).collect::<String>() == line_text)
            .map_or_else(
                || vec![(line_text.clone(), Style::default())],
                |spans| {
                    spans
                        .iter()
                        .map(|span| {
                            (
                                span.text().to_string(),
                                style::style_for_inline(Style::default(), span.style()),
                            )
                        })
                        .collect()
                },
            );

        let cursor_col = (focused && line_idx == cursor.line).then_some(cursor.col);
        content.push(Line::from(segments_with_cursor(segments, cursor_col)));
    }

    let cursor_x = buf.cursor_display_col();
    let text_width = text_area.width as usize;
    let hscroll = if text_width > 0 && cursor_x >= text_width {
        cursor_x + 1 - text_width
    } else {
        0
    };
    let hscroll = u16::try_from(hscroll).unwrap_or(u16::MAX);

    frame.render_widget(Paragraph::new(gutter), gutter_area);
    frame.render_widget(Paragraph::new(content).scroll((0, hscroll)), text_area);
}

/// Split styled segments so the byte at `cursor` is drawn as a block cursor.
fn segments_with_cursor(
    segments: Vec<(String, Style)>,
    cursor: Option<usize>,
) -> Vec<Span<'static>> {
    let cursor_style = Style::default().bg(Color::White).fg(Color::Black);
    let Some(col) = cursor else {
        return segments
            .into_iter()
            .map(|(text, style)| Span::styled(text, style))
            .collect();
    };

    let mut spans = Vec::new();
    let mut offset = 0usize;
    let mut placed = false;
    for (text, style) in segments {
        let len = text.len();
        if !placed && col >= offset && col < offset + len {
            let rel = col - offset;
            let ch_len = text[rel..].chars().next().map_or(1, char::len_utf8);
            if rel > 0 {
                spans.push(Span::styled(text[..rel].to_string(), style));
            }
            spans.push(Span::styled(text[rel..rel + ch_len].to_string(), cursor_style));
            if rel + ch_len < len {
                spans.push(Span::styled(text[rel + ch_len..].to_string(), style));
            }
            placed = true;
        } else {
            spans.push(Span::styled(text, style));
        }
        offset += len;
    }
    if !placed {
        spans.push(Span::styled(" ", cursor_style));
    }
    spans
}

fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect) {
    let width = preview_content_width(area);
    let rows = area.height.saturating_sub(2) as usize;
    let requested = model.preview_scroll;
    let Some(preview) = model.preview(width) else {
        return;
    };

    let max_start = preview.line_count().saturating_sub(rows);
    let start = requested.min(max_start);
    let content: Vec<Line> = preview
        .lines()
        .iter()
        .skip(start)
        .take(rows)
        .map(|line| {
            let line_style = style::style_for_line_type(line.line_type());
            if line.spans().is_empty() {
                Line::styled(line.content().to_string(), line_style)
            } else {
                Line::from(
                    line.spans()
                        .iter()
                        .map(|span| {
                            Span::styled(
                                span.text().to_string(),
                                style::style_for_inline(line_style, span.style()),
                            )
                        })
                        .collect::<Vec<_>>(),
                )
            }
        })
        .collect();
    let scroll_info = if preview.line_count() > rows {
        format!(" Preview {}/{} ", start + 1, preview.line_count())
    } else {
        " Preview ".to_string()
    };

    let block = Block::default()
        .title(scroll_info)
        .borders(Borders::ALL)
        .padding(Padding::horizontal(PREVIEW_PADDING));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_welcome(model: &Model, frame: &mut Frame, area: Rect) {
    let dim = Style::default().fg(Color::Indexed(245));
    let mut lines = vec![
        Line::styled(
            "probedit",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::raw(format!("Store: {}", model.root.display())),
        Line::raw(format!("{} problems", model.problems.len())),
        Line::raw(""),
    ];
    if model.problems.is_empty() {
        lines.push(Line::styled(
            "No <N>_<slug> directories found. Ctrl+R rescans.",
            dim,
        ));
    } else {
        lines.push(Line::styled(
            "Pick a problem with j/k and press Enter to edit it.",
            dim,
        ));
    }
    lines.push(Line::styled("Press ? for all keys.", dim));

    let block = Block::default()
        .borders(Borders::ALL)
        .padding(Padding::uniform(1));
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    if total_lines < 10 {
        1
    } else if total_lines < 100 {
        2
    } else if total_lines < 1_000 {
        3
    } else if total_lines < 10_000 {
        4
    } else if total_lines < 100_000 {
        5
    } else {
        6
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_panes_without_preview() {
        let panes = split_panes(Rect::new(0, 0, 90, 20), false);
        assert_eq!(panes.list.width, 30);
        assert_eq!(panes.editor.width, 60);
        assert!(panes.preview.is_none());
        assert_eq!(panes.footer.y, 19);
    }

    #[test]
    fn test_list_width_is_capped() {
        let panes = split_panes(Rect::new(0, 0, 300, 20), true);
        assert_eq!(panes.list.width, LIST_MAX_WIDTH);
        assert!(panes.preview.is_some());
    }

    #[test]
    fn test_cursor_splits_segment() {
        let spans = segments_with_cursor(
            vec![("ab".to_string(), Style::default()), ("cd".to_string(), Style::default())],
            Some(2),
        );
        let texts: Vec<_> = spans.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(texts, vec!["ab", "c", "d"]);
    }

    #[test]
    fn test_cursor_at_end_of_line_adds_block() {
        let spans = segments_with_cursor(vec![("ab".to_string(), Style::default())], Some(2));
        assert_eq!(spans.last().map(|s| s.content.to_string()), Some(" ".to_string()));
    }

    #[test]
    fn test_line_number_width() {
        assert_eq!(line_number_width(9), 1);
        assert_eq!(line_number_width(10), 2);
        assert_eq!(line_number_width(1_000), 4);
    }
}
