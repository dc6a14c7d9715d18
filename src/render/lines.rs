//! Markdown to styled terminal lines.

use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{Arena, parse_document};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_width::UnicodeWidthStr;

use super::math;
use super::types::{InlineSpan, InlineStyle, LineType, RenderedLine};

const CODE_INDENT: &str = "    ";
const QUOTE_PREFIX: &str = "│ ";
const BULLETS: [&str; 3] = ["• ", "◦ ", "▪ "];

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static BLOCK_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<br\s*/?>|</(p|div|h[1-6]|li|tr|pre|blockquote)>").expect("valid block regex")
});
static DISPLAY_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").expect("valid display math regex"));
static INLINE_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").expect("valid inline math regex"));

pub(super) fn markdown_lines(source: &str, width: usize) -> Vec<RenderedLine> {
    let arena = Arena::new();
    let options = super::create_options();
    let root = parse_document(&arena, source, &options);

    let mut lines = Vec::new();
    render_children(root, &mut lines, width, 0);
    trim_trailing_empty(&mut lines);
    lines
}

/// Best-effort text rendition of an HTML explanation.
pub(super) fn html_lines(source: &str, width: usize) -> Vec<RenderedLine> {
    let with_breaks = BLOCK_END_RE.replace_all(source, "\n");
    let text = decode_entities(&TAG_RE.replace_all(&with_breaks, ""));
    let text = DISPLAY_MATH_RE.replace_all(&text, |caps: &Captures<'_>| math::to_unicode(&caps[1]));
    let text = INLINE_MATH_RE.replace_all(&text, |caps: &Captures<'_>| math::to_unicode(&caps[1]));

    let mut lines = Vec::new();
    for raw in text.lines() {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            push_gap(&mut lines);
            continue;
        }
        let spans = vec![InlineSpan::new(trimmed.to_string(), InlineStyle::default())];
        for wrapped in wrap_spans(&spans, width) {
            lines.push(RenderedLine::from_spans(wrapped, LineType::Paragraph));
        }
    }
    while lines.first().is_some_and(|l| *l.line_type() == LineType::Empty) {
        lines.remove(0);
    }
    trim_trailing_empty(&mut lines);
    lines
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn render_children<'a>(
    node: &'a AstNode<'a>,
    lines: &mut Vec<RenderedLine>,
    width: usize,
    depth: usize,
) {
    for child in node.children() {
        render_block(child, lines, width, depth);
    }
}

fn render_block<'a>(node: &'a AstNode<'a>, lines: &mut Vec<RenderedLine>, width: usize, depth: usize) {
    match &node.data.borrow().value {
        NodeValue::Heading(heading) => {
            if !lines.is_empty() {
                push_gap(lines);
            }
            let mut spans = vec![InlineSpan::new(
                format!("{} ", "#".repeat(usize::from(heading.level))),
                InlineStyle::default(),
            )];
            collect_inline(node, InlineStyle::default(), &mut spans);
            for wrapped in wrap_spans(&spans, width) {
                lines.push(RenderedLine::from_spans(wrapped, LineType::Heading(heading.level)));
            }
            lines.push(RenderedLine::empty());
        }

        NodeValue::Paragraph => {
            if let Some(display) = lone_display_math(node) {
                lines.push(RenderedLine::from_spans(
                    vec![InlineSpan::new(
                        format!("{CODE_INDENT}{display}"),
                        InlineStyle {
                            math: true,
                            ..InlineStyle::default()
                        },
                    )],
                    LineType::Math,
                ));
            } else {
                let mut spans = Vec::new();
                collect_inline(node, InlineStyle::default(), &mut spans);
                for wrapped in wrap_spans(&spans, width) {
                    lines.push(RenderedLine::from_spans(wrapped, LineType::Paragraph));
                }
            }
            lines.push(RenderedLine::empty());
        }

        NodeValue::List(list) => {
            let mut number = list.start;
            for item in node.children() {
                let marker = match list.list_type {
                    ListType::Bullet => BULLETS[depth % BULLETS.len()].to_string(),
                    ListType::Ordered => format!("{number}. "),
                };
                number += 1;
                let marker_width = marker.width();
                let mut item_lines = Vec::new();
                render_children(
                    item,
                    &mut item_lines,
                    width.saturating_sub(marker_width).max(1),
                    depth + 1,
                );
                if list.tight {
                    item_lines.retain(|l| *l.line_type() != LineType::Empty);
                }
                trim_trailing_empty(&mut item_lines);
                let pad = " ".repeat(marker_width);
                for (i, line) in item_lines.into_iter().enumerate() {
                    let prefix = if i == 0 { marker.as_str() } else { pad.as_str() };
                    let line_type = match line.line_type() {
                        LineType::Paragraph => LineType::ListItem(depth),
                        other => *other,
                    };
                    lines.push(retag(line.with_prefix(prefix), line_type));
                }
            }
            if depth == 0 {
                lines.push(RenderedLine::empty());
            }
        }

        NodeValue::CodeBlock(block) => {
            let language = block.info.split_whitespace().next().filter(|l| !l.is_empty());
            if language == Some("math") {
                for line in block.literal.lines() {
                    lines.push(RenderedLine::new(
                        format!("{CODE_INDENT}{}", math::to_unicode(line)),
                        LineType::Math,
                    ));
                }
            } else {
                for spans in crate::highlight::highlight_code(language, &block.literal) {
                    lines.push(
                        RenderedLine::from_spans(spans, LineType::CodeBlock).with_prefix(CODE_INDENT),
                    );
                }
            }
            lines.push(RenderedLine::empty());
        }

        NodeValue::BlockQuote => {
            let mut inner = Vec::new();
            render_children(node, &mut inner, width.saturating_sub(2).max(1), depth);
            trim_trailing_empty(&mut inner);
            for line in inner {
                lines.push(retag(line.with_prefix(QUOTE_PREFIX), LineType::BlockQuote));
            }
            lines.push(RenderedLine::empty());
        }

        NodeValue::ThematicBreak => {
            lines.push(RenderedLine::new("─".repeat(width.min(40)), LineType::HorizontalRule));
            lines.push(RenderedLine::empty());
        }

        NodeValue::Table(_) => {
            render_table(node, lines);
            lines.push(RenderedLine::empty());
        }

        NodeValue::HtmlBlock(html) => {
            for line in html.literal.lines() {
                lines.push(RenderedLine::new(line.to_string(), LineType::Paragraph));
            }
            lines.push(RenderedLine::empty());
        }

        _ => render_children(node, lines, width, depth),
    }
}

fn retag(line: RenderedLine, line_type: LineType) -> RenderedLine {
    if line.spans().is_empty() {
        RenderedLine::new(line.content().to_string(), line_type)
    } else {
        RenderedLine::from_spans(line.spans().to_vec(), line_type)
    }
}

/// Unicode rendition of a paragraph that holds nothing but `$$..$$`.
fn lone_display_math<'a>(node: &'a AstNode<'a>) -> Option<String> {
    let mut children = node.children();
    let only = children.next()?;
    if children.next().is_some() {
        return None;
    }
    match &only.data.borrow().value {
        NodeValue::Math(m) if m.display_math => Some(math::to_unicode(&m.literal)),
        _ => None,
    }
}

fn collect_inline<'a>(node: &'a AstNode<'a>, style: InlineStyle, out: &mut Vec<InlineSpan>) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push(InlineSpan::new(text.to_string(), style)),
            NodeValue::Code(code) => out.push(InlineSpan::new(
                code.literal.clone(),
                InlineStyle {
                    code: true,
                    ..style
                },
            )),
            NodeValue::SoftBreak => out.push(InlineSpan::new(" ".to_string(), style)),
            NodeValue::LineBreak => out.push(InlineSpan::new("\n".to_string(), style)),
            NodeValue::Emph => collect_inline(
                child,
                InlineStyle {
                    emphasis: true,
                    ..style
                },
                out,
            ),
            NodeValue::Strong => collect_inline(
                child,
                InlineStyle {
                    strong: true,
                    ..style
                },
                out,
            ),
            NodeValue::Link(_) => collect_inline(child, InlineStyle { link: true, ..style }, out),
            NodeValue::Image(link) => {
                let mut alt = Vec::new();
                collect_inline(child, style, &mut alt);
                let alt: String = alt.iter().map(InlineSpan::text).collect();
                let label = if alt.is_empty() { link.url.clone() } else { alt };
                out.push(InlineSpan::new(format!("[image: {label}]"), style));
            }
            NodeValue::Math(m) => out.push(InlineSpan::new(
                math::to_unicode(&m.literal),
                InlineStyle { math: true, ..style },
            )),
            NodeValue::HtmlInline(raw) => out.push(InlineSpan::new(raw.clone(), style)),
            _ => collect_inline(child, style, out),
        }
    }
}

fn render_table<'a>(node: &'a AstNode<'a>, lines: &mut Vec<RenderedLine>) {
    let mut rows: Vec<Vec<String>> = Vec::new();
    for row in node.children() {
        let cells = row
            .children()
            .map(|cell| {
                let mut spans = Vec::new();
                collect_inline(cell, InlineStyle::default(), &mut spans);
                spans.iter().map(InlineSpan::text).collect::<String>()
            })
            .collect();
        rows.push(cells);
    }
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|cell| cell.width())
                .max()
                .unwrap_or(0)
        })
        .collect();

    for (i, row) in rows.iter().enumerate() {
        let cells: Vec<String> = (0..columns)
            .map(|c| {
                let cell = row.get(c).map_or("", String::as_str);
                let pad = widths[c].saturating_sub(cell.width());
                format!("{cell}{}", " ".repeat(pad))
            })
            .collect();
        let style = InlineStyle {
            strong: i == 0,
            ..InlineStyle::default()
        };
        lines.push(RenderedLine::from_spans(
            vec![InlineSpan::new(cells.join(" │ ").trim_end().to_string(), style)],
            LineType::Table,
        ));
        if i == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            lines.push(RenderedLine::new(rule.join("─┼─"), LineType::Table));
        }
    }
}

fn push_gap(lines: &mut Vec<RenderedLine>) {
    if lines.last().is_some_and(|l| *l.line_type() != LineType::Empty) {
        lines.push(RenderedLine::empty());
    }
}

fn trim_trailing_empty(lines: &mut Vec<RenderedLine>) {
    while lines.last().is_some_and(|l| *l.line_type() == LineType::Empty) {
        lines.pop();
    }
}

/// Split text into alternating runs of whitespace and non-whitespace.
fn split_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut prev_space: Option<bool> = None;
    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        if prev_space.is_some_and(|p| p != is_space) {
            runs.push(&text[start..idx]);
            start = idx;
        }
        prev_space = Some(is_space);
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs
}

fn push_run(line: &mut Vec<InlineSpan>, run: &str, style: InlineStyle) {
    if let Some(last) = line.last_mut() {
        if last.style() == style {
            *last = InlineSpan::new(format!("{}{run}", last.text()), style);
            return;
        }
    }
    line.push(InlineSpan::new(run.to_string(), style));
}

fn trim_line_end(line: &mut Vec<InlineSpan>) {
    while let Some(last) = line.last_mut() {
        let trimmed = last.text().trim_end();
        if trimmed.is_empty() {
            line.pop();
            continue;
        }
        if trimmed.len() != last.text().len() {
            *last = InlineSpan::new(trimmed.to_string(), last.style());
        }
        break;
    }
}

/// Greedy word wrap that keeps span styles. `\n` forces a break.
fn wrap_spans(spans: &[InlineSpan], width: usize) -> Vec<Vec<InlineSpan>> {
    let width = width.max(1);
    let mut lines: Vec<Vec<InlineSpan>> = vec![Vec::new()];
    let mut current = 0usize;

    for span in spans {
        for (segment_idx, segment) in span.text().split('\n').enumerate() {
            if segment_idx > 0 {
                if let Some(line) = lines.last_mut() {
                    trim_line_end(line);
                }
                lines.push(Vec::new());
                current = 0;
            }
            for run in split_runs(segment) {
                let run_width = run.width();
                let is_space = run.chars().all(char::is_whitespace);
                if is_space {
                    if current == 0 || current + run_width > width {
                        continue;
                    }
                } else if current > 0 && current + run_width > width {
                    if let Some(line) = lines.last_mut() {
                        trim_line_end(line);
                    }
                    lines.push(Vec::new());
                    current = 0;
                }
                if let Some(line) = lines.last_mut() {
                    push_run(line, run, span.style());
                }
                current += run_width;
            }
        }
    }
    for line in &mut lines {
        trim_line_end(line);
    }
    lines
}
