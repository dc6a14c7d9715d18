//! Explanation document rendering.
//!
//! This module handles:
//! - Parsing markdown with comrak (GFM extensions plus dollar math)
//! - Typesetting math spans ([`math`])
//! - Producing HTML for a browser preview and styled lines for the terminal
//!
//! Rendering is a pure function of its input and never fails: markup that
//! cannot be interpreted is shown as literal text.

mod html;
mod lines;
pub mod math;
mod types;

use comrak::Options;

pub use types::{InlineColor, InlineSpan, InlineStyle, LineType, Preview, RenderedLine};

/// Markup flavour of an explanation document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExplanationFormat {
    #[default]
    Markdown,
    Html,
}

const PREVIEW_CSS: &str = "body{font-family:sans-serif;max-width:52rem;margin:2rem auto;padding:0 1rem;line-height:1.5}\
pre{background:#f4f4f4;padding:.75rem;overflow-x:auto}\
.math.display{display:block;text-align:center;margin:1rem 0}\
.frac{display:inline-flex;flex-direction:column;vertical-align:middle;text-align:center}\
.frac .num{border-bottom:1px solid}\
.mtext{font-style:normal}";

fn create_options() -> Options {
    let mut options = Options::default();

    // Enable GFM extensions
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;

    // `$...$` and `$$...$$` become math nodes
    options.extension.math_dollars = true;
    options.extension.math_code = true;

    // Typeset math is injected as raw inline HTML
    options.render.unsafe_ = true;

    options
}

/// Rewrite `\(..\)` and `\[..\]` delimiters to `$..$` and `$$..$$`.
pub fn normalize_math_delimiters(source: &str) -> String {
    source
        .replace("\\(", "$")
        .replace("\\)", "$")
        .replace("\\[", "$$")
        .replace("\\]", "$$")
}

/// Render an explanation document to an HTML fragment.
pub fn render_html(markup: &str, format: ExplanationFormat) -> String {
    let source = normalize_math_delimiters(markup);
    match format {
        ExplanationFormat::Markdown => html::markdown_to_html(&source),
        ExplanationFormat::Html => html::typeset_math_spans(&source),
    }
}

/// Render a standalone HTML page suitable for opening in a browser.
pub fn preview_page(title: &str, markup: &str, format: ExplanationFormat) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{PREVIEW_CSS}</style>\n</head>\n<body>\n<main>\n{}</main>\n</body>\n</html>\n",
        math::escape_html(title),
        render_html(markup, format)
    )
}

/// Render an explanation document to wrapped terminal lines.
pub fn render_lines(markup: &str, format: ExplanationFormat, width: u16) -> Preview {
    let source = normalize_math_delimiters(markup);
    let width = usize::from(width.max(1));
    let lines = match format {
        ExplanationFormat::Markdown => lines::markdown_lines(&source, width),
        ExplanationFormat::Html => lines::html_lines(&source, width),
    };
    Preview::new(lines)
}
