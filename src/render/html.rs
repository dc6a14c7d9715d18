use comrak::nodes::NodeValue;
use comrak::{Arena, format_html, parse_document};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::math;

static DISPLAY_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\$\$(.+?)\$\$").expect("valid display math regex"));
static INLINE_MATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([^$\n]+?)\$").expect("valid inline math regex"));

pub(super) fn markdown_to_html(source: &str) -> String {
    let arena = Arena::new();
    let options = super::create_options();
    let root = parse_document(&arena, source, &options);

    let math_nodes: Vec<_> = root
        .descendants()
        .filter(|node| matches!(node.data.borrow().value, NodeValue::Math(_)))
        .collect();
    for node in math_nodes {
        let typeset = match &node.data.borrow().value {
            NodeValue::Math(m) => math::to_html(&m.literal, m.display_math),
            _ => continue,
        };
        node.data.borrow_mut().value = NodeValue::HtmlInline(typeset);
    }

    let mut out = Vec::new();
    if let Err(err) = format_html(root, &options, &mut out) {
        tracing::warn!(error = %err, "html formatting failed, showing source");
        return format!("<pre>{}</pre>\n", math::escape_html(source));
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Typeset `$$..$$` and `$..$` spans inside an HTML document.
pub(super) fn typeset_math_spans(source: &str) -> String {
    let displayed = DISPLAY_MATH_RE.replace_all(source, |caps: &Captures<'_>| {
        math::to_html(&caps[1], true)
    });
    INLINE_MATH_RE
        .replace_all(&displayed, |caps: &Captures<'_>| math::to_html(&caps[1], false))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_structure_survives() {
        let html = markdown_to_html("# Heading\n\n- one\n- two\n");
        assert!(html.contains("<h1>Heading</h1>"));
        assert!(html.contains("<li>one</li>"));
    }

    #[test]
    fn test_math_inside_table_cell() {
        let html = markdown_to_html("| a | b |\n|---|---|\n| $x_1$ | 2 |\n");
        assert!(html.contains("<td><span class=\"math inline\"><i>x</i><sub>1</sub></span></td>"));
    }

    #[test]
    fn test_code_spans_keep_dollars() {
        let html = markdown_to_html("`echo $HOME` and `$x$`");
        assert!(html.contains("<code>echo $HOME</code>"), "got: {html}");
    }

    #[test]
    fn test_html_display_before_inline() {
        let out = typeset_math_spans("$$a$$ and $b$");
        assert!(out.starts_with("<span class=\"math display\">"));
        assert!(out.ends_with("<span class=\"math inline\"><i>b</i></span>"));
    }

    #[test]
    fn test_html_unmatched_dollar_untouched() {
        assert_eq!(typeset_math_spans("<p>$5</p>"), "<p>$5</p>");
    }
}
