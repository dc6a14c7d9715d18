//! Best-effort typesetting for the TeX subset used in problem explanations.
//!
//! Covers scripts, Greek letters, common operators, `\frac`, `\sqrt`,
//! accents, font commands and simple matrix environments. Anything else is
//! kept as literal text. Parsing never fails.

/// Parsed math expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MathNode {
    /// A single symbol: identifier letter, digit, operator or mapped command.
    Symbol(String),
    /// Upright run such as `\log` or `\text{...}` content.
    Word(String),
    Group(Vec<MathNode>),
    Script {
        base: Box<MathNode>,
        sup: Option<Box<MathNode>>,
        sub: Option<Box<MathNode>>,
    },
    Frac(Box<MathNode>, Box<MathNode>),
    Sqrt(Box<MathNode>),
    Bold(Box<MathNode>),
    /// Base followed by a combining accent mark.
    Accent(Box<MathNode>, char),
    Space,
}

/// Groups and command arguments nested deeper than this are kept as text.
const MAX_NESTING: usize = 256;

/// Parse a math expression (without its `$` delimiters).
pub fn parse(source: &str) -> Vec<MathNode> {
    let chars: Vec<char> = source.chars().collect();
    let mut parser = Parser {
        chars,
        pos: 0,
        depth: 0,
    };
    parser.sequence(false)
}

/// Typeset to an HTML fragment.
pub fn to_html(source: &str, display: bool) -> String {
    let body = nodes_html(&parse(source));
    if display {
        format!("<span class=\"math display\">{body}</span>")
    } else {
        format!("<span class=\"math inline\">{body}</span>")
    }
}

/// Typeset to plain Unicode text for terminal display.
pub fn to_unicode(source: &str) -> String {
    nodes_unicode(&parse(source)).trim().to_string()
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    /// Open groups and command arguments around the cursor.
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn sequence(&mut self, in_group: bool) -> Vec<MathNode> {
        let mut nodes: Vec<MathNode> = Vec::new();
        while let Some(ch) = self.peek() {
            match ch {
                '}' if in_group => {
                    self.pos += 1;
                    return nodes;
                }
                '^' | '_' => {
                    self.pos += 1;
                    match self.atom() {
                        Some(script) => attach_script(&mut nodes, ch == '^', script),
                        None => nodes.push(MathNode::Symbol(ch.to_string())),
                    }
                }
                c if c.is_whitespace() => self.pos += 1,
                _ => {
                    if let Some(node) = self.atom() {
                        nodes.push(node);
                    }
                }
            }
        }
        nodes
    }

    /// One operand: a braced group, a command, or a single character.
    fn atom(&mut self) -> Option<MathNode> {
        self.skip_whitespace();
        self.peek()?;
        if self.depth >= MAX_NESTING {
            return Some(self.rest_as_text());
        }
        self.depth += 1;
        let node = match self.bump() {
            Some('{') => MathNode::Group(self.sequence(true)),
            Some('\\') => self.command(),
            Some('&') => MathNode::Space,
            Some(ch) => MathNode::Symbol(operator_symbol(ch)),
            None => MathNode::Group(Vec::new()),
        };
        self.depth -= 1;
        Some(node)
    }

    /// Consume everything left as one literal run.
    fn rest_as_text(&mut self) -> MathNode {
        let rest: String = self.chars[self.pos..].iter().collect();
        self.pos = self.chars.len();
        MathNode::Word(rest)
    }

    fn argument(&mut self) -> MathNode {
        self.atom().unwrap_or(MathNode::Group(Vec::new()))
    }

    /// Raw text of a braced argument, for `\text{...}` and environment names.
    fn raw_argument(&mut self) -> String {
        self.skip_whitespace();
        if self.peek() != Some('{') {
            return self.bump().map(String::from).unwrap_or_default();
        }
        self.pos += 1;
        let mut depth = 1usize;
        let mut out = String::new();
        while let Some(ch) = self.bump() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            out.push(ch);
        }
        out
    }

    fn command(&mut self) -> MathNode {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos == start {
            // Single-character control sequence such as `\,` or `\{`.
            return match self.bump() {
                Some(',' | ';' | ':' | ' ' | '!') => MathNode::Space,
                Some('\\') => MathNode::Word("; ".to_string()),
                Some(ch) => MathNode::Symbol(ch.to_string()),
                None => MathNode::Symbol("\\".to_string()),
            };
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        match name.as_str() {
            "frac" | "dfrac" | "tfrac" => {
                let num = self.argument();
                let den = self.argument();
                MathNode::Frac(Box::new(num), Box::new(den))
            }
            "sqrt" => {
                self.skip_whitespace();
                if self.peek() == Some('[') {
                    while let Some(ch) = self.bump() {
                        if ch == ']' {
                            break;
                        }
                    }
                }
                MathNode::Sqrt(Box::new(self.argument()))
            }
            "mathbf" | "boldsymbol" | "bm" => MathNode::Bold(Box::new(self.argument())),
            "mathbb" => {
                let arg = self.raw_argument();
                MathNode::Symbol(blackboard(&arg))
            }
            "mathrm" | "mathit" | "mathcal" | "mathsf" => self.argument(),
            "text" | "textrm" | "textbf" | "operatorname" | "mbox" => {
                MathNode::Word(self.raw_argument())
            }
            "hat" | "widehat" => MathNode::Accent(Box::new(self.argument()), '\u{0302}'),
            "bar" | "overline" => MathNode::Accent(Box::new(self.argument()), '\u{0304}'),
            "tilde" | "widetilde" => MathNode::Accent(Box::new(self.argument()), '\u{0303}'),
            "vec" => MathNode::Accent(Box::new(self.argument()), '\u{20D7}'),
            "dot" => MathNode::Accent(Box::new(self.argument()), '\u{0307}'),
            "left" | "right" | "big" | "Big" | "bigg" | "Bigg" => {
                self.skip_whitespace();
                match self.bump() {
                    Some('.') | None => MathNode::Group(Vec::new()),
                    Some('\\') if self.depth < MAX_NESTING => {
                        self.depth += 1;
                        let node = self.command();
                        self.depth -= 1;
                        node
                    }
                    Some('\\') => {
                        self.pos -= 1;
                        self.rest_as_text()
                    }
                    Some(ch) => MathNode::Symbol(ch.to_string()),
                }
            }
            "begin" => MathNode::Symbol(environment_delimiter(&self.raw_argument(), true)),
            "end" => MathNode::Symbol(environment_delimiter(&self.raw_argument(), false)),
            "quad" | "qquad" => MathNode::Space,
            "log" | "ln" | "exp" | "sin" | "cos" | "tan" | "max" | "min" | "arg" | "det"
            | "lim" | "argmax" | "argmin" | "tr" | "rank" => MathNode::Word(name),
            other => named_symbol(other).map_or_else(
                || MathNode::Word(format!("\\{other}")),
                |s| MathNode::Symbol(s.to_string()),
            ),
        }
    }
}

fn attach_script(nodes: &mut Vec<MathNode>, is_sup: bool, script: MathNode) {
    let base = nodes.pop().unwrap_or(MathNode::Group(Vec::new()));
    let (base, mut sup, mut sub) = match base {
        MathNode::Script { base, sup, sub } => (base, sup, sub),
        other => (Box::new(other), None, None),
    };
    let slot = if is_sup { &mut sup } else { &mut sub };
    match slot {
        // `x^a^b`: TeX rejects it, keep both in one flat group.
        Some(existing) => match existing.as_mut() {
            MathNode::Group(items) => items.push(script),
            other => {
                let prev = std::mem::replace(other, MathNode::Group(Vec::new()));
                *other = MathNode::Group(vec![prev, script]);
            }
        },
        None => *slot = Some(Box::new(script)),
    }
    nodes.push(MathNode::Script { base, sup, sub });
}

fn operator_symbol(ch: char) -> String {
    match ch {
        '*' => "∗".to_string(),
        '-' => "−".to_string(),
        '\'' => "′".to_string(),
        _ => ch.to_string(),
    }
}

fn named_symbol(name: &str) -> Option<&'static str> {
    Some(match name {
        "alpha" => "α",
        "beta" => "β",
        "gamma" => "γ",
        "delta" => "δ",
        "epsilon" => "ϵ",
        "varepsilon" => "ε",
        "zeta" => "ζ",
        "eta" => "η",
        "theta" => "θ",
        "kappa" => "κ",
        "lambda" => "λ",
        "mu" => "μ",
        "nu" => "ν",
        "xi" => "ξ",
        "pi" => "π",
        "rho" => "ρ",
        "sigma" => "σ",
        "tau" => "τ",
        "phi" => "ϕ",
        "varphi" => "φ",
        "chi" => "χ",
        "psi" => "ψ",
        "omega" => "ω",
        "Gamma" => "Γ",
        "Delta" => "Δ",
        "Theta" => "Θ",
        "Lambda" => "Λ",
        "Sigma" => "Σ",
        "Pi" => "Π",
        "Phi" => "Φ",
        "Psi" => "Ψ",
        "Omega" => "Ω",
        "cdot" => "·",
        "times" => "×",
        "div" => "÷",
        "pm" => "±",
        "mp" => "∓",
        "leq" | "le" => "≤",
        "geq" | "ge" => "≥",
        "neq" | "ne" => "≠",
        "approx" => "≈",
        "sim" => "∼",
        "equiv" => "≡",
        "propto" => "∝",
        "sum" => "∑",
        "prod" => "∏",
        "int" => "∫",
        "infty" => "∞",
        "partial" => "∂",
        "nabla" => "∇",
        "in" => "∈",
        "notin" => "∉",
        "subset" => "⊂",
        "subseteq" => "⊆",
        "cup" => "∪",
        "cap" => "∩",
        "forall" => "∀",
        "exists" => "∃",
        "to" | "rightarrow" => "→",
        "leftarrow" => "←",
        "Rightarrow" | "implies" => "⇒",
        "iff" => "⇔",
        "cdots" => "⋯",
        "ldots" | "dots" => "…",
        "top" | "intercal" => "⊤",
        "mid" => "|",
        "lVert" | "rVert" | "Vert" => "‖",
        "langle" => "⟨",
        "rangle" => "⟩",
        "lbrace" => "{",
        "rbrace" => "}",
        "circ" => "∘",
        "odot" => "⊙",
        "otimes" => "⊗",
        "oplus" => "⊕",
        _ => return None,
    })
}

fn blackboard(arg: &str) -> String {
    match arg.trim() {
        "R" => "ℝ".to_string(),
        "N" => "ℕ".to_string(),
        "Z" => "ℤ".to_string(),
        "Q" => "ℚ".to_string(),
        "C" => "ℂ".to_string(),
        "E" => "𝔼".to_string(),
        other => other.to_string(),
    }
}

fn environment_delimiter(env: &str, open: bool) -> String {
    let (l, r) = match env.trim() {
        "bmatrix" => ("[", "]"),
        "pmatrix" => ("(", ")"),
        "vmatrix" => ("|", "|"),
        "Bmatrix" => ("{", "}"),
        "cases" => ("{", ""),
        _ => ("", ""),
    };
    (if open { l } else { r }).to_string()
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn nodes_html(nodes: &[MathNode]) -> String {
    nodes.iter().map(node_html).collect()
}

fn node_html(node: &MathNode) -> String {
    match node {
        MathNode::Symbol(s) if s.chars().count() == 1 && s.chars().all(char::is_alphabetic) => {
            format!("<i>{}</i>", escape_html(s))
        }
        MathNode::Symbol(s) => escape_html(s),
        MathNode::Word(w) => format!("<span class=\"mtext\">{}</span>", escape_html(w)),
        MathNode::Group(children) => nodes_html(children),
        MathNode::Script { base, sup, sub } => {
            let mut out = node_html(base);
            if let Some(sub) = sub {
                out.push_str(&format!("<sub>{}</sub>", node_html(sub)));
            }
            if let Some(sup) = sup {
                out.push_str(&format!("<sup>{}</sup>", node_html(sup)));
            }
            out
        }
        MathNode::Frac(num, den) => format!(
            "<span class=\"frac\"><span class=\"num\">{}</span>&frasl;<span class=\"den\">{}</span></span>",
            node_html(num),
            node_html(den)
        ),
        MathNode::Sqrt(inner) => format!(
            "√<span class=\"radicand\" style=\"text-decoration:overline\">{}</span>",
            node_html(inner)
        ),
        MathNode::Bold(inner) => format!("<b>{}</b>", node_html(inner)),
        MathNode::Accent(inner, mark) => format!("{}{mark}", node_html(inner)),
        MathNode::Space => "&#8201;".to_string(),
    }
}

fn nodes_unicode(nodes: &[MathNode]) -> String {
    let mut out = String::new();
    let mut after_word = false;
    for node in nodes {
        let piece = node_unicode(node);
        let is_word = matches!(node, MathNode::Word(_));
        // Upright words are set apart from neighbouring identifiers.
        let needs_gap = (is_word && !out.is_empty())
            || (after_word && piece.starts_with(char::is_alphanumeric));
        if needs_gap && !out.ends_with(' ') {
            out.push(' ');
        }
        out.push_str(&piece);
        after_word = is_word;
    }
    out
}

fn node_unicode(node: &MathNode) -> String {
    match node {
        MathNode::Symbol(s) | MathNode::Word(s) => s.clone(),
        MathNode::Group(children) => nodes_unicode(children),
        MathNode::Script { base, sup, sub } => {
            let mut out = node_unicode(base);
            if let Some(sub) = sub {
                out.push_str(&scripted(&node_unicode(sub), subscript_char, '_'));
            }
            if let Some(sup) = sup {
                out.push_str(&scripted(&node_unicode(sup), superscript_char, '^'));
            }
            out
        }
        MathNode::Frac(num, den) => {
            format!("{}/{}", parenthesize(&node_unicode(num)), parenthesize(&node_unicode(den)))
        }
        MathNode::Sqrt(inner) => format!("√{}", parenthesize(&node_unicode(inner))),
        MathNode::Bold(inner) => node_unicode(inner),
        MathNode::Accent(inner, mark) => format!("{}{mark}", node_unicode(inner)),
        MathNode::Space => " ".to_string(),
    }
}

fn parenthesize(s: &str) -> String {
    if s.chars().count() <= 1 || s.chars().all(|c| c.is_alphanumeric() || c == '.') {
        s.to_string()
    } else {
        format!("({s})")
    }
}

/// Map every char through `map`, or fall back to `x^(..)` notation.
fn scripted(text: &str, map: fn(char) -> Option<char>, marker: char) -> String {
    if let Some(mapped) = text.chars().map(map).collect::<Option<String>>() {
        if !mapped.is_empty() {
            return mapped;
        }
    }
    if text.chars().count() == 1 {
        format!("{marker}{text}")
    } else {
        format!("{marker}({text})")
    }
}

const fn superscript_char(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4' => '⁴',
        '5' => '⁵',
        '6' => '⁶',
        '7' => '⁷',
        '8' => '⁸',
        '9' => '⁹',
        '+' => '⁺',
        '-' | '−' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'a' => 'ᵃ',
        'b' => 'ᵇ',
        'c' => 'ᶜ',
        'd' => 'ᵈ',
        'e' => 'ᵉ',
        'f' => 'ᶠ',
        'g' => 'ᵍ',
        'h' => 'ʰ',
        'i' => 'ⁱ',
        'j' => 'ʲ',
        'k' => 'ᵏ',
        'l' => 'ˡ',
        'm' => 'ᵐ',
        'n' => 'ⁿ',
        'o' => 'ᵒ',
        'p' => 'ᵖ',
        'r' => 'ʳ',
        's' => 'ˢ',
        't' => 'ᵗ',
        'u' => 'ᵘ',
        'v' => 'ᵛ',
        'w' => 'ʷ',
        'x' => 'ˣ',
        'y' => 'ʸ',
        'z' => 'ᶻ',
        'T' | '⊤' => 'ᵀ',
        '′' => '′',
        _ => return None,
    })
}

const fn subscript_char(ch: char) -> Option<char> {
    Some(match ch {
        '0' => '₀',
        '1' => '₁',
        '2' => '₂',
        '3' => '₃',
        '4' => '₄',
        '5' => '₅',
        '6' => '₆',
        '7' => '₇',
        '8' => '₈',
        '9' => '₉',
        '+' => '₊',
        '-' | '−' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'h' => 'ₕ',
        'i' => 'ᵢ',
        'j' => 'ⱼ',
        'k' => 'ₖ',
        'l' => 'ₗ',
        'm' => 'ₘ',
        'n' => 'ₙ',
        'o' => 'ₒ',
        'p' => 'ₚ',
        'r' => 'ᵣ',
        's' => 'ₛ',
        't' => 'ₜ',
        'u' => 'ᵤ',
        'v' => 'ᵥ',
        'x' => 'ₓ',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superscript_html() {
        assert_eq!(
            to_html("x^2", false),
            "<span class=\"math inline\"><i>x</i><sup>2</sup></span>"
        );
    }

    #[test]
    fn test_superscript_unicode() {
        assert_eq!(to_unicode("x^2"), "x²");
        assert_eq!(to_unicode("A^T"), "Aᵀ");
    }

    #[test]
    fn test_subscript_and_superscript_together() {
        assert_eq!(to_unicode("x_i^2"), "xᵢ²");
        assert_eq!(to_unicode("x^2_i"), "xᵢ²");
    }

    #[test]
    fn test_unmappable_script_falls_back() {
        assert_eq!(to_unicode("e^{\\alpha x}"), "e^(αx)");
        assert_eq!(to_unicode("w_q"), "w_q");
    }

    #[test]
    fn test_greek_and_operators() {
        assert_eq!(to_unicode("\\alpha \\cdot \\beta"), "α·β");
        assert_eq!(to_unicode("a \\leq b"), "a≤b");
    }

    #[test]
    fn test_frac_unicode_and_html() {
        assert_eq!(to_unicode("\\frac{1}{n}"), "1/n");
        assert_eq!(to_unicode("\\frac{a+b}{2}"), "(a+b)/2");
        let html = to_html("\\frac{1}{n}", false);
        assert!(html.contains("class=\"num\">1</span>"));
        assert!(html.contains("class=\"den\"><i>n</i></span>"));
    }

    #[test]
    fn test_sum_with_limits() {
        assert_eq!(to_unicode("\\sum_{i=1}^{n} x_i"), "∑ᵢ₌₁ⁿxᵢ");
    }

    #[test]
    fn test_text_and_functions_are_upright_words() {
        assert_eq!(to_unicode("\\text{mean}(x)"), "mean(x)");
        assert_eq!(to_unicode("2\\log x"), "2 log x");
        assert!(to_html("\\text{a<b}", false).contains("a&lt;b"));
    }

    #[test]
    fn test_matrix_environment() {
        let out = to_unicode("\\begin{bmatrix} 1 & 2 \\\\ 3 & 4 \\end{bmatrix}");
        assert!(out.starts_with('['));
        assert!(out.ends_with(']'));
        assert!(out.contains('1') && out.contains('4'));
    }

    #[test]
    fn test_unknown_command_kept_literal() {
        assert_eq!(to_unicode("\\foo x"), "\\foo x");
    }

    #[test]
    fn test_malformed_input_does_not_panic() {
        for src in ["{", "}", "^", "x^", "\\", "\\frac{", "{{}", "_^_^", "\\sqrt[", "\\left"] {
            let _ = to_html(src, true);
            let _ = to_unicode(src);
        }
    }

    #[test]
    fn test_deep_brace_nesting_degrades_to_text() {
        let src = "{".repeat(100_000);
        let unicode = to_unicode(&src);
        assert!(unicode.ends_with("{{{{"), "tail kept literally");
        assert!(to_html(&src, false).starts_with("<span class=\"math inline\">"));
    }

    #[test]
    fn test_repeated_commands_stay_bounded() {
        for src in [
            "\\left".repeat(50_000),
            "\\frac".repeat(50_000),
            "\\hat".repeat(50_000),
            "\\sqrt{".repeat(50_000),
        ] {
            let _ = to_html(&src, true);
            let _ = to_unicode(&src);
        }
    }

    #[test]
    fn test_repeated_scripts_stay_flat() {
        let src = format!("x{}", "^a".repeat(100_000));
        let nodes = parse(&src);
        assert_eq!(nodes.len(), 1);
        let MathNode::Script { sup: Some(sup), .. } = &nodes[0] else {
            panic!("expected a script, got {:?}", nodes[0]);
        };
        let MathNode::Group(items) = sup.as_ref() else {
            panic!("expected grouped superscripts");
        };
        assert_eq!(items.len(), 100_000);
        assert!(to_unicode("x^a^b").starts_with('x'));
    }

    #[test]
    fn test_nesting_below_limit_is_typeset() {
        let src = format!("{}x^2{}", "{".repeat(100), "}".repeat(100));
        assert_eq!(to_unicode(&src), "x²");
    }

    #[test]
    fn test_mathbb_and_accents() {
        assert_eq!(to_unicode("x \\in \\mathbb{R}"), "x∈ℝ");
        assert_eq!(to_unicode("\\hat{y}"), "y\u{0302}");
    }
}
