// HTML re-flow and minify. Tags and text are split by regex; there is no DOM.
use std::sync::OnceLock;

use regex::Regex;

use super::LineWriter;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "dfn", "em", "i", "kbd", "label",
    "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup", "time", "u", "var",
];

fn regex_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // A lone `<` that never closes is kept as text rather than dropped.
    RE.get_or_init(|| {
        Regex::new(r"<!--[\s\S]*?-->|<[^<>]*>|[^<]+|<").expect("valid html token pattern")
    })
}

fn regex_tag_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^</?([A-Za-z][A-Za-z0-9:-]*)").expect("valid tag name pattern"))
}

fn regex_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

fn regex_comment() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<!--[\s\S]*?-->").expect("valid comment pattern"))
}

fn regex_between_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r">\s+<").expect("valid inter-tag pattern"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// Comments, doctypes and processing instructions.
    Markup(&'a str),
    Open { raw: &'a str, name: &'a str },
    Close { raw: &'a str, name: &'a str },
    Text(&'a str),
}

fn classify(raw: &str) -> Token<'_> {
    if raw.starts_with("<!") || raw.starts_with("<?") {
        return Token::Markup(raw);
    }
    match regex_tag_name().captures(raw).and_then(|caps| caps.get(1)) {
        Some(name) if raw.starts_with("</") => Token::Close {
            raw,
            name: name.as_str(),
        },
        Some(name) => Token::Open {
            raw,
            name: name.as_str(),
        },
        None => Token::Text(raw),
    }
}

fn in_set(set: &[&str], name: &str) -> bool {
    set.iter().any(|entry| entry.eq_ignore_ascii_case(name))
}

pub(crate) fn format(input: &str, indent_width: usize) -> String {
    let collapsed = regex_whitespace().replace_all(input.trim(), " ");
    let mut out = LineWriter::new(indent_width);

    for found in regex_token().find_iter(&collapsed) {
        match classify(found.as_str()) {
            Token::Markup(raw) => {
                out.flush();
                out.push_raw(raw);
                out.flush();
            }
            Token::Open { raw, name } if in_set(VOID_ELEMENTS, name) || raw.ends_with("/>") => {
                out.flush();
                out.push_raw(raw);
                out.flush();
            }
            Token::Open { raw, name } | Token::Close { raw, name }
                if in_set(INLINE_ELEMENTS, name) =>
            {
                out.push_raw(raw);
            }
            Token::Open { raw, .. } => {
                out.flush();
                out.push_raw(raw);
                out.flush();
                out.indent();
            }
            Token::Close { raw, .. } => {
                out.flush();
                out.dedent();
                out.push_raw(raw);
                out.flush();
            }
            // Whitespace between tags only matters inside a run of inline content.
            Token::Text(text) if text.trim().is_empty() => {
                if !out.current().is_empty() {
                    out.push_raw(" ");
                }
            }
            Token::Text(text) => out.push_raw(text),
        }
    }
    out.finish()
}

pub(crate) fn minify(input: &str) -> String {
    let without_comments = regex_comment().replace_all(input, "");
    let tight = regex_between_tags().replace_all(&without_comments, "><");
    regex_whitespace()
        .replace_all(&tight, " ")
        .trim()
        .to_string()
}
