//! Indentation-based re-formatters for pasted HTML, JavaScript and GraphQL.
//!
//! None of these build a syntax tree. They re-flow the input by tracking a
//! nesting depth: a line break after every opening token, a line break before
//! every closing token, and `depth` indent units in front of each line. The
//! JavaScript and GraphQL variants scan strings and comments so their
//! contents are copied verbatim; HTML is split into tags and text by regex.
//!
//! # Examples
//!
//! ```rust
//! use devtools_core::format::{FormatLanguage, FormatOptions, format_source};
//!
//! let pretty = format_source(FormatLanguage::JavaScript, "if (a) { b(); }", &FormatOptions::default());
//! assert_eq!(pretty, "if (a) {\n  b();\n}");
//! ```
pub mod graphql;
pub mod html;
pub mod js;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_INDENT_WIDTH: usize = 2;
const MAX_INDENT_WIDTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatLanguage {
    Html,
    JavaScript,
    GraphQl,
}

impl FormatLanguage {
    /// Accepts the names used by the formatter tabs, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, FormatError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(Self::Html),
            "javascript" | "js" => Ok(Self::JavaScript),
            "graphql" | "gql" => Ok(Self::GraphQl),
            _ => Err(FormatError::UnsupportedLanguage(name.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unsupported format language: {0}")]
    UnsupportedLanguage(String),
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct FormatOptions {
    /// Spaces per nesting level, clamped to 1..=8
    pub indent_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: DEFAULT_INDENT_WIDTH,
        }
    }
}

/// Re-indents `input`. Whitespace-only input yields an empty string.
pub fn format_source(language: FormatLanguage, input: &str, options: &FormatOptions) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    let width = options.indent_width.clamp(1, MAX_INDENT_WIDTH);
    let output = match language {
        FormatLanguage::Html => html::format(input, width),
        FormatLanguage::JavaScript => js::format(input, width),
        FormatLanguage::GraphQl => graphql::format(input, width),
    };
    debug!(?language, input_len = input.len(), output_len = output.len(), "formatted source");
    output
}

/// Strips comments and insignificant whitespace.
pub fn minify_source(language: FormatLanguage, input: &str) -> String {
    if input.trim().is_empty() {
        return String::new();
    }
    let output = match language {
        FormatLanguage::Html => html::minify(input),
        FormatLanguage::JavaScript => js::minify(input),
        FormatLanguage::GraphQl => graphql::minify(input),
    };
    debug!(?language, input_len = input.len(), output_len = output.len(), "minified source");
    output
}

/// Accumulates the current line and emits finished lines at the current depth.
pub(crate) struct LineWriter {
    unit: String,
    lines: Vec<String>,
    current: String,
    depth: usize,
    pending_space: bool,
}

impl LineWriter {
    pub(crate) fn new(indent_width: usize) -> Self {
        Self {
            unit: " ".repeat(indent_width),
            lines: Vec::new(),
            current: String::new(),
            depth: 0,
            pending_space: false,
        }
    }

    /// Appends text, inserting one separating space if whitespace was seen since
    /// the last append.
    pub(crate) fn push_str(&mut self, text: &str) {
        if self.pending_space && !self.current.is_empty() {
            self.current.push(' ');
        }
        self.pending_space = false;
        self.current.push_str(text);
    }

    pub(crate) fn push(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut buf));
    }

    /// Appends text exactly as given.
    pub(crate) fn push_raw(&mut self, text: &str) {
        self.pending_space = false;
        self.current.push_str(text);
    }

    pub(crate) fn space(&mut self) {
        self.pending_space = true;
    }

    pub(crate) fn has_pending_space(&self) -> bool {
        self.pending_space
    }

    pub(crate) fn current(&self) -> &str {
        &self.current
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn flush(&mut self) {
        let line = self.current.trim();
        if !line.is_empty() {
            self.lines.push(format!("{}{}", self.unit.repeat(self.depth), line));
        }
        self.current.clear();
        self.pending_space = false;
    }

    pub(crate) fn indent(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn finish(mut self) -> String {
        self.flush();
        self.lines.join("\n")
    }
}

/// Returns the index just past a quoted literal starting at `start`.
/// Unterminated literals run to the end of the input.
pub(crate) fn scan_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut idx = start + 1;
    while idx < chars.len() {
        match chars[idx] {
            '\\' => idx += 2,
            ch if ch == quote => return idx + 1,
            _ => idx += 1,
        }
    }
    chars.len()
}

/// Returns the index of the next newline at or after `start`, or the input length.
pub(crate) fn scan_line_end(chars: &[char], start: usize) -> usize {
    chars[start..]
        .iter()
        .position(|ch| *ch == '\n')
        .map_or(chars.len(), |offset| start + offset)
}

pub(crate) fn starts_with_at(chars: &[char], idx: usize, pattern: &str) -> bool {
    let mut pos = idx;
    for expected in pattern.chars() {
        if chars.get(pos) != Some(&expected) {
            return false;
        }
        pos += 1;
    }
    true
}

pub(crate) fn collect(chars: &[char]) -> String {
    chars.iter().collect()
}

/// Whether minified output needs a separator between `prev` and `next` to keep
/// them from merging into one token.
pub(crate) fn needs_separator(prev: Option<char>, next: char, word: fn(char) -> bool) -> bool {
    match prev {
        Some(prev) => {
            (word(prev) && word(next)) || (prev == '+' && next == '+') || (prev == '-' && next == '-')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_language_names() {
        assert_eq!(FormatLanguage::parse("HTML").unwrap(), FormatLanguage::Html);
        assert_eq!(FormatLanguage::parse("js").unwrap(), FormatLanguage::JavaScript);
        assert_eq!(FormatLanguage::parse(" GraphQL ").unwrap(), FormatLanguage::GraphQl);
        assert_eq!(
            FormatLanguage::parse("css"),
            Err(FormatError::UnsupportedLanguage("css".into()))
        );
    }

    #[test]
    fn whitespace_input_is_a_no_op() {
        for language in [
            FormatLanguage::Html,
            FormatLanguage::JavaScript,
            FormatLanguage::GraphQl,
        ] {
            assert_eq!(format_source(language, "  \n\t ", &FormatOptions::default()), "");
            assert_eq!(minify_source(language, "   "), "");
        }
    }

    #[test]
    fn indent_width_is_configurable() {
        let options = FormatOptions { indent_width: 4 };
        assert_eq!(
            format_source(FormatLanguage::JavaScript, "{a;}", &options),
            "{\n    a;\n}"
        );
        let clamped = FormatOptions { indent_width: 0 };
        assert_eq!(
            format_source(FormatLanguage::JavaScript, "{a;}", &clamped),
            "{\n a;\n}"
        );
    }

    #[test]
    fn scan_quoted_skips_escapes() {
        let chars: Vec<char> = r#"'a\'b' rest"#.chars().collect();
        assert_eq!(scan_quoted(&chars, 0, '\''), 6);
    }

    #[test]
    fn line_writer_indents_and_trims() {
        let mut writer = LineWriter::new(2);
        writer.push_str("a");
        writer.space();
        writer.push_str("{");
        writer.flush();
        writer.indent();
        writer.push_raw("  b  ");
        writer.flush();
        writer.dedent();
        writer.push_str("}");
        assert_eq!(writer.finish(), "a {\n  b\n}");
    }
}
