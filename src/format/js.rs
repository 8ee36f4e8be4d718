// JavaScript re-flow and minify. Strings, template literals and comments are
// copied verbatim; regex literals are not recognised.
use super::{LineWriter, collect, needs_separator, scan_line_end, scan_quoted, starts_with_at};

// Words that stay on the line of the `}` before them.
const CLOSING_CONTINUATIONS: &[&str] = &["else", "catch", "finally", "while"];

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}

fn scan_block_comment(chars: &[char], start: usize) -> usize {
    let mut idx = start + 2;
    while idx < chars.len() {
        if starts_with_at(chars, idx, "*/") {
            return idx + 2;
        }
        idx += 1;
    }
    chars.len()
}

/// True when the token at `idx` belongs on the same line as a preceding `}`.
fn continues_closing_line(chars: &[char], idx: usize) -> bool {
    if matches!(chars[idx], ';' | ',' | ')' | ']' | '.') {
        return true;
    }
    let word: String = chars[idx..]
        .iter()
        .take_while(|ch| is_word_char(**ch))
        .collect();
    CLOSING_CONTINUATIONS.contains(&word.as_str())
}

pub(crate) fn format(input: &str, indent_width: usize) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = LineWriter::new(indent_width);
    // Depth of ( and [ within the current block; separators inside them do not break lines.
    let mut nesting = 0usize;
    let mut outer_nesting: Vec<usize> = Vec::new();
    let mut after_close = false;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch.is_whitespace() {
            out.space();
            idx += 1;
            continue;
        }
        if after_close {
            after_close = false;
            if !continues_closing_line(&chars, idx) {
                out.flush();
            }
        }
        match ch {
            '"' | '\'' | '`' => {
                let end = scan_quoted(&chars, idx, ch);
                out.push_str(&collect(&chars[idx..end]));
                idx = end;
                continue;
            }
            '/' if starts_with_at(&chars, idx, "//") => {
                let end = scan_line_end(&chars, idx);
                out.push_str(collect(&chars[idx..end]).trim_end());
                out.flush();
                idx = end;
                continue;
            }
            '/' if starts_with_at(&chars, idx, "/*") => {
                let end = scan_block_comment(&chars, idx);
                out.push_str(&collect(&chars[idx..end]));
                idx = end;
                continue;
            }
            '{' => {
                outer_nesting.push(nesting);
                nesting = 0;
                out.push('{');
                out.flush();
                out.indent();
            }
            '}' => {
                nesting = outer_nesting.pop().unwrap_or(0);
                out.flush();
                out.dedent();
                out.push('}');
                after_close = true;
            }
            '(' | '[' => {
                nesting += 1;
                out.push(ch);
            }
            ')' | ']' => {
                nesting = nesting.saturating_sub(1);
                out.push(ch);
            }
            ';' | ',' => {
                out.push(ch);
                if nesting == 0 {
                    out.flush();
                }
            }
            _ => out.push(ch),
        }
        idx += 1;
    }
    out.finish()
}

pub(crate) fn minify(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    // None: no whitespace since the last token; Some(true): it spanned a newline.
    let mut gap: Option<bool> = None;
    let mut idx = 0;

    let emit = |out: &mut String, gap: &mut Option<bool>, text: &str| {
        if let (Some(newline), Some(first)) = (*gap, text.chars().next()) {
            if needs_separator(out.chars().next_back(), first, is_word_char) {
                out.push(if newline { '\n' } else { ' ' });
            }
        }
        *gap = None;
        out.push_str(text);
    };

    while idx < chars.len() {
        let ch = chars[idx];
        if ch.is_whitespace() {
            gap = Some(gap.unwrap_or(false) || ch == '\n');
            idx += 1;
            continue;
        }
        match ch {
            '"' | '\'' | '`' => {
                let end = scan_quoted(&chars, idx, ch);
                emit(&mut out, &mut gap, &collect(&chars[idx..end]));
                idx = end;
            }
            '/' if starts_with_at(&chars, idx, "//") => {
                idx = scan_line_end(&chars, idx);
                gap = Some(true);
            }
            '/' if starts_with_at(&chars, idx, "/*") => {
                idx = scan_block_comment(&chars, idx);
                gap = Some(gap.unwrap_or(false));
            }
            _ => {
                // A line break next to `++` / `--` ends the statement.
                if gap == Some(true)
                    && !out.is_empty()
                    && (starts_with_update(&chars, idx) || ends_with_update(&out))
                {
                    out.push('\n');
                    gap = None;
                }
                let mut buf = [0u8; 4];
                emit(&mut out, &mut gap, ch.encode_utf8(&mut buf));
                idx += 1;
            }
        }
    }
    out
}

fn starts_with_update(chars: &[char], idx: usize) -> bool {
    starts_with_at(chars, idx, "++") || starts_with_at(chars, idx, "--")
}

fn ends_with_update(out: &str) -> bool {
    out.ends_with("++") || out.ends_with("--")
}
