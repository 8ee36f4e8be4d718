// GraphQL query / SDL re-flow and minify.
use super::{LineWriter, collect, needs_separator, scan_line_end, scan_quoted, starts_with_at};

const BLOCK_QUOTE: &str = "\"\"\"";

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn scan_string(chars: &[char], start: usize) -> usize {
    if !starts_with_at(chars, start, BLOCK_QUOTE) {
        return scan_quoted(chars, start, '"');
    }
    let mut idx = start + BLOCK_QUOTE.len();
    while idx < chars.len() {
        if chars[idx] == '\\' && starts_with_at(chars, idx + 1, BLOCK_QUOTE) {
            idx += 1 + BLOCK_QUOTE.len();
        } else if starts_with_at(chars, idx, BLOCK_QUOTE) {
            return idx + BLOCK_QUOTE.len();
        } else {
            idx += 1;
        }
    }
    chars.len()
}

/// Inside a selection set, whitespace between two selections starts a new line.
fn starts_new_selection(out: &LineWriter, nesting: usize, next: char) -> bool {
    if out.depth() == 0 || nesting > 0 || !out.has_pending_space() {
        return false;
    }
    if !(is_name_char(next) || next == '.' || next == '"') {
        return false;
    }
    let current = out.current().trim_end();
    // `... on Type` is a single inline fragment head.
    if current.starts_with("...") && (current.ends_with(" on") || current == "...on") {
        return false;
    }
    current
        .chars()
        .next_back()
        .is_some_and(|last| is_name_char(last) || matches!(last, ')' | ']' | '!' | '"'))
}

pub(crate) fn format(input: &str, indent_width: usize) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = LineWriter::new(indent_width);
    let mut nesting = 0usize;
    let mut idx = 0;

    while idx < chars.len() {
        let ch = chars[idx];
        if ch.is_whitespace() {
            out.space();
            idx += 1;
            continue;
        }
        if starts_new_selection(&out, nesting, ch) {
            out.flush();
        }
        match ch {
            '"' => {
                let end = scan_string(&chars, idx);
                out.push_str(&collect(&chars[idx..end]));
                idx = end;
                continue;
            }
            '#' => {
                let end = scan_line_end(&chars, idx);
                out.push_str(collect(&chars[idx..end]).trim_end());
                out.flush();
                idx = end;
                continue;
            }
            // Input objects inside arguments stay on the argument line.
            '{' if nesting > 0 => {
                nesting += 1;
                out.push('{');
            }
            '}' if nesting > 0 => {
                nesting -= 1;
                out.push('}');
            }
            '{' => {
                out.push('{');
                out.flush();
                out.indent();
            }
            '}' => {
                out.flush();
                out.dedent();
                out.push('}');
                out.flush();
            }
            '(' | '[' => {
                nesting += 1;
                out.push(ch);
            }
            ')' | ']' => {
                nesting = nesting.saturating_sub(1);
                out.push(ch);
            }
            ',' => {
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
    let mut gap = false;
    let mut idx = 0;

    let emit = |out: &mut String, gap: &mut bool, text: &str| {
        if let Some(first) = text.chars().next() {
            if *gap && needs_separator(out.chars().next_back(), first, is_name_char) {
                out.push(' ');
            }
        }
        *gap = false;
        out.push_str(text);
    };

    while idx < chars.len() {
        let ch = chars[idx];
        match ch {
            _ if ch.is_whitespace() => {
                gap = true;
                idx += 1;
            }
            '#' => {
                idx = scan_line_end(&chars, idx);
                gap = true;
            }
            '"' => {
                let end = scan_string(&chars, idx);
                emit(&mut out, &mut gap, &collect(&chars[idx..end]));
                idx = end;
            }
            _ => {
                let mut buf = [0u8; 4];
                emit(&mut out, &mut gap, ch.encode_utf8(&mut buf));
                idx += 1;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_nested_selection_sets() {
        let input = "query GetUser($id: ID!) { user(id: $id) { id name posts(first: 10) { title } } }";
        let expected = "\
query GetUser($id: ID!) {
  user(id: $id) {
    id
    name
    posts(first: 10) {
      title
    }
  }
}";
        assert_eq!(format(input, 2), expected);
    }

    #[test]
    fn keeps_inline_fragment_heads_together() {
        let input = "{ node { ... on User { id } ...UserFields } }";
        let expected = "\
{
  node {
    ... on User {
      id
    }
    ...UserFields
  }
}";
        assert_eq!(format(input, 2), expected);
    }

    #[test]
    fn formats_schema_definitions() {
        let input = "type User { id: ID! \"Display name\" name: String tags: [String!]! }";
        let expected = "\
type User {
  id: ID!
  \"Display name\"
  name: String
  tags: [String!]!
}";
        assert_eq!(format(input, 2), expected);
    }

    #[test]
    fn aliases_and_directives_stay_on_the_field_line() {
        let input = "{ me: viewer @include(if: $full) { login } }";
        assert_eq!(
            format(input, 2),
            "{\n  me: viewer @include(if: $full) {\n    login\n  }\n}"
        );
    }

    #[test]
    fn input_object_arguments_stay_inline() {
        let input = "{ users(where: {id: 1, name: \"a\"}, order: [{by: id}]) { id } }";
        let expected = "\
{
  users(where: {id: 1, name: \"a\"}, order: [{by: id}]) {
    id
  }
}";
        assert_eq!(format(input, 2), expected);
    }

    #[test]
    fn comments_end_their_line() {
        let input = "# fetch\n{ a # first\n b }";
        assert_eq!(format(input, 2), "# fetch\n{\n  a # first\n  b\n}");
    }

    #[test]
    fn block_strings_are_copied_verbatim() {
        let input = "type A { \"\"\"multi { line }\"\"\" f: Int }";
        assert_eq!(
            format(input, 2),
            "type A {\n  \"\"\"multi { line }\"\"\"\n  f: Int\n}"
        );
    }

    #[test]
    fn minify_keeps_name_separators_only() {
        let input = "query Q {\n  # comment\n  user(id: 1) {\n    id\n    name\n  }\n}";
        assert_eq!(minify(input), "query Q{user(id:1){id name}}");
    }

    #[test]
    fn minify_preserves_strings() {
        assert_eq!(minify("{ a(s: \"x  y\") }"), "{a(s:\"x  y\")}");
    }
}
