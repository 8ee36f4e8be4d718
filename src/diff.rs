//! Text diff built on a longest-common-subsequence table.
//! Produces ordered added/removed/unchanged parts for the side-by-side view and
//! a git-style unified patch for download.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use similar::TextDiff;
use thiserror::Error;
use tracing::debug;

/// Upper bound on DP cells so a pasted novel cannot exhaust wasm memory.
pub const DEFAULT_MAX_CELLS: usize = 4_000_000;
/// Context lines around each hunk in unified output.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

static WORD_TOKEN: OnceLock<Regex> = OnceLock::new();

fn word_token_regex() -> &'static Regex {
    WORD_TOKEN.get_or_init(|| Regex::new(r"\s+|\S+").expect("valid word token pattern"))
}

/// Granularity of the comparison
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// Every character is a token
    Character,
    /// Words and the whitespace between them are tokens
    #[default]
    Word,
    /// Whole lines, terminator included
    Line,
}

/// Classification of a diff part
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present only in the new text
    Added,
    /// Present only in the old text
    Removed,
    /// Present in both texts
    Unchanged,
}

/// One contiguous chunk of the diff
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DiffPart {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: DiffKind,
}

/// Statistics about the diff
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DiffStats {
    /// Number of added parts
    pub additions: usize,
    /// Number of removed parts
    pub deletions: usize,
    /// Number of unchanged parts
    pub unchanged: usize,
    /// Shared tokens as a percentage of all tokens, 0-100
    pub similarity: f64,
}

/// Result of a text diff operation
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DiffResult {
    pub mode: DiffMode,
    pub parts: Vec<DiffPart>,
    pub stats: DiffStats,
}

/// Configuration for diff generation
#[derive(Deserialize, Debug, Clone)]
#[serde(default, rename_all = "camelCase")]
pub struct DiffOptions {
    pub mode: DiffMode,
    /// Compare tokens without regard to case
    pub ignore_case: bool,
    /// Refuse inputs whose DP table would exceed this many cells
    pub max_cells: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            mode: DiffMode::Word,
            ignore_case: false,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    #[error("inputs too large to compare ({old} x {new} tokens)")]
    TooLarge { old: usize, new: usize },
}

fn tokenize(text: &str, mode: DiffMode) -> Vec<&str> {
    match mode {
        DiffMode::Character => text
            .char_indices()
            .map(|(idx, ch)| &text[idx..idx + ch.len_utf8()])
            .collect(),
        DiffMode::Word => word_token_regex()
            .find_iter(text)
            .map(|m| m.as_str())
            .collect(),
        DiffMode::Line => text.split_inclusive('\n').collect(),
    }
}

fn tokens_match(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}

/// Merges runs of same-kind tokens, given in document order, into parts.
fn coalesce(tokens: &[(DiffKind, &str)]) -> Vec<DiffPart> {
    let mut parts: Vec<DiffPart> = Vec::new();
    for &(kind, value) in tokens {
        match parts.last_mut() {
            Some(last) if last.kind == kind => last.value.push_str(value),
            _ => parts.push(DiffPart {
                value: value.to_string(),
                kind,
            }),
        }
    }
    parts
}

/// Compare two texts and return the ordered diff parts.
///
/// # Arguments
/// * `old_text` - The original text
/// * `new_text` - The modified text
/// * `options` - Granularity, case handling and size limit
pub fn diff_texts(
    old_text: &str,
    new_text: &str,
    options: &DiffOptions,
) -> Result<DiffResult, DiffError> {
    let old_tokens = tokenize(old_text, options.mode);
    let new_tokens = tokenize(new_text, options.mode);
    let (m, n) = (old_tokens.len(), new_tokens.len());

    let cells = (m + 1).saturating_mul(n + 1);
    if cells > options.max_cells {
        debug!(m, n, cells, "diff rejected, table too large");
        return Err(DiffError::TooLarge { old: m, new: n });
    }

    let width = n + 1;
    let mut dp = vec![0usize; cells];
    for i in 1..=m {
        for j in 1..=n {
            dp[i * width + j] =
                if tokens_match(old_tokens[i - 1], new_tokens[j - 1], options.ignore_case) {
                    dp[(i - 1) * width + j - 1] + 1
                } else {
                    dp[(i - 1) * width + j].max(dp[i * width + j - 1])
                };
        }
    }
    let common = dp[m * width + n];

    let mut tokens = Vec::with_capacity(m + n);
    let (mut i, mut j) = (m, n);
    while i > 0 || j > 0 {
        if i > 0
            && j > 0
            && tokens_match(old_tokens[i - 1], new_tokens[j - 1], options.ignore_case)
        {
            tokens.push((DiffKind::Unchanged, new_tokens[j - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || dp[i * width + j - 1] >= dp[(i - 1) * width + j]) {
            tokens.push((DiffKind::Added, new_tokens[j - 1]));
            j -= 1;
        } else {
            tokens.push((DiffKind::Removed, old_tokens[i - 1]));
            i -= 1;
        }
    }
    tokens.reverse();
    let parts = coalesce(&tokens);

    let count = |kind: DiffKind| parts.iter().filter(|part| part.kind == kind).count();
    let similarity = if m + n == 0 {
        100.0
    } else {
        ((2 * common) as f64 / (m + n) as f64 * 10_000.0).round() / 100.0
    };
    let stats = DiffStats {
        additions: count(DiffKind::Added),
        deletions: count(DiffKind::Removed),
        unchanged: count(DiffKind::Unchanged),
        similarity,
    };
    debug!(mode = ?options.mode, m, n, common, parts = parts.len(), "computed text diff");

    Ok(DiffResult {
        mode: options.mode,
        parts,
        stats,
    })
}

/// Generate unified diff format string (similar to git diff)
///
/// # Arguments
/// * `old_text` - The original text
/// * `new_text` - The modified text
/// * `old_name` - Name/label for old text (e.g., "a/file.txt")
/// * `new_name` - Name/label for new text (e.g., "b/file.txt")
/// * `context_lines` - Unchanged lines kept around each hunk
///
/// # Returns
/// The patch text, empty when both texts are equal
pub fn unified_patch(
    old_text: &str,
    new_text: &str,
    old_name: &str,
    new_name: &str,
    context_lines: usize,
) -> String {
    if old_text == new_text {
        return String::new();
    }
    TextDiff::from_lines(old_text, new_text)
        .unified_diff()
        .context_radius(context_lines)
        .header(old_name, new_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(mode: DiffMode) -> DiffOptions {
        DiffOptions {
            mode,
            ..DiffOptions::default()
        }
    }

    fn rebuild(parts: &[DiffPart], skip: DiffKind) -> String {
        parts
            .iter()
            .filter(|part| part.kind != skip)
            .map(|part| part.value.as_str())
            .collect()
    }

    #[test]
    fn test_word_addition() {
        let result = diff_texts("Hello", "Hello World", &options(DiffMode::Word)).unwrap();
        assert_eq!(
            result.parts,
            vec![
                DiffPart {
                    value: "Hello".into(),
                    kind: DiffKind::Unchanged
                },
                DiffPart {
                    value: " World".into(),
                    kind: DiffKind::Added
                },
            ]
        );
        assert_eq!(result.stats.additions, 1);
        assert_eq!(result.stats.deletions, 0);
    }

    #[test]
    fn test_identical_texts() {
        let text = "line 1\nline 2\nline 3";
        for mode in [DiffMode::Character, DiffMode::Word, DiffMode::Line] {
            let result = diff_texts(text, text, &options(mode)).unwrap();
            assert_eq!(result.stats.additions, 0);
            assert_eq!(result.stats.deletions, 0);
            assert_eq!(result.parts.len(), 1);
            assert_eq!(result.stats.similarity, 100.0);
        }
    }

    #[test]
    fn test_character_replacement() {
        let result = diff_texts("cat", "cut", &options(DiffMode::Character)).unwrap();
        let kinds: Vec<DiffKind> = result.parts.iter().map(|part| part.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiffKind::Unchanged,
                DiffKind::Removed,
                DiffKind::Added,
                DiffKind::Unchanged
            ]
        );
        assert_eq!(rebuild(&result.parts, DiffKind::Added), "cat");
        assert_eq!(rebuild(&result.parts, DiffKind::Removed), "cut");
    }

    #[test]
    fn test_line_deletion() {
        let old = "line 1\nline 2\nline 3\n";
        let new = "line 1\nline 3\n";
        let result = diff_texts(old, new, &options(DiffMode::Line)).unwrap();
        assert_eq!(result.stats.deletions, 1);
        let removed = result
            .parts
            .iter()
            .find(|part| part.kind == DiffKind::Removed)
            .unwrap();
        assert_eq!(removed.value, "line 2\n");
    }

    #[test]
    fn test_ignore_case_keeps_new_text() {
        let opts = DiffOptions {
            ignore_case: true,
            ..options(DiffMode::Word)
        };
        let result = diff_texts("Hello world", "hello World", &opts).unwrap();
        assert_eq!(result.stats.additions, 0);
        assert_eq!(result.parts[0].value, "hello World");
    }

    #[test]
    fn test_empty_inputs() {
        let result = diff_texts("", "", &DiffOptions::default()).unwrap();
        assert!(result.parts.is_empty());
        assert_eq!(result.stats.similarity, 100.0);
    }

    #[test]
    fn test_size_limit() {
        let opts = DiffOptions {
            max_cells: 10,
            ..options(DiffMode::Character)
        };
        let err = diff_texts("abcdef", "abcdeg", &opts).unwrap_err();
        assert_eq!(err, DiffError::TooLarge { old: 6, new: 6 });
    }

    #[test]
    fn test_long_one_sided_run_is_one_part() {
        let new = "x".repeat(200_000);
        let result = diff_texts("", &new, &options(DiffMode::Character)).unwrap();
        assert_eq!(result.parts.len(), 1);
        assert_eq!(result.parts[0].kind, DiffKind::Added);
        assert_eq!(result.parts[0].value.len(), 200_000);
        assert_eq!(result.stats.additions, 1);
    }

    #[test]
    fn test_coalesce_merges_in_document_order() {
        let parts = coalesce(&[
            (DiffKind::Unchanged, "a"),
            (DiffKind::Unchanged, "b"),
            (DiffKind::Added, "c"),
            (DiffKind::Added, "d"),
            (DiffKind::Unchanged, "e"),
        ]);
        let rendered: Vec<(DiffKind, &str)> =
            parts.iter().map(|part| (part.kind, part.value.as_str())).collect();
        assert_eq!(
            rendered,
            vec![
                (DiffKind::Unchanged, "ab"),
                (DiffKind::Added, "cd"),
                (DiffKind::Unchanged, "e")
            ]
        );
    }

    #[test]
    fn test_part_serializes_type_tag() {
        let part = DiffPart {
            value: "x".into(),
            kind: DiffKind::Removed,
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["type"], "removed");
    }

    #[test]
    fn test_unified_diff_format() {
        let old = "line 1\nline 2\nline 3\n";
        let new = "line 1\nline 2\nline 4\n";
        let diff = unified_patch(old, new, "a/file.txt", "b/file.txt", DEFAULT_CONTEXT_LINES);

        assert!(diff.contains("--- a/file.txt"));
        assert!(diff.contains("+++ b/file.txt"));
        assert!(diff.contains("@@"));
        assert!(diff.contains("-line 3"));
        assert!(diff.contains("+line 4"));
    }

    #[test]
    fn test_unified_diff_empty_for_equal_texts() {
        assert!(unified_patch("same", "same", "a", "b", 3).is_empty());
    }
}
