//! Post-processing: deterministic cleanup of raw provider answers.
//!
//! Runs before date extraction. The rules fix transport and formatting
//! quirks of vision models without touching the text itself:
//!
//! 1. Strip an outer ` ```markdown ` fence (models sometimes disobey the
//!    prompt and wrap the whole answer)
//! 2. Normalise line endings (CRLF / CR → LF)
//! 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 4. Trim trailing whitespace per line
//! 5. Collapse 4+ consecutive newlines down to 3
//! 6. Remove spurious separator rows in table bodies
//! 7. Replace hallucinated image links with their alt text
//!
//! Order matters: fences go first so the date marker ends up on the first
//! line, and line endings are normalised before any line-based rule.

use crate::pipeline::fragment::{is_pipe_row, is_separator_row};
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to a raw provider answer.
pub fn normalise_response(input: &str) -> String {
    let s = strip_markdown_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = remove_mid_table_separators(&s);
    remove_hallucinated_images(&s)
}

// ── Rule 1: Strip outer markdown fences ──────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:markdown|md)?\r?\n(.*)\r?\n```\s*$").unwrap());

fn strip_markdown_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{4,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n\n").to_string()
}

// ── Rule 6: Remove spurious mid-table separator rows ────────────────────────
//
// GFM only allows a separator as the second line of a table. Extra
// `| --- |` rows in the body would split one table into two fragments.

fn remove_mid_table_separators(input: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    let mut table_line_count = 0usize;

    for line in input.lines() {
        if is_pipe_row(line) {
            table_line_count += 1;
            if is_separator_row(line) && table_line_count != 2 {
                continue;
            }
        } else {
            table_line_count = 0;
        }
        result.push(line);
    }

    result.join("\n")
}

// ── Rule 7: Remove hallucinated image links ───────────────────────────────────
//
// Scans carry no image URLs, so `![alt](url)` is almost always invented.
// Keep it only for absolute HTTP(S) links on a non-placeholder host;
// otherwise keep the alt text in italics.

static RE_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

fn is_placeholder_url(url: &str) -> bool {
    let u = url.trim();
    if !u.starts_with("http://") && !u.starts_with("https://") {
        return true;
    }
    [
        "example.com",
        "placeholder.com",
        "dummyimage.com",
        "lorempixel.com",
        "picsum.photos",
        "placehold.it",
    ]
    .iter()
    .any(|d| u.contains(d))
}

fn remove_hallucinated_images(input: &str) -> String {
    RE_IMAGE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let alt = caps[1].trim();
            if !is_placeholder_url(&caps[2]) {
                caps[0].to_string()
            } else if alt.is_empty() {
                String::new()
            } else {
                format!("*{}*", alt)
            }
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```markdown\nNGAY_THANG: 2023-01-01\n# Hello\n```";
        assert_eq!(strip_markdown_fences(input), "NGAY_THANG: 2023-01-01\n# Hello");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n# Hello\nWorld\n```";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_no_fences_passthrough() {
        let input = "# Hello\nWorld";
        assert_eq!(strip_markdown_fences(input), "# Hello\nWorld");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}foo\u{00AD}bar";
        assert_eq!(remove_invisible_chars(input), "helloworldfoobar");
    }

    #[test]
    fn test_trim_trailing_whitespace() {
        assert_eq!(trim_trailing_whitespace("  hello   \nworld  "), "  hello\nworld");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_remove_mid_table_separator() {
        let input = "| A | B |\n| --- | --- |\n| 1 | 2 |\n| --- | --- |\n| 3 | 4 |";
        let result = remove_mid_table_separators(input);
        let sep_count = result.lines().filter(|l| is_separator_row(l)).count();
        assert_eq!(sep_count, 1);
        assert!(result.contains("| 3 | 4 |"));
    }

    #[test]
    fn test_normal_table_unchanged() {
        let input = "| H1 | H2 |\n| --- | --- |\n| a | b |\n| c | d |";
        assert_eq!(remove_mid_table_separators(input), input);
    }

    #[test]
    fn test_single_tabular_row_unchanged() {
        let input = "| a | b | c | d | e | f |\n---TABLE_DETECTED---";
        assert_eq!(normalise_response(input), input);
    }

    #[test]
    fn test_hallucinated_images() {
        assert_eq!(remove_hallucinated_images("![Con dấu](stamp.png)"), "*Con dấu*");
        assert_eq!(remove_hallucinated_images("![](image-url)"), "");
        let real = "![Figure](https://arxiv.org/figures/fig1.png)";
        assert_eq!(remove_hallucinated_images(real), real);
    }

    #[test]
    fn test_full_pipeline() {
        let input = "```markdown\r\nNGAY_THANG: 2024-02-01\r\n# Title   \r\n\r\n\r\n\r\n\r\nText\u{200B}\r\n```";
        assert_eq!(
            normalise_response(input),
            "NGAY_THANG: 2024-02-01\n# Title\n\n\nText"
        );
    }
}
