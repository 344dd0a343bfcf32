//! Response cleaning
//!
//! Provider output and synthesis output both go through [`ResponseCleaner`]
//! before anyone sees them. Reasoning models leak `<think>` blocks, and
//! synthesis models like to talk about "the responses" they were given; the
//! cleaner removes both along with stray markup and boilerplate prefixes.
//!
//! Fenced code blocks are left alone apart from reasoning-block removal.

use regex::Regex;
use std::sync::LazyLock;

static REASONING_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<think\b[^>]*>.*?</think\s*>|<thinking\b[^>]*>.*?</thinking\s*>|<reasoning\b[^>]*>.*?</reasoning\s*>",
    )
    .expect("reasoning block regex")
});

static META_COMMENTARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:",
        r"based on the\b.*?\bresponses?\b",
        r"|after analyzing\b.*?\bresponses?\b",
        r"|combining\b.*?\binformation\b",
        r"|synthesizing\b.*?\bresponses?\b",
        r"|according to (?:response|ai|model)\s*\d+",
        r"|\bresponse \d+ (?:suggests|states|mentions)",
        r"|\b(?:ai|model) [a-z] (?:suggests|states|mentions)",
        r")[:,.]?\s*",
    ))
    .expect("meta commentary regex")
});

static MARKUP_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>").expect("markup tag regex")
});

static LEADING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:",
        r"here(?:'s|’s| is)\s+(?:(?:a|the|my)\s+)?(?:(?:comprehensive|final|complete)\s+)?(?:summary|answer|response|synthesis)",
        r"|(?:(?:comprehensive|final|complete)\s+)?(?:summary|answer)",
        r")\s*:\s*",
    ))
    .expect("leading prefix regex")
});

/// Text post-processor shared by provider and synthesis output
pub struct ResponseCleaner;

impl ResponseCleaner {
    /// Clean raw model output. Never fails; empty input yields `""`.
    pub fn clean(raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }

        let without_reasoning = REASONING_BLOCK.replace_all(raw, "");
        let normalized = Self::clean_lines(&without_reasoning);
        Self::strip_prefixes(normalized)
    }

    /// Clean output that may be absent
    pub fn clean_opt(raw: Option<&str>) -> String {
        raw.map(Self::clean).unwrap_or_default()
    }

    /// Per-line cleanup outside fences, then blank-line collapsing and trim
    fn clean_lines(text: &str) -> String {
        let mut lines: Vec<String> = Vec::new();
        let mut in_fence = false;
        let mut blank_run = 0usize;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with("```") {
                in_fence = !in_fence;
                blank_run = 0;
                lines.push(trimmed.to_string());
                continue;
            }
            if in_fence {
                lines.push(line.trim_end().to_string());
                continue;
            }

            let cleaned = Self::clean_prose_line(trimmed);
            if cleaned.is_empty() {
                blank_run += 1;
                if blank_run > 1 {
                    continue;
                }
            } else {
                blank_run = 0;
            }
            lines.push(cleaned);
        }

        lines.join("\n").trim().to_string()
    }

    fn clean_prose_line(line: &str) -> String {
        let without_meta = META_COMMENTARY.replace_all(line, "");

        // Tags inside inline code spans are content, not markup.
        let mut out = String::with_capacity(without_meta.len());
        for (i, part) in without_meta.split('`').enumerate() {
            if i > 0 {
                out.push('`');
            }
            if i % 2 == 0 {
                out.push_str(&MARKUP_TAG.replace_all(part, ""));
            } else {
                out.push_str(part);
            }
        }
        out.trim().to_string()
    }

    fn strip_prefixes(mut text: String) -> String {
        loop {
            let stripped = LEADING_PREFIX.replace(&text, "");
            if stripped.len() == text.len() {
                return text;
            }
            text = stripped.trim_start().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(ResponseCleaner::clean(""), "");
        assert_eq!(ResponseCleaner::clean("   \n  "), "");
        assert_eq!(ResponseCleaner::clean_opt(None), "");
    }

    #[test]
    fn test_removes_reasoning_block() {
        let raw = "<think>reasoning</think>The capital of France is Paris.";
        assert_eq!(ResponseCleaner::clean(raw), "The capital of France is Paris.");
    }

    #[test]
    fn test_removes_multiline_reasoning_variants() {
        let raw = "<THINK>\nstep one\n\nstep two\n</THINK>\nAnswer A.\n<reasoning>\nmore\n</reasoning>\nAnswer B.";
        assert_eq!(ResponseCleaner::clean(raw), "Answer A.\n\nAnswer B.");

        let raw = "<thinking>hmm</thinking>Done.";
        assert_eq!(ResponseCleaner::clean(raw), "Done.");
    }

    #[test]
    fn test_collapses_newlines() {
        let raw = "First paragraph.\n\n\n\n\nSecond paragraph.";
        assert_eq!(
            ResponseCleaner::clean(raw),
            "First paragraph.\n\nSecond paragraph."
        );
    }

    #[test]
    fn test_trims_lines() {
        let raw = "   line one   \n\t line two  ";
        assert_eq!(ResponseCleaner::clean(raw), "line one\nline two");
    }

    #[test]
    fn test_strips_meta_commentary() {
        let raw = "Based on the provided responses, Paris is the capital.";
        assert_eq!(ResponseCleaner::clean(raw), "Paris is the capital.");

        let raw = "According to response 2: the answer is 4.";
        assert_eq!(ResponseCleaner::clean(raw), "the answer is 4.");

        let raw = "Response 1 suggests that caching helps.";
        assert_eq!(ResponseCleaner::clean(raw), "that caching helps.");

        let raw = "After analyzing all the responses: use Rust.";
        assert_eq!(ResponseCleaner::clean(raw), "use Rust.");
    }

    #[test]
    fn test_strips_markup_tags() {
        let raw = "Hello <b>world</b><br/>!";
        assert_eq!(ResponseCleaner::clean(raw), "Hello world!");
    }

    #[test]
    fn test_keeps_comparisons_and_inline_code() {
        let raw = "Use `Vec<String>` when a < b and c > d.";
        assert_eq!(ResponseCleaner::clean(raw), raw);
    }

    #[test]
    fn test_strips_leading_prefixes() {
        assert_eq!(ResponseCleaner::clean("Summary: Paris."), "Paris.");
        assert_eq!(ResponseCleaner::clean("Final answer: 42"), "42");
        assert_eq!(
            ResponseCleaner::clean("Here's a comprehensive summary:\n\nParis."),
            "Paris."
        );
        assert_eq!(
            ResponseCleaner::clean("Comprehensive summary: Summary: nested"),
            "nested"
        );
    }

    #[test]
    fn test_preserves_fenced_code() {
        let raw = "Example:\n\n```rust\nfn main() {\n    let v: Vec<u8> = vec![];\n\n\n\n}\n```\nDone.";
        let cleaned = ResponseCleaner::clean(raw);
        assert!(cleaned.contains("    let v: Vec<u8> = vec![];"));
        assert!(cleaned.contains("{\n    let v: Vec<u8> = vec![];\n\n\n\n}"));
    }

    #[test]
    fn test_idempotent() {
        let raw = "<think>x</think>\n\n  Summary:  Based on the responses, **Paris**.\n\n\n\n<p>Item</p>";
        let once = ResponseCleaner::clean(raw);
        assert_eq!(once, "**Paris**.\n\nItem");
        assert_eq!(ResponseCleaner::clean(&once), once);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let raw = String::from("<think>a</think>b");
        let _ = ResponseCleaner::clean(&raw);
        assert_eq!(raw, "<think>a</think>b");
    }
}
