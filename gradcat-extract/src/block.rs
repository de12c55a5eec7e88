//! Depth-counting brace scanner.
//!
//! Block-shaped constructs are located by a keyword regex whose match ends at
//! the opening `{`, then closed by walking the text and tracking brace depth.
//! Quoted strings and `//` line comments are skipped so braces inside them do
//! not affect the balance. This handles nested same-kind blocks, which a
//! non-greedy multiline regex cannot.

use regex::Regex;
use std::ops::Range;

/// A matched block: `outer` spans keyword through closing brace, `inner`
/// spans the text strictly between the braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub outer: Range<usize>,
    pub inner: Range<usize>,
}

/// Find the byte index of the `}` balancing the `{` at `open`.
/// Returns `None` when the block never closes.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    debug_assert_eq!(text.as_bytes().get(open), Some(&b'{'));

    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            q @ (b'\'' | b'"') => {
                // Skip to the closing quote, honoring backslash escapes.
                i += 1;
                while i < bytes.len() && bytes[i] != q {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Find the first block whose opener matches `keyword_re` at or after `from`.
///
/// The regex must match up to and including the opening brace; the scanner
/// takes over from there. An unclosed block yields `None` (parse ambiguity
/// is zero matches, not an error).
pub fn find_block(text: &str, keyword_re: &Regex, from: usize) -> Option<Block> {
    let mut search = from;
    while let Some(m) = keyword_re.find_at(text, search) {
        let open = m.start() + m.as_str().rfind('{')?;
        match matching_brace(text, open) {
            Some(close) => {
                return Some(Block {
                    outer: m.start()..close + 1,
                    inner: open + 1..close,
                });
            }
            None => {
                // Unclosed; try the next candidate.
                search = m.end();
            }
        }
    }
    None
}

/// All non-overlapping blocks matching `keyword_re`, in text order.
pub fn all_blocks(text: &str, keyword_re: &Regex) -> Vec<Block> {
    let mut out = Vec::new();
    let mut from = 0;
    while let Some(block) = find_block(text, keyword_re, from) {
        from = block.outer.end;
        out.push(block);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).expect("regex")
    }

    #[test]
    fn balances_nested_braces() {
        let text = "repositories {\n    maven { url 'http://x/' }\n}\nrest";
        let block = find_block(text, &re(r"(?m)^\s*repositories\s*\{"), 0).expect("block");
        assert_eq!(&text[block.outer.clone()], "repositories {\n    maven { url 'http://x/' }\n}");
    }

    #[test]
    fn nested_same_kind_block_closes_at_outer_brace() {
        let text = "repositories {\n    repositories {\n        mavenCentral()\n    }\n}\n";
        let block = find_block(text, &re(r"repositories\s*\{"), 0).expect("block");
        assert_eq!(block.outer.end, text.rfind('}').expect("brace") + 1);
    }

    #[test]
    fn braces_in_strings_and_comments_ignored() {
        let text = "ext {\n    a = '{not a brace'\n    // stray } in comment\n    b = \"also{\"\n}\n";
        let block = find_block(text, &re(r"ext\s*\{"), 0).expect("block");
        assert_eq!(&text[block.inner.clone()].trim(), &"a = '{not a brace'\n    // stray } in comment\n    b = \"also{\"".trim());
    }

    #[test]
    fn unclosed_block_is_no_match() {
        let text = "signing {\n    sign publishing.publications\n";
        assert!(find_block(text, &re(r"signing\s*\{"), 0).is_none());
    }

    #[test]
    fn all_blocks_walks_repeats() {
        let text = "a { 1 }\nb\na { 2 }\n";
        let blocks = all_blocks(text, &re(r"a\s*\{"));
        assert_eq!(blocks.len(), 2);
        assert_eq!(&text[blocks[1].inner.clone()], " 2 ");
    }
}
