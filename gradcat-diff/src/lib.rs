//! Unified diff generation.
//!
//! Modify diffs always emit a single hunk covering the full old and new line
//! counts, comparing lines positionally. This is deliberately not a minimal
//! (LCS-aligned) diff; the contract is syntactic validity for a standard
//! `patch` tool, and applying the diff to the old text must reproduce the new
//! text exactly. A minimal-diff implementation can be substituted behind the
//! same three entry points.

const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file\n";

/// Diff for a modified file: one whole-file hunk.
pub fn modify_diff(path: &str, old: &str, new: &str) -> String {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let old_open = missing_final_newline(old);
    let new_open = missing_final_newline(new);

    let mut body = String::new();
    let shared = old_lines.len().min(new_lines.len());

    for i in 0..shared {
        let old_open_here = old_open && i + 1 == old_lines.len();
        let new_open_here = new_open && i + 1 == new_lines.len();
        // A final line missing its newline on only one side is a change
        // even when the text matches.
        if old_lines[i] == new_lines[i] && old_open_here == new_open_here {
            push_line(&mut body, ' ', old_lines[i]);
            if old_open_here {
                body.push_str(NO_NEWLINE_MARKER);
            }
        } else {
            push_line(&mut body, '-', old_lines[i]);
            if old_open_here {
                body.push_str(NO_NEWLINE_MARKER);
            }
            push_line(&mut body, '+', new_lines[i]);
            if new_open_here {
                body.push_str(NO_NEWLINE_MARKER);
            }
        }
    }
    for line in &old_lines[shared..] {
        push_line(&mut body, '-', line);
    }
    if old_lines.len() > shared && old_open {
        body.push_str(NO_NEWLINE_MARKER);
    }
    for line in &new_lines[shared..] {
        push_line(&mut body, '+', line);
    }
    if new_lines.len() > shared && new_open {
        body.push_str(NO_NEWLINE_MARKER);
    }

    format!(
        "--- a/{path}\n+++ b/{path}\n{}{body}",
        hunk_header(old_lines.len(), new_lines.len())
    )
}

/// Diff for a newly created file (`/dev/null` source).
pub fn add_diff(path: &str, new: &str) -> String {
    let new_lines = split_lines(new);
    let mut body = String::new();
    for line in &new_lines {
        push_line(&mut body, '+', line);
    }
    if missing_final_newline(new) {
        body.push_str(NO_NEWLINE_MARKER);
    }
    format!(
        "--- /dev/null\n+++ b/{path}\n{}{body}",
        hunk_header(0, new_lines.len())
    )
}

/// Diff for a deleted file (`/dev/null` target).
pub fn delete_diff(path: &str, old: &str) -> String {
    let old_lines = split_lines(old);
    let mut body = String::new();
    for line in &old_lines {
        push_line(&mut body, '-', line);
    }
    if missing_final_newline(old) {
        body.push_str(NO_NEWLINE_MARKER);
    }
    format!(
        "--- a/{path}\n+++ /dev/null\n{}{body}",
        hunk_header(old_lines.len(), 0)
    )
}

fn hunk_header(old_count: usize, new_count: usize) -> String {
    let old_start = if old_count == 0 { 0 } else { 1 };
    let new_start = if new_count == 0 { 0 } else { 1 };
    format!("@@ -{old_start},{old_count} +{new_start},{new_count} @@\n")
}

fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }
    text.lines().collect()
}

fn missing_final_newline(text: &str) -> bool {
    !text.is_empty() && !text.ends_with('\n')
}

fn push_line(out: &mut String, marker: char, line: &str) {
    out.push(marker);
    out.push_str(line);
    out.push('\n');
}
