//! Token-budget-aware diff truncation.
//!
//! Oversized diffs are cut on line boundaries. When the kept text gets close
//! to the budget and a file section has already started, the scan stops early
//! instead of filling up to the hard limit, so the cut tends to land near a
//! file edge rather than deep inside the next file.

use std::borrow::Cow;

use tracing::debug;

use crate::llm::tokens::TokenBudget;

/// Fill ratio past which the scan stops early once a file boundary was seen.
const SOFT_STOP_RATIO: f64 = 0.9;

/// Minimum fill ratio before an early stop is allowed.
const MIN_FILL_RATIO: f64 = 0.7;

/// Leading text shared by every truncation marker line.
pub const TRUNCATION_MARKER_PREFIX: &str = "... (diff truncated";

/// Marker appended when the whole-prompt pass cuts the diff again.
pub const FURTHER_TRUNCATION_MARKER: &str = "... (further truncated to fit API limits)";

/// A unified diff viewed as lines, split into per-file sections by boundary lines.
///
/// Borrowed from the input text; never modified.
#[derive(Debug, Clone)]
pub struct DiffDocument<'a> {
    lines: Vec<&'a str>,
}

impl<'a> DiffDocument<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
        }
    }

    pub fn lines(&self) -> &[&'a str] {
        &self.lines
    }

    /// Whether the line at `index` opens a new file section.
    ///
    /// `diff --git` headers always do. A `---` line does when the line before
    /// it is not also a `---` line, which covers plain `diff -u` output.
    pub fn is_file_boundary(&self, index: usize) -> bool {
        let Some(line) = self.lines.get(index) else {
            return false;
        };

        if line.starts_with("diff --git") {
            return true;
        }

        index > 0 && line.starts_with("---") && !self.lines[index - 1].starts_with("---")
    }
}

/// Shrink `diff` so its estimate fits `budget.max_diff_tokens`.
///
/// A diff already within budget is returned unchanged. Otherwise the result
/// is a prefix of the diff's lines followed by one marker line saying roughly
/// how much was kept. Space for the marker is reserved inside the budget, so
/// truncating the output again is a no-op.
pub fn truncate_diff<'a>(diff: &'a str, budget: &TokenBudget) -> Cow<'a, str> {
    let total_tokens = budget.estimate(diff);
    if total_tokens <= budget.max_diff_tokens {
        return Cow::Borrowed(diff);
    }

    let doc = DiffDocument::new(diff);
    let max_chars = budget.max_diff_chars();
    let soft_stop = max_chars as f64 * SOFT_STOP_RATIO;
    let min_fill = max_chars as f64 * MIN_FILL_RATIO;

    // Worst case marker: kept tokens never exceed the diff limit.
    let marker_room = char_len(&truncation_marker(budget.max_diff_tokens, total_tokens)) + 1;
    let hard_limit = max_chars.saturating_sub(marker_room);

    let mut kept_lines = 0;
    let mut current_len = 0usize;
    let mut boundary_seen = false;

    for (index, line) in doc.lines().iter().enumerate() {
        let line_len = char_len(line) + 1;

        if doc.is_file_boundary(index) {
            boundary_seen = true;
        }

        if boundary_seen
            && (current_len + line_len) as f64 > soft_stop
            && current_len as f64 > min_fill
        {
            break;
        }

        if current_len + line_len > hard_limit {
            break;
        }

        current_len += line_len;
        kept_lines = index + 1;
    }

    if kept_lines == doc.lines().len() {
        return Cow::Borrowed(diff);
    }

    let kept_tokens = current_len / budget.chars_per_token;
    debug!(
        "Truncated diff from ~{} to ~{} tokens ({} of {} lines kept)",
        total_tokens,
        kept_tokens,
        kept_lines,
        doc.lines().len()
    );

    let marker = truncation_marker(kept_tokens, total_tokens);
    let mut truncated = String::with_capacity(current_len + marker.len());
    for line in &doc.lines()[..kept_lines] {
        truncated.push_str(line);
        truncated.push('\n');
    }
    truncated.push_str(&marker);

    Cow::Owned(truncated)
}

/// Cut `text` on line boundaries so that it, plus `marker`, stays within
/// `max_chars`. Text already within `max_chars` is returned unchanged; when
/// not even the marker fits, the result is empty.
pub(crate) fn cut_to_chars<'a>(text: &'a str, max_chars: usize, marker: &str) -> Cow<'a, str> {
    if char_len(text) <= max_chars {
        return Cow::Borrowed(text);
    }

    let marker_room = char_len(marker) + 1;
    if max_chars < marker_room {
        return Cow::Owned(String::new());
    }

    let limit = max_chars - marker_room;
    let mut kept = String::new();
    let mut current_len = 0usize;

    for line in text.split('\n') {
        let line_len = char_len(line) + 1;
        if current_len + line_len > limit {
            break;
        }
        kept.push_str(line);
        kept.push('\n');
        current_len += line_len;
    }

    kept.push_str(marker);
    Cow::Owned(kept)
}

/// Whether a line is one of the synthetic truncation markers.
pub fn is_truncation_marker(line: &str) -> bool {
    line.starts_with(TRUNCATION_MARKER_PREFIX) || line == FURTHER_TRUNCATION_MARKER
}

fn truncation_marker(kept_tokens: usize, total_tokens: usize) -> String {
    format!(
        "{TRUNCATION_MARKER_PREFIX} - showing first ~{kept_tokens} tokens from {}k total)",
        total_tokens / 1000
    )
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
