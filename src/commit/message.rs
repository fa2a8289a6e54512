//! Commit message validation and the git commit operation.

use std::fmt;

use git2::{ErrorCode, Oid, Repository};
use regex_lite::Regex;
use tracing::debug;

use crate::config::GenerationConfig;
use crate::error::CommitError;

/// Type used when the model's output has no recognizable conventional prefix.
const DEFAULT_TYPE: &str = "feat";

/// A single-line conventional commit subject that fits the configured length.
///
/// Only [`validate_message`] produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage(String);

impl ValidatedMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ValidatedMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Clean raw model output into a commit subject line.
///
/// Malformed output is repaired rather than rejected: markdown fences and
/// code spans are stripped, surrounding quotes dropped, only the first line
/// kept, the line shortened to `max_title_length`, and a default type
/// prepended when no allowed type prefix is present. Returns `None` only when
/// nothing usable is left.
pub fn validate_message(raw: Option<&str>, config: &GenerationConfig) -> Option<ValidatedMessage> {
    let raw = raw?;
    if raw.is_empty() {
        return None;
    }

    let without_fences = fenced_block_regex().replace_all(raw, "");
    let without_spans = code_span_regex().replace_all(&without_fences, "$1");
    let unquoted = strip_quote_pair(without_spans.trim()).trim();

    let first_line = unquoted.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return None;
    }

    let max_len = config.max_title_length;
    let subject = truncate_chars(first_line, max_len).trim_end();

    if type_prefix_regex(&config.allowed_types).is_match(subject) {
        return Some(ValidatedMessage(subject.to_string()));
    }

    let default_type = default_type(&config.allowed_types);
    let prefix = format!("{default_type}: ");
    let room = max_len.saturating_sub(prefix.chars().count());
    let description = truncate_chars(subject, room).trim_end();
    if description.is_empty() {
        return None;
    }

    debug!("Model output lacked a conventional type; prefixing '{}'", prefix.trim_end());
    Some(ValidatedMessage(format!("{prefix}{description}")))
}

/// Create a commit on HEAD from the current index.
///
/// Only what is already staged is committed. On an unborn branch the commit
/// has no parent.
pub fn commit_staged(repo: &Repository, message: &ValidatedMessage) -> Result<Oid, CommitError> {
    let mut index = repo.index().map_err(CommitError::CommitFailed)?;
    let tree_id = index.write_tree().map_err(CommitError::CommitFailed)?;
    let tree = repo.find_tree(tree_id).map_err(CommitError::CommitFailed)?;

    let sig = repo.signature().map_err(CommitError::ConfigError)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(CommitError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(CommitError::CommitFailed(e)),
    };
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message.as_str(), &tree, &parents)
        .map_err(CommitError::CommitFailed)?;

    Ok(oid)
}

/// Fenced code blocks: an opening fence followed by a line break, up to the
/// next fence. A fence that stays on one line is a code span instead.
fn fenced_block_regex() -> Regex {
    Regex::new(r"(?s)```[^`\n]*\n.*?```").expect("fenced block pattern is valid")
}

fn code_span_regex() -> Regex {
    Regex::new(r"`+([^`]+)`+").expect("code span pattern is valid")
}

fn type_prefix_regex(allowed_types: &[String]) -> Regex {
    let alternatives = allowed_types
        .iter()
        .map(|t| regex_lite::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)^({alternatives})(\(.*\))?:"))
        .expect("escaped type alternatives form a valid pattern")
}

fn default_type(allowed_types: &[String]) -> &str {
    if allowed_types.iter().any(|t| t.eq_ignore_ascii_case(DEFAULT_TYPE)) {
        DEFAULT_TYPE
    } else {
        allowed_types.first().map(String::as_str).unwrap_or(DEFAULT_TYPE)
    }
}

/// Drop one leading and one trailing quote when both are present.
fn strip_quote_pair(s: &str) -> &str {
    let is_quote = |c: char| c == '"' || c == '\'';
    let mut chars = s.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) if is_quote(first) && is_quote(last) => {
            &s[first.len_utf8()..s.len() - last.len_utf8()]
        }
        _ => s,
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
