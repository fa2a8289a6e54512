//! Prompt construction for AI-generated commit messages.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::commit::truncate::{FURTHER_TRUNCATION_MARKER, cut_to_chars, truncate_diff};
use crate::error::ConfigError;
use crate::llm::tokens::TokenBudget;

/// Placeholder replaced by the (possibly truncated) diff.
pub const DIFF_MARKER: &str = "{{DIFF}}";

/// Share of the computed diff allowance actually used in the whole-prompt pass.
const TOTAL_PASS_SAFETY_MARGIN: f64 = 0.95;

const DEFAULT_TEMPLATE: &str = r#"You are an assistant that writes Git commit messages following the Conventional Commits specification.

Write ONE commit subject line for the staged changes below.

Rules:
- Format: type(scope): description
- Type: one of feat, fix, refactor, chore, test, docs, style, perf, build, ci
- Scope is optional; use the main module or area affected
- Description: imperative mood ("add", "fix", "remove"), lowercase, no period at the end
- Keep the whole line under 72 characters
- If the diff ends with a truncation note, describe the visible changes only

Respond with the commit subject line only. No quotes, no markdown, no explanation.

Staged diff:
{{DIFF}}
"#;

/// Prompt text with exactly one [`DIFF_MARKER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    /// Wrap template text, rejecting text that does not contain exactly one marker.
    pub fn new(text: impl Into<String>) -> Result<Self, ConfigError> {
        let text = text.into();
        let found = text.matches(DIFF_MARKER).count();
        if found != 1 {
            return Err(ConfigError::TemplateMarker {
                marker: DIFF_MARKER,
                found,
            });
        }
        Ok(Self { text })
    }

    /// Read a template from disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::TemplateRead)?;
        Self::new(text)
    }

    /// Use the template at `path` when it exists, the built-in one otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            debug!("Using prompt template from {}", path.display());
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute `diff` for the marker.
    pub fn render(&self, diff: &str) -> String {
        self.text.replacen(DIFF_MARKER, diff, 1)
    }

    /// Estimated tokens of the template with the marker removed.
    pub fn overhead_tokens(&self, budget: &TokenBudget) -> usize {
        budget.estimate(&self.render(""))
    }

    /// Whether the template alone, with an empty diff, is over the total budget.
    pub fn exceeds_budget(&self, budget: &TokenBudget) -> bool {
        self.overhead_tokens(budget) > budget.max_total_tokens
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

/// A rendered prompt and how the diff was shortened to produce it.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    /// Estimated tokens of `text`.
    pub estimated_tokens: usize,
    /// The diff was cut to fit the diff-only limit.
    pub diff_truncated: bool,
    /// The diff was cut again to fit the whole-prompt limit.
    pub further_truncated: bool,
}

/// Merge `diff` into `template` within `budget`.
///
/// The diff is first cut to the diff-only limit. The rendered prompt is then
/// always re-measured: if it is over the total limit, the diff is cut again
/// to whatever the template leaves free (minus the response reservation and
/// a 5% margin). The result is within `max_total_tokens` unless the template
/// alone already is not; see [`PromptTemplate::exceeds_budget`].
pub fn assemble_prompt(template: &PromptTemplate, diff: &str, budget: &TokenBudget) -> AssembledPrompt {
    let truncated = truncate_diff(diff, budget);
    let diff_truncated = matches!(truncated, Cow::Owned(_));

    let prompt = template.render(&truncated);
    let total_tokens = budget.estimate(&prompt);

    if total_tokens <= budget.max_total_tokens {
        return AssembledPrompt {
            text: prompt,
            estimated_tokens: total_tokens,
            diff_truncated,
            further_truncated: false,
        };
    }

    let available_tokens = budget
        .max_total_tokens
        .saturating_sub(template.overhead_tokens(budget))
        .saturating_sub(budget.reserved_response_tokens);
    let max_diff_chars =
        (available_tokens as f64 * budget.chars_per_token as f64 * TOTAL_PASS_SAFETY_MARGIN)
            .floor() as usize;

    debug!(
        "Prompt is ~{} tokens (limit {}); cutting diff to {} chars",
        total_tokens, budget.max_total_tokens, max_diff_chars
    );

    let final_diff = cut_to_chars(&truncated, max_diff_chars, FURTHER_TRUNCATION_MARKER);
    let further_truncated = matches!(final_diff, Cow::Owned(_));
    let text = template.render(&final_diff);

    AssembledPrompt {
        estimated_tokens: budget.estimate(&text),
        text,
        diff_truncated,
        further_truncated,
    }
}
