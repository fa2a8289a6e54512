//! Commit message generation from staged changes.

pub mod diff;
pub mod message;
pub mod prompt;
pub mod truncate;

pub use diff::{ChangedFile, FileStatus, StagedDiff, collect_staged_diff};
pub use message::{ValidatedMessage, commit_staged, validate_message};
pub use prompt::{AssembledPrompt, DIFF_MARKER, PromptTemplate, assemble_prompt};
pub use truncate::{DiffDocument, truncate_diff};
