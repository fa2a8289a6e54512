//! Staged diff collection using git2.

use std::fmt;

use git2::{Delta, Diff, DiffFormat, ErrorCode, Repository, Tree};

use crate::error::CommitError;

/// Status of a changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStatus::Added => write!(f, "Added"),
            FileStatus::Modified => write!(f, "Modified"),
            FileStatus::Deleted => write!(f, "Deleted"),
            FileStatus::Renamed => write!(f, "Renamed"),
        }
    }
}

/// A file with staged changes.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
}

/// The staged changes of a repository, as `git diff --cached` would show them.
///
/// The text is complete; fitting it into a provider budget is the truncator's job.
#[derive(Debug, Clone)]
pub struct StagedDiff {
    pub text: String,
    pub changed_files: Vec<ChangedFile>,
    pub additions: usize,
    pub deletions: usize,
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(CommitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, CommitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e)
            if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound =>
        {
            return Ok(None);
        }
        Err(e) => return Err(CommitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(CommitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect the staged (index vs HEAD) diff.
///
/// Unstaged and untracked files are ignored. Returns
/// [`CommitError::NoStagedChanges`] when the index matches HEAD.
pub fn collect_staged_diff(repo: &Repository) -> Result<StagedDiff, CommitError> {
    let head_tree = resolve_head_tree(repo)?;

    let diff = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(CommitError::DiffFailed)?;

    let changed_files = collect_files(&diff);
    if changed_files.is_empty() {
        return Err(CommitError::NoStagedChanges);
    }

    let mut text = String::new();
    let mut additions = 0usize;
    let mut deletions = 0usize;

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        match origin {
            '+' => additions += 1,
            '-' => deletions += 1,
            _ => {}
        }

        // Include the origin character for context
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })
    .map_err(CommitError::DiffFailed)?;

    text.truncate(text.trim_end().len());

    Ok(StagedDiff {
        text,
        changed_files,
        additions,
        deletions,
    })
}

/// Changed file entries from a diff, sorted by path.
fn collect_files(diff: &Diff<'_>) -> Vec<ChangedFile> {
    let mut files: Vec<ChangedFile> = diff
        .deltas()
        .filter_map(|delta| {
            let status = match delta.status() {
                Delta::Added => FileStatus::Added,
                Delta::Deleted => FileStatus::Deleted,
                Delta::Renamed => FileStatus::Renamed,
                _ => FileStatus::Modified,
            };

            let new_path = delta
                .new_file()
                .path()
                .map(|p| p.to_string_lossy().to_string());
            let old_path = delta
                .old_file()
                .path()
                .map(|p| p.to_string_lossy().to_string());

            let (path, old_path) = match status {
                FileStatus::Renamed => (new_path.clone().or_else(|| old_path.clone())?, old_path),
                _ => (new_path.or(old_path)?, None),
            };

            Some(ChangedFile {
                path,
                status,
                old_path,
            })
        })
        .filter(|f| !f.path.is_empty())
        .collect();

    files.sort_by(|a, b| a.path.cmp(&b.path));
    files
}
