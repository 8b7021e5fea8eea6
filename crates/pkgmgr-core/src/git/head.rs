//! Reads the checked-out commit of a local clone.

use std::path::Path;

use git2::Repository;

/// HEAD commit SHA of the repository at `path`, if it is one.
pub fn head_commit(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let head = repo.head().ok()?;
    let commit = head.peel_to_commit().ok()?;
    Some(commit.id().to_string())
}
