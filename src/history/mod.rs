//! Per-path history queries over the commit graph.
//!
//! A path's last change is found the way `git log -1 -- <path>` finds it:
//! walking back through parents that hold the same version of the path,
//! first parent preferred. Base revisions are anchored on the first-parent
//! chain of HEAD.

use crate::{
    Res,
    track::{CommitId, RepoFile},
};
use std::path::{Path, PathBuf};

#[cfg(test)]
pub(crate) mod fake;
mod git;

pub use git::{FirstParentChain, GitHistory};

/// Read-only queries answered from an immutable object store.
pub trait History {
    fn head(&self) -> Option<CommitId>;

    /// The most recent change to `path` at or before `as_of`.
    fn history_at(&self, path: &Path, as_of: &CommitId) -> Res<RepoFile>;

    fn first_parent(&self, commit: &CommitId) -> Res<Option<CommitId>>;

    /// Closest first-parent-chain commit that `commit` descends from, or
    /// `commit` itself when it is on the chain.
    fn anchor_of(&self, commit: &CommitId) -> Res<Option<CommitId>>;

    /// Whether `a` is neither `b` nor one of its ancestors.
    fn is_newer(&self, a: &CommitId, b: &CommitId) -> Res<bool>;

    /// Content of `path` at `commit`, `None` if absent there.
    fn read_blob(&self, path: &Path, commit: &CommitId) -> Result<Option<Vec<u8>>, git2::Error>;

    /// The most recent change to `path` as of HEAD.
    fn history_of(&self, path: &Path) -> Res<RepoFile> {
        match self.head() {
            Some(head) => self.history_at(path, &head),
            None => Ok(RepoFile::untracked(path)),
        }
    }
}

/// Changes that shaped the file now at `path`, newest first, following
/// renames backwards. Stops at the change that created the file or at the
/// first change not newer than `until`.
pub fn lineage<H: History + ?Sized>(
    history: &H,
    path: &Path,
    until: Option<&CommitId>,
) -> Res<Vec<RepoFile>> {
    let mut records = Vec::new();
    let mut record = history.history_of(path)?;

    while let Some(commit) = record.last_commit {
        let reached = match until {
            Some(until) => !history.is_newer(&commit, until)?,
            None => false,
        };
        let created =
            record.is_new_in_commit || record.is_copy_in_commit || record.is_delete_in_commit;

        let previous_path = if record.is_renamed_into() {
            record.renamed_from.clone()
        } else {
            None
        };
        let current_path = previous_path.unwrap_or_else(|| record.path.clone());
        records.push(record);

        if reached || created {
            break;
        }
        let Some(parent) = history.first_parent(&commit)? else {
            break;
        };
        record = history.history_at(&current_path, &parent)?;
    }

    Ok(records)
}

/// Paths the file now at `path` was renamed from, newest first.
pub fn previous_paths<H: History + ?Sized>(history: &H, path: &Path) -> Res<Vec<PathBuf>> {
    Ok(lineage(history, path, None)?
        .into_iter()
        .filter(RepoFile::is_renamed_into)
        .filter_map(|record| record.renamed_from)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{fake::FakeHistory, *};
    use pretty_assertions::assert_eq;

    #[test]
    fn lineage_follows_renames() {
        let mut history = FakeHistory::new();
        let c1 = history.commit(&[("a.md", Some("one\n"))]);
        let c2 = history.rename("a.md", "b.md");
        let c3 = history.commit(&[("b.md", Some("two\n"))]);
        let c4 = history.rename("b.md", "c.md");

        let records = lineage(&history, Path::new("c.md"), None).unwrap();
        let commits = records.iter().map(|r| r.last_commit.unwrap()).collect::<Vec<_>>();
        let paths = records.iter().map(|r| r.path.clone()).collect::<Vec<_>>();

        assert_eq!(commits, vec![c4, c3, c2, c1]);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("c.md"),
                PathBuf::from("b.md"),
                PathBuf::from("b.md"),
                PathBuf::from("a.md")
            ]
        );
        assert_eq!(
            previous_paths(&history, Path::new("c.md")).unwrap(),
            vec![PathBuf::from("b.md"), PathBuf::from("a.md")]
        );
    }

    #[test]
    fn lineage_stops_at_bound() {
        let mut history = FakeHistory::new();
        history.commit(&[("a.md", Some("one\n"))]);
        let c2 = history.commit(&[("a.md", Some("two\n"))]);
        history.commit(&[("other.md", Some("x\n"))]);
        let c4 = history.commit(&[("a.md", Some("three\n"))]);
        history.commit(&[("other.md", Some("y\n"))]);

        let records = lineage(&history, Path::new("a.md"), Some(&c2)).unwrap();
        let commits = records.iter().map(|r| r.last_commit.unwrap()).collect::<Vec<_>>();

        assert_eq!(commits, vec![c4, c2]);
    }

    #[test]
    fn lineage_of_untracked_path_is_empty() {
        let mut history = FakeHistory::new();
        history.commit(&[("a.md", Some("one\n"))]);

        assert!(lineage(&history, Path::new("b.md"), None).unwrap().is_empty());
        assert!(previous_paths(&history, Path::new("b.md")).unwrap().is_empty());
    }
}
