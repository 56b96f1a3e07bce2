//! In-memory linear history for exercising history consumers without a
//! repository.

use super::History;
use crate::{
    Res,
    track::{ChangeKind, CommitId, RepoFile},
};
use git2::Oid;
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

struct FakeCommit {
    id: CommitId,
    files: BTreeMap<PathBuf, Vec<u8>>,
    renames: Vec<(PathBuf, PathBuf)>,
}

#[derive(Default)]
pub(crate) struct FakeHistory {
    commits: Vec<FakeCommit>,
    unreadable: HashSet<(PathBuf, CommitId)>,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes (`Some`) or removes (`None`) files on top of the last commit.
    pub fn commit(&mut self, changes: &[(&str, Option<&str>)]) -> CommitId {
        let mut files = self.snapshot();
        for (path, content) in changes {
            match content {
                Some(content) => files.insert(PathBuf::from(path), content.as_bytes().to_vec()),
                None => files.remove(Path::new(path)),
            };
        }
        self.push(files, vec![])
    }

    pub fn rename(&mut self, from: &str, to: &str) -> CommitId {
        let mut files = self.snapshot();
        if let Some(content) = files.remove(Path::new(from)) {
            files.insert(PathBuf::from(to), content);
        }
        self.push(files, vec![(from.into(), to.into())])
    }

    pub fn make_unreadable(&mut self, path: &str, commit: CommitId) {
        self.unreadable.insert((path.into(), commit));
    }

    fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.commits
            .last()
            .map(|commit| commit.files.clone())
            .unwrap_or_default()
    }

    fn push(&mut self, files: BTreeMap<PathBuf, Vec<u8>>, renames: Vec<(PathBuf, PathBuf)>) -> CommitId {
        let n = self.commits.len() as u8 + 1;
        let id = CommitId(Oid::from_bytes(&[n; 20]).unwrap());
        self.commits.push(FakeCommit { id, files, renames });
        id
    }

    fn index(&self, commit: &CommitId) -> usize {
        self.commits
            .iter()
            .position(|c| c.id == *commit)
            .expect("unknown fake commit")
    }
}

impl History for FakeHistory {
    fn head(&self) -> Option<CommitId> {
        self.commits.last().map(|commit| commit.id)
    }

    fn history_at(&self, path: &Path, as_of: &CommitId) -> Res<RepoFile> {
        for i in (0..=self.index(as_of)).rev() {
            let commit = &self.commits[i];
            let current = commit.files.get(path);
            let previous = i
                .checked_sub(1)
                .and_then(|p| self.commits[p].files.get(path));

            if current == previous {
                continue;
            }

            let renamed = commit
                .renames
                .iter()
                .find(|(from, to)| from == path || to == path);

            let kind = match (renamed, previous, current) {
                (Some((from, to)), _, _) => ChangeKind::Renamed {
                    from: from.clone(),
                    to: to.clone(),
                },
                (None, None, Some(_)) => ChangeKind::Added,
                (None, Some(_), None) => ChangeKind::Deleted,
                (None, _, _) => ChangeKind::Modified,
            };
            return Ok(RepoFile::changed(path, commit.id, kind));
        }

        Ok(RepoFile::untracked(path))
    }

    fn first_parent(&self, commit: &CommitId) -> Res<Option<CommitId>> {
        Ok(self
            .index(commit)
            .checked_sub(1)
            .map(|i| self.commits[i].id))
    }

    fn anchor_of(&self, commit: &CommitId) -> Res<Option<CommitId>> {
        Ok(Some(*commit))
    }

    fn is_newer(&self, a: &CommitId, b: &CommitId) -> Res<bool> {
        Ok(self.index(a) > self.index(b))
    }

    fn read_blob(&self, path: &Path, commit: &CommitId) -> Result<Option<Vec<u8>>, git2::Error> {
        if self.unreadable.contains(&(path.to_path_buf(), *commit)) {
            return Err(git2::Error::from_str("object not found"));
        }

        Ok(self.commits[self.index(commit)].files.get(path).cloned())
    }
}
