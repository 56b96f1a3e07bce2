use super::History;
use crate::{
    Res,
    config::SimilarityConfig,
    error::Error,
    git2_opts,
    track::{ChangeKind, CommitId, RepoFile},
};
use git2::{Commit, Delta, ErrorCode, Oid, Repository};
use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

/// HEAD followed by its first parents, newest first.
#[derive(Debug, Default)]
pub struct FirstParentChain {
    commits: Vec<Oid>,
    members: HashSet<Oid>,
}

impl FirstParentChain {
    pub fn load(repo: &Repository) -> Res<Self> {
        let head = match repo.head() {
            Ok(head) => head.peel_to_commit().map_err(Error::ReadHistory)?,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                log::debug!("No commit on HEAD yet");
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::ReadHistory(e)),
        };

        let mut commits = vec![head.id()];
        let mut commit = head;
        while commit.parent_count() > 0 {
            commit = commit.parent(0).map_err(Error::ReadHistory)?;
            commits.push(commit.id());
        }

        let members = commits.iter().copied().collect();
        log::debug!("Loaded {} first-parent commits", commits.len());

        Ok(Self { commits, members })
    }

    fn contains(&self, oid: &Oid) -> bool {
        self.members.contains(oid)
    }
}

/// One delta of a commit's first-parent diff, after rename/copy detection.
#[derive(Debug, Clone)]
struct Change {
    status: Delta,
    old: Option<PathBuf>,
    new: Option<PathBuf>,
}

/// [`History`] backed by a git repository. Results are cached per
/// `(path, commit)`, so one instance belongs to one thread.
pub struct GitHistory {
    repo: Repository,
    chain: Arc<FirstParentChain>,
    similarity: SimilarityConfig,
    records: RefCell<HashMap<(PathBuf, Oid), RepoFile>>,
    changes: RefCell<HashMap<Oid, Rc<[Change]>>>,
    anchors: RefCell<HashMap<Oid, Option<Oid>>>,
}

impl GitHistory {
    pub fn new(repo: Repository, chain: Arc<FirstParentChain>, similarity: SimilarityConfig) -> Self {
        Self {
            repo,
            chain,
            similarity,
            records: RefCell::default(),
            changes: RefCell::default(),
            anchors: RefCell::default(),
        }
    }

    pub fn open(
        root: &Path,
        chain: Arc<FirstParentChain>,
        similarity: SimilarityConfig,
    ) -> Result<Self, git2::Error> {
        Ok(Self::new(Repository::open(root)?, chain, similarity))
    }

    /// Id of the object at `path` in `commit`'s tree.
    fn entry_id(&self, commit: &Commit, path: &Path) -> Res<Option<Oid>> {
        let tree = commit.tree().map_err(Error::ReadHistory)?;

        match tree.get_path(path) {
            Ok(entry) => Ok(Some(entry.id())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::ReadHistory(e)),
        }
    }

    /// Deltas between `commit` and its first parent.
    fn changes_in(&self, commit: &Commit) -> Res<Rc<[Change]>> {
        if let Some(changes) = self.changes.borrow().get(&commit.id()) {
            return Ok(Rc::clone(changes));
        }

        let tree = commit.tree().map_err(Error::ReadHistory)?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(
                commit
                    .parent(0)
                    .and_then(|parent| parent.tree())
                    .map_err(Error::ReadHistory)?,
            ),
        };

        let mut diff = self
            .repo
            .diff_tree_to_tree(
                parent_tree.as_ref(),
                Some(&tree),
                Some(&mut git2_opts::commit_diff(&self.similarity)),
            )
            .map_err(Error::ReadHistory)?;
        diff.find_similar(Some(&mut git2_opts::find_similar(&self.similarity)))
            .map_err(Error::ReadHistory)?;

        let changes = diff
            .deltas()
            .filter(|delta| delta.status() != Delta::Unmodified)
            .map(|delta| Change {
                status: delta.status(),
                old: delta.old_file().path().map(Path::to_path_buf),
                new: delta.new_file().path().map(Path::to_path_buf),
            })
            .collect::<Rc<[Change]>>();

        self.changes.borrow_mut().insert(commit.id(), Rc::clone(&changes));
        Ok(changes)
    }

    /// What `commit` did to `path`, given whether the path was present
    /// before and after it.
    fn classify(&self, path: &Path, commit: &Commit, existed: bool, exists: bool) -> Res<RepoFile> {
        let changes = self.changes_in(commit)?;

        let into = changes
            .iter()
            .find(|c| c.status != Delta::Deleted && c.new.as_deref() == Some(path));
        let away = changes.iter().find(|c| {
            matches!(c.status, Delta::Deleted | Delta::Renamed) && c.old.as_deref() == Some(path)
        });

        let kind = match (into, away) {
            (Some(change), _) => match change.status {
                Delta::Added | Delta::Untracked => ChangeKind::Added,
                Delta::Copied => ChangeKind::Copied,
                Delta::Renamed => ChangeKind::Renamed {
                    from: change.old.clone().unwrap_or_default(),
                    to: path.to_path_buf(),
                },
                _ => ChangeKind::Modified,
            },
            (None, Some(change)) if change.status == Delta::Renamed => ChangeKind::Renamed {
                from: path.to_path_buf(),
                to: change.new.clone().unwrap_or_default(),
            },
            (None, Some(_)) => ChangeKind::Deleted,
            (None, None) => match (existed, exists) {
                (false, true) => ChangeKind::Added,
                (true, false) => ChangeKind::Deleted,
                _ => ChangeKind::Modified,
            },
        };

        Ok(RepoFile::changed(path, commit.id().into(), kind))
    }
}

impl History for GitHistory {
    fn head(&self) -> Option<CommitId> {
        self.chain.commits.first().map(|oid| CommitId(*oid))
    }

    /// Walks back from `as_of` through parents holding the same version of
    /// `path`, first parent preferred, until a commit changed it.
    fn history_at(&self, path: &Path, as_of: &CommitId) -> Res<RepoFile> {
        let key = (path.to_path_buf(), as_of.0);
        if let Some(record) = self.records.borrow().get(&key) {
            return Ok(record.clone());
        }

        let mut commit = self.repo.find_commit(as_of.0).map_err(Error::ReadHistory)?;
        let current = self.entry_id(&commit, path)?;
        let mut visited = vec![];

        let record = loop {
            visited.push(commit.id());

            let mut same = None;
            let mut first = None;
            for (i, parent) in commit.parents().enumerate() {
                let entry = self.entry_id(&parent, path)?;
                if i == 0 {
                    first = Some(entry);
                }
                if entry == current {
                    same = Some(parent);
                    break;
                }
            }

            match (same, first) {
                (Some(parent), _) => commit = parent,
                (None, Some(existed)) => {
                    break self.classify(path, &commit, existed.is_some(), current.is_some())?;
                }
                (None, None) if current.is_some() => {
                    break self.classify(path, &commit, false, true)?;
                }
                (None, None) => break RepoFile::untracked(path),
            }
        };

        log::debug!(
            "{:?} as of {}: {:?} after {} commits",
            path,
            as_of,
            record.last_commit,
            visited.len()
        );

        let mut records = self.records.borrow_mut();
        for oid in visited {
            records.insert((path.to_path_buf(), oid), record.clone());
        }
        Ok(record)
    }

    fn first_parent(&self, commit: &CommitId) -> Res<Option<CommitId>> {
        let commit = self.repo.find_commit(commit.0).map_err(Error::ReadHistory)?;
        Ok(commit.parent_ids().next().map(CommitId))
    }

    fn anchor_of(&self, commit: &CommitId) -> Res<Option<CommitId>> {
        if self.chain.contains(&commit.0) {
            return Ok(Some(*commit));
        }
        if let Some(anchor) = self.anchors.borrow().get(&commit.0) {
            return Ok(anchor.map(CommitId));
        }

        let mut anchor = None;
        for candidate in &self.chain.commits {
            if self
                .repo
                .graph_descendant_of(commit.0, *candidate)
                .map_err(Error::ReadHistory)?
            {
                anchor = Some(*candidate);
                break;
            }
        }

        log::debug!("Anchored {} at {:?}", commit, anchor);
        self.anchors.borrow_mut().insert(commit.0, anchor);
        Ok(anchor.map(CommitId))
    }

    fn is_newer(&self, a: &CommitId, b: &CommitId) -> Res<bool> {
        if a == b {
            return Ok(false);
        }
        let reachable = self
            .repo
            .graph_descendant_of(b.0, a.0)
            .map_err(Error::ReadHistory)?;
        Ok(!reachable)
    }

    fn read_blob(&self, path: &Path, commit: &CommitId) -> Result<Option<Vec<u8>>, git2::Error> {
        let tree = self.repo.find_commit(commit.0)?.tree()?;
        let entry = match tree.get_path(path) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let blob = entry.to_object(&self.repo)?.peel_to_blob()?;
        Ok(Some(blob.content().to_vec()))
    }
}
