//! Result model: files, patches and the classified tracks, plus the
//! [`Report`] assembled from them.

use crate::{Res, error::Error, lang::LanguageTag};
use git2::Oid;
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::{
    fmt::{self, Display},
    io::Write,
    path::{Path, PathBuf},
};

/// Identifies a commit. Serialized as its full hex id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(pub Oid);

impl From<Oid> for CommitId {
    fn from(oid: Oid) -> Self {
        Self(oid)
    }
}

impl Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

/// A repository file and what its last commit did to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoFile {
    pub path: PathBuf,
    pub filename: String,
    pub directory: String,
    pub has_history: bool,
    pub last_commit: Option<CommitId>,
    pub is_new_in_commit: bool,
    pub is_copy_in_commit: bool,
    pub is_rename_in_commit: bool,
    pub is_delete_in_commit: bool,
    pub renamed_from: Option<PathBuf>,
    pub renamed_to: Option<PathBuf>,
}

/// What a commit did to a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Copied,
    Modified,
    Deleted,
    /// `from` was moved to `to`; the queried path is one of them.
    Renamed { from: PathBuf, to: PathBuf },
}

impl RepoFile {
    /// A path no commit ever touched.
    pub fn untracked(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            directory: path
                .parent()
                .map(|dir| dir.to_string_lossy().into_owned())
                .unwrap_or_default(),
            has_history: false,
            last_commit: None,
            is_new_in_commit: false,
            is_copy_in_commit: false,
            is_rename_in_commit: false,
            is_delete_in_commit: false,
            renamed_from: None,
            renamed_to: None,
        }
    }

    pub fn changed(path: &Path, commit: CommitId, kind: ChangeKind) -> Self {
        let mut file = Self::untracked(path);
        file.has_history = true;
        file.last_commit = Some(commit);

        match kind {
            ChangeKind::Added => file.is_new_in_commit = true,
            ChangeKind::Copied => file.is_copy_in_commit = true,
            ChangeKind::Modified => {}
            ChangeKind::Deleted => file.is_delete_in_commit = true,
            ChangeKind::Renamed { from, to } => {
                file.is_rename_in_commit = true;
                file.renamed_from = Some(from);
                file.renamed_to = Some(to);
            }
        }

        file
    }

    /// Last commit renamed another path into this one.
    pub fn is_renamed_into(&self) -> bool {
        self.is_rename_in_commit && self.renamed_to.as_deref() == Some(self.path.as_path())
    }

    /// Last commit moved this path away.
    pub fn is_renamed_away(&self) -> bool {
        self.is_rename_in_commit && self.renamed_from.as_deref() == Some(self.path.as_path())
    }

    /// The path existed in history and its last commit removed it.
    pub fn was_removed(&self) -> bool {
        self.has_history && (self.is_delete_in_commit || self.is_renamed_away())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedFile {
    #[serde(flatten)]
    pub file: RepoFile,
    pub language_tag: String,
    pub language_name: String,
}

impl LocalizedFile {
    pub fn new(file: RepoFile, tag: &LanguageTag) -> Self {
        Self {
            file,
            language_tag: tag.tag().to_string(),
            language_name: tag.name(),
        }
    }
}

/// Line diff between two revisions of a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub diff_text: String,
    pub additions: usize,
    pub deletions: usize,
    pub total_changes: usize,
}

impl Patch {
    pub fn new(diff_text: String, additions: usize, deletions: usize) -> Self {
        Self {
            diff_text,
            additions,
            deletions,
            total_changes: additions + deletions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum Status {
    #[serde(rename = "To Create", rename_all = "camelCase")]
    ToCreate { missing_lines: usize },
    #[serde(rename = "To Initialize", rename_all = "camelCase")]
    ToInitialize { missing_lines: usize },
    #[serde(rename = "To Update", rename_all = "camelCase")]
    ToUpdate {
        base_source: RepoFile,
        /// `None` when the revisions couldn't be compared.
        patch: Option<Patch>,
        to_rename: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        not_comparable: Option<String>,
    },
    #[serde(rename = "Up-To-Date", rename_all = "camelCase")]
    UpToDate { to_rename: bool },
    #[serde(rename = "Orphan", rename_all = "camelCase")]
    Orphan { deleted: bool, surplus_lines: usize },
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::ToCreate { .. } => "To Create",
            Status::ToInitialize { .. } => "To Initialize",
            Status::ToUpdate { .. } => "To Update",
            Status::UpToDate { .. } => "Up-To-Date",
            Status::Orphan { .. } => "Orphan",
        }
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One localized file checked against its source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Track {
    pub localized: LocalizedFile,
    pub source: RepoFile,
    #[serde(flatten)]
    pub status: Status,
}

impl Track {
    pub fn new(localized: LocalizedFile, source: RepoFile, status: Status) -> Self {
        Self {
            localized,
            source,
            status,
        }
    }
}

/// Every track of a run, in pairing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub tracks: Vec<Track>,
}

impl Report {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// `path:status` tokens joined by commas.
    pub fn summary(&self) -> String {
        self.tracks
            .iter()
            .map(|track| {
                format!(
                    "{}:{}",
                    track.localized.file.path.display(),
                    track.status.label()
                )
            })
            .join(",")
    }

    /// Number of tracks per status label.
    pub fn counts(&self) -> Vec<(&'static str, usize)> {
        self.tracks
            .iter()
            .map(|track| track.status.label())
            .counts()
            .into_iter()
            .sorted_by_key(|(label, _)| STATUS_ORDER.iter().position(|l| l == label))
            .collect()
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Res<()> {
        serde_json::to_writer(writer, &self.tracks).map_err(Error::Serialize)
    }
}

const STATUS_ORDER: [&str; 5] = [
    "To Create",
    "To Initialize",
    "To Update",
    "Up-To-Date",
    "Orphan",
];
