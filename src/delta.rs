//! Base revision lookup and the patch a translator has to apply.

use crate::{
    Res,
    config::Context,
    error::NotComparable,
    git2_opts,
    history::{self, History},
    track::{CommitId, LocalizedFile, Patch, RepoFile},
};
use std::{fs, path::Path};

/// What changed in a source file since its localized copy was last touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    /// The source as of the commit the localized content was based on.
    pub base_source: RepoFile,
    pub patch: Result<Patch, NotComparable>,
    pub to_rename: bool,
    /// Base and current source content are the same.
    pub identical: bool,
}

/// Resolves the base revision of `source` for `localized` and diffs it
/// against the current source. `renamed` marks a pair matched through a
/// source rename.
pub fn resolve_update<H: History + ?Sized>(
    ctx: &Context,
    history: &H,
    source: &RepoFile,
    localized: &LocalizedFile,
    renamed: bool,
) -> Res<Update> {
    let anchor = match localized.file.last_commit {
        Some(commit) => history.anchor_of(&commit)?,
        None => None,
    };

    let (base_source, base) = match anchor {
        Some(anchor) => {
            let records = history::lineage(history, &source.path, Some(&anchor))?;
            let path = records
                .last()
                .map(|record| record.path.clone())
                .unwrap_or_else(|| source.path.clone());
            let base_source = history.history_at(&path, &anchor)?;
            let base = history
                .read_blob(&path, &anchor)
                .map(Option::unwrap_or_default)
                .map_err(|e| NotComparable {
                    path: path.clone(),
                    commit: Some(anchor.to_string()),
                    reason: e.message().to_string(),
                });
            (base_source, base)
        }
        None => (RepoFile::untracked(&source.path), Ok(vec![])),
    };

    let to_rename = renamed || (base_source.has_history && base_source.path != source.path);
    log::debug!(
        "{:?}: base {:?} at {:?}",
        localized.file.path,
        base_source.path,
        base_source.last_commit
    );

    let current = current_content(ctx, history, source);
    let (patch, identical) = match (base, current) {
        (Ok(base), Ok(current)) => {
            let identical = anchor.is_some() && base == current;
            (diff(ctx, &base_source.path, &base, &source.path, &current), identical)
        }
        (Err(e), _) | (_, Err(e)) => (Err(e), false),
    };

    Ok(Update {
        base_source,
        patch,
        to_rename,
        identical,
    })
}

/// Source content at its last commit, or from disk when never committed.
fn current_content<H: History + ?Sized>(
    ctx: &Context,
    history: &H,
    source: &RepoFile,
) -> Result<Vec<u8>, NotComparable> {
    if let Some(commit) = source.last_commit {
        match history.read_blob(&source.path, &commit) {
            Ok(Some(content)) => return Ok(content),
            Ok(None) => {}
            Err(e) => return Err(not_comparable(&source.path, Some(commit), e.message())),
        }
    }

    fs::read(ctx.abs(&source.path))
        .map_err(|e| not_comparable(&source.path, None, &e.to_string()))
}

fn diff(
    ctx: &Context,
    old_path: &Path,
    old: &[u8],
    new_path: &Path,
    new: &[u8],
) -> Result<Patch, NotComparable> {
    let fail = |e: git2::Error| not_comparable(new_path, None, e.message());

    let mut patch = git2::Patch::from_buffers(
        old,
        Some(old_path),
        new,
        Some(new_path),
        Some(&mut git2_opts::patch(&ctx.patch)),
    )
    .map_err(fail)?;

    let (_, additions, deletions) = patch.line_stats().map_err(fail)?;
    let text = patch.to_buf().map_err(fail)?;

    Ok(Patch::new(
        String::from_utf8_lossy(&text).into_owned(),
        additions,
        deletions,
    ))
}

fn not_comparable(path: &Path, commit: Option<CommitId>, reason: &str) -> NotComparable {
    NotComparable {
        path: path.to_path_buf(),
        commit: commit.map(|c| c.to_string()),
        reason: reason.to_string(),
    }
}
