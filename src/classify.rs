//! Pairing of source and localized files, and the status of each pair.

use crate::{
    Res,
    config::Context,
    delta,
    discover::FileSet,
    error::Error,
    header,
    history::{self, History},
    track::{LocalizedFile, Status, Track},
};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

/// A localized path and the source path it mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Index into `Context::localized_roots`.
    pub lang: usize,
    pub localized: PathBuf,
    pub source: PathBuf,
    /// `source` is a discovered source file. Otherwise the pair is an orphan.
    pub source_listed: bool,
    /// Matched through a rename of the source.
    pub renamed: bool,
}

/// Pairs every source with its mirror in each language, then every unclaimed
/// localized file with the source path it would mirror. Language-major, in
/// discovery order.
pub fn pair_files<H: History + ?Sized>(
    ctx: &Context,
    files: &FileSet,
    history: &H,
) -> Res<Vec<Pair>> {
    let sources = files.sources.iter().collect::<HashSet<_>>();
    let mut pairs = vec![];

    for (lang, localized_root) in ctx.localized_roots.iter().enumerate() {
        let root = &localized_root.root;
        let mut claimed = HashSet::new();

        for source in &files.sources {
            let Some(mirror) = move_root(source, &ctx.source_root, root) else {
                continue;
            };

            let renamed = if ctx.abs(&mirror).is_file() {
                None
            } else {
                renamed_mirror(ctx, history, source, root, &sources, &claimed)?
            };

            if let Some(previous) = renamed {
                log::debug!("{:?} pairs with renamed source {:?}", previous, source);
                claimed.insert(previous.clone());
                pairs.push(Pair {
                    lang,
                    localized: previous,
                    source: source.clone(),
                    source_listed: true,
                    renamed: true,
                });
                continue;
            }

            claimed.insert(mirror.clone());
            pairs.push(Pair {
                lang,
                localized: mirror,
                source: source.clone(),
                source_listed: true,
                renamed: false,
            });
        }

        let localized = files.localized.get(lang).map(Vec::as_slice).unwrap_or_default();
        for path in localized.iter().filter(|path| !claimed.contains(*path)) {
            let Some(source) = move_root(path, root, &ctx.source_root) else {
                continue;
            };

            pairs.push(Pair {
                lang,
                localized: path.clone(),
                source,
                source_listed: false,
                renamed: false,
            });
        }
    }

    log::debug!("Paired {} files", pairs.len());
    Ok(pairs)
}

/// Existing mirror of a path `source` was renamed from, when that path is no
/// longer a source itself.
fn renamed_mirror<H: History + ?Sized>(
    ctx: &Context,
    history: &H,
    source: &Path,
    root: &Path,
    sources: &HashSet<&PathBuf>,
    claimed: &HashSet<PathBuf>,
) -> Res<Option<PathBuf>> {
    for previous in history::previous_paths(history, source)? {
        if sources.contains(&previous) {
            continue;
        }
        let Some(mirror) = move_root(&previous, &ctx.source_root, root) else {
            continue;
        };
        if !claimed.contains(&mirror) && ctx.abs(&mirror).is_file() {
            return Ok(Some(mirror));
        }
    }

    Ok(None)
}

/// `path` with its `from` prefix replaced by `to`.
fn move_root(path: &Path, from: &Path, to: &Path) -> Option<PathBuf> {
    let rel = path.strip_prefix(from).ok()?;
    if rel.as_os_str().is_empty() {
        Some(to.to_path_buf())
    } else {
        Some(to.join(rel))
    }
}

pub fn classify_pair<H: History + ?Sized>(ctx: &Context, history: &H, pair: &Pair) -> Res<Track> {
    let tag = &ctx.localized_roots[pair.lang].tag;
    let source = history.history_of(&pair.source)?;
    let localized = LocalizedFile::new(history.history_of(&pair.localized)?, tag);

    let status = if !pair.source_listed {
        Status::Orphan {
            deleted: source.was_removed(),
            surplus_lines: count_lines(&read(ctx, &pair.localized)?),
        }
    } else if !ctx.abs(&pair.localized).is_file() {
        Status::ToCreate {
            missing_lines: count_lines(&read(ctx, &pair.source)?),
        }
    } else if header::has_marker(&read(ctx, &pair.localized)?, &ctx.marker) {
        Status::ToInitialize {
            missing_lines: count_lines(&read(ctx, &pair.source)?),
        }
    } else {
        let update = delta::resolve_update(ctx, history, &source, &localized, pair.renamed)?;
        if update.identical {
            Status::UpToDate {
                to_rename: update.to_rename,
            }
        } else {
            let (patch, not_comparable) = match update.patch {
                Ok(patch) => (Some(patch), None),
                Err(e) => {
                    log::warn!("{}", e);
                    (None, Some(e.to_string()))
                }
            };

            Status::ToUpdate {
                base_source: update.base_source,
                patch,
                to_rename: update.to_rename,
                not_comparable,
            }
        }
    };

    log::debug!("{:?}: {}", pair.localized, status);
    Ok(Track::new(localized, source, status))
}

fn read(ctx: &Context, path: &Path) -> Res<Vec<u8>> {
    fs::read(ctx.abs(path)).map_err(|e| Error::ReadFile(path.to_path_buf(), e))
}

/// Newline-terminated lines plus a trailing unterminated one.
pub(crate) fn count_lines(content: &[u8]) -> usize {
    let newlines = content.iter().filter(|&&b| b == b'\n').count();
    match content.last() {
        Some(b'\n') | None => newlines,
        Some(_) => newlines + 1,
    }
}
