//! Candidate source and localized files, filtered by the include and exclude
//! globs.

use crate::{Res, config::Context, error::Error};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Repo-relative candidate paths, in walk order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    pub sources: Vec<PathBuf>,
    /// One list per localized root, in `Context::localized_roots` order.
    pub localized: Vec<Vec<PathBuf>>,
}

/// A source root that is a single file. Its localized counterpart is the
/// localized root itself and no filters apply.
pub fn is_file_mode(ctx: &Context) -> bool {
    ctx.abs(&ctx.source_root).is_file()
}

pub fn discover(ctx: &Context) -> Res<FileSet> {
    let source_abs = ctx.abs(&ctx.source_root);
    if !source_abs.exists() {
        return Err(Error::RootNotFound(ctx.source_root.clone()));
    }

    if is_file_mode(ctx) {
        log::debug!("Source {:?} is a single file", ctx.source_root);
        let localized = ctx
            .localized_roots
            .iter()
            .map(|l| {
                if ctx.abs(&l.root).is_file() {
                    vec![l.root.clone()]
                } else {
                    vec![]
                }
            })
            .collect();

        return Ok(FileSet {
            sources: vec![ctx.source_root.clone()],
            localized,
        });
    }

    let filter = Filter::new(ctx)?;
    let roots = ctx
        .localized_roots
        .iter()
        .map(|l| l.root.clone())
        .chain([ctx.source_root.clone()])
        .collect::<Vec<_>>();

    let sources = walk(ctx, &ctx.source_root, &roots, &filter)?;
    let localized = ctx
        .localized_roots
        .iter()
        .map(|l| {
            if !ctx.abs(&l.root).is_dir() {
                return Err(Error::RootNotFound(l.root.clone()));
            }
            walk(ctx, &l.root, &roots, &filter)
        })
        .collect::<Res<Vec<_>>>()?;

    log::info!(
        "Found {} source files and {} localized files",
        sources.len(),
        localized.iter().map(Vec::len).sum::<usize>()
    );

    Ok(FileSet { sources, localized })
}

/// Regular files under `root`, skipping `.git` and every other configured
/// root nested inside it.
fn walk(ctx: &Context, root: &Path, roots: &[PathBuf], filter: &Filter) -> Res<Vec<PathBuf>> {
    let skipped = roots
        .iter()
        .filter(|other| other.as_path() != root && other.starts_with(root))
        .map(|other| ctx.abs(other))
        .collect::<Vec<_>>();

    let walker = WalkDir::new(ctx.abs(root))
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.file_name() != ".git" && !skipped.iter().any(|path| path == entry.path())
        });

    let mut files = vec![];
    for entry in walker {
        let entry = entry.map_err(Error::WalkFiles)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry
            .path()
            .strip_prefix(&ctx.repo_root)
            .unwrap_or(entry.path())
            .to_path_buf();
        if filter.accepts(&path, root) {
            files.push(path);
        }
    }

    log::debug!("{:?}: {} candidates", root, files.len());
    Ok(files)
}

/// Include and exclude globs over repo-relative paths.
struct Filter {
    include: GlobSet,
    /// Include patterns that name a hidden component.
    include_hidden: GlobSet,
    exclude: GlobSet,
}

impl Filter {
    fn new(ctx: &Context) -> Res<Self> {
        let hidden = ctx
            .include
            .iter()
            .filter(|glob| glob.split('/').any(|part| part.starts_with('.')))
            .cloned()
            .collect::<Vec<_>>();

        Ok(Self {
            include: globs(&ctx.include)?,
            include_hidden: globs(&hidden)?,
            exclude: globs(&ctx.exclude)?,
        })
    }

    /// `path` is repo-relative; only its components below `root` can hide it.
    fn accepts(&self, path: &Path, root: &Path) -> bool {
        if !self.include.is_match(path) {
            return false;
        }
        let below_root = path.strip_prefix(root).unwrap_or(path);
        if is_hidden(below_root) && !self.include_hidden.is_match(path) {
            return false;
        }

        // A matching directory excludes everything below it.
        !path
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| self.exclude.is_match(p))
    }
}

fn globs(patterns: &[String]) -> Res<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).map_err(Error::InvalidGlob)?);
    }
    builder.build().map_err(Error::InvalidGlob)
}

fn is_hidden(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
