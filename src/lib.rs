pub mod classify;
pub mod cli;
pub mod config;
pub mod delta;
pub mod discover;
pub mod error;
mod git2_opts;
mod header;
pub mod history;
pub mod lang;
pub mod track;

use config::Context;
use error::Error;
use git2::Repository;
use history::{FirstParentChain, GitHistory};
use itertools::Itertools;
use rayon::prelude::*;
use std::sync::Arc;
use track::Report;

pub const APP_NAME: &str = "transtrack";

pub type Res<T> = Result<T, Error>;

/// Discovers, pairs and classifies every localized file of `ctx`.
pub fn run(ctx: &Context) -> Res<Report> {
    log::debug!("Discovering files");
    let files = discover::discover(ctx)?;

    log::debug!("Opening repo {:?}", ctx.repo_root);
    let repo = Repository::open(&ctx.repo_root).map_err(Error::OpenRepo)?;
    let chain = Arc::new(FirstParentChain::load(&repo)?);

    let history = GitHistory::new(repo, Arc::clone(&chain), ctx.similarity);
    let pairs = classify::pair_files(ctx, &files, &history)?;
    drop(history);

    log::debug!("Classifying {} pairs on {} jobs", pairs.len(), ctx.jobs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(ctx.jobs)
        .build()
        .map_err(Error::ThreadPool)?;

    let tracks = pool.install(|| {
        pairs
            .par_iter()
            .map_init(
                || GitHistory::open(&ctx.repo_root, Arc::clone(&chain), ctx.similarity),
                |history, pair| {
                    let history = history.as_ref().map_err(|e| {
                        Error::OpenRepo(git2::Error::new(e.code(), e.class(), e.message()))
                    })?;
                    classify::classify_pair(ctx, history, pair)
                },
            )
            .collect::<Res<Vec<_>>>()
    })?;

    let report = Report::new(tracks);
    log::info!(
        "{} tracks: {}",
        report.tracks.len(),
        report
            .counts()
            .iter()
            .map(|(status, count)| format!("{} {}", count, status))
            .join(", ")
    );

    Ok(report)
}
