use crate::config::{PatchConfig, SimilarityConfig};
use git2::{DiffFindOptions, DiffOptions};

pub(crate) fn commit_diff(similarity: &SimilarityConfig) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.ignore_filemode(true);
    opts.skip_binary_check(true);
    if similarity.copies_harder {
        opts.include_unmodified(true);
    }
    opts
}

pub(crate) fn find_similar(similarity: &SimilarityConfig) -> DiffFindOptions {
    let mut opts = DiffFindOptions::new();
    opts.renames(true);
    opts.copies(true);
    opts.rename_threshold(similarity.rename_threshold);
    opts.copy_threshold(similarity.copy_threshold);
    opts.copies_from_unmodified(similarity.copies_harder);
    opts
}

pub(crate) fn patch(config: &PatchConfig) -> DiffOptions {
    let mut opts = DiffOptions::new();
    opts.context_lines(config.context_lines);
    opts
}
