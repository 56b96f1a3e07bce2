use std::{fmt::Display, io, path::PathBuf};

#[derive(Debug)]
pub enum Error {
    OpenRepo(git2::Error),
    ReadHistory(git2::Error),
    RootNotFound(PathBuf),
    SameRoots(PathBuf),
    NestedRoots(PathBuf, PathBuf),
    InvalidLanguageTag(String),
    InvalidGlob(globset::Error),
    Config(figment::Error),
    WalkFiles(walkdir::Error),
    ReadFile(PathBuf, io::Error),
    WriteOutput(io::Error),
    Serialize(serde_json::Error),
    OpenLogFile(io::Error),
    ThreadPool(rayon::ThreadPoolBuildError),
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OpenRepo(e) => match e.code() {
                git2::ErrorCode::NotFound => f.write_str("No git repository found at the given path"),
                _ => f.write_fmt(format_args!("Couldn't open repo: {}", e)),
            },
            Error::ReadHistory(e) => f.write_fmt(format_args!("Couldn't read history: {}", e)),
            Error::RootNotFound(path) => {
                f.write_fmt(format_args!("Path doesn't exist: {}", path.display()))
            }
            Error::SameRoots(path) => f.write_fmt(format_args!(
                "Source and localized paths are the same: {}",
                path.display()
            )),
            Error::NestedRoots(localized, source) => f.write_fmt(format_args!(
                "Localized path {} contains the source path {}",
                localized.display(),
                source.display()
            )),
            Error::InvalidLanguageTag(tag) => {
                f.write_fmt(format_args!("{} is not a valid RFC 5646 language tag", tag))
            }
            Error::InvalidGlob(e) => f.write_fmt(format_args!("Invalid glob pattern: {}", e)),
            Error::Config(e) => f.write_fmt(format_args!("Configuration error: {}", e)),
            Error::WalkFiles(e) => f.write_fmt(format_args!("Couldn't list files: {}", e)),
            Error::ReadFile(path, e) => {
                f.write_fmt(format_args!("Couldn't read {}: {}", path.display(), e))
            }
            Error::WriteOutput(e) => f.write_fmt(format_args!("Couldn't write output: {}", e)),
            Error::Serialize(e) => f.write_fmt(format_args!("Couldn't serialize tracks: {}", e)),
            Error::OpenLogFile(e) => f.write_fmt(format_args!("Couldn't open log file: {}", e)),
            Error::ThreadPool(e) => {
                f.write_fmt(format_args!("Couldn't start worker threads: {}", e))
            }
        }
    }
}

/// A pair whose base or current source content couldn't be read.
/// Kept inside its track; never aborts a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotComparable {
    pub path: PathBuf,
    pub commit: Option<String>,
    pub reason: String,
}

impl Display for NotComparable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.commit {
            Some(commit) => f.write_fmt(format_args!(
                "Couldn't compare {} at {}: {}",
                self.path.display(),
                commit,
                self.reason
            )),
            None => f.write_fmt(format_args!(
                "Couldn't compare {}: {}",
                self.path.display(),
                self.reason
            )),
        }
    }
}
