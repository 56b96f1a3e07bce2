use crate::{APP_NAME, Res, cli::Args, error::Error, lang::LanguageTag};
use etcetera::BaseStrategy;
use figment::{
    Figment,
    providers::{Format, Toml},
};
use serde::Deserialize;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub jobs: usize,
    pub marker: MarkerConfig,
    pub similarity: SimilarityConfig,
    pub patch: PatchConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MarkerConfig {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SimilarityConfig {
    pub rename_threshold: u16,
    pub copy_threshold: u16,
    pub copies_harder: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct PatchConfig {
    pub context_lines: u32,
}

impl Default for Config {
    fn default() -> Self {
        Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            .extract()
            .expect("Failed to parse default_config.toml")
    }
}

/// Loads the embedded defaults, overridden by `path` or, when absent, the
/// user's `transtrack/config.toml`.
pub fn init_config(path: Option<&Path>) -> Res<Config> {
    let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

    match path {
        Some(path) => {
            if !path.is_file() {
                return Err(Error::RootNotFound(path.to_path_buf()));
            }
            log::debug!("Reading config {:?}", path);
            figment = figment.merge(Toml::file_exact(path));
        }
        None => {
            if let Ok(strategy) = etcetera::choose_base_strategy() {
                let path = strategy.config_dir().join(APP_NAME).join("config.toml");
                log::debug!("Reading config {:?} if present", path);
                figment = figment.merge(Toml::file_exact(path));
            }
        }
    }

    figment.extract().map_err(Error::Config)
}

/// A localized tree and the language it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedRoot {
    pub tag: LanguageTag,
    pub root: PathBuf,
}

/// Everything a run needs, validated once and shared read-only.
#[derive(Debug, Clone)]
pub struct Context {
    /// Absolute repository root.
    pub repo_root: PathBuf,
    /// Source root, relative to `repo_root`. Empty for the repository itself.
    pub source_root: PathBuf,
    pub localized_roots: Vec<LocalizedRoot>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub jobs: usize,
    pub marker: MarkerConfig,
    pub similarity: SimilarityConfig,
    pub patch: PatchConfig,
}

impl Context {
    pub fn new(
        repo_root: &Path,
        source_root: &Path,
        localized: &[(String, PathBuf)],
        config: Config,
    ) -> Res<Self> {
        let repo_root = fs::canonicalize(repo_root)
            .map_err(|_| Error::RootNotFound(repo_root.to_path_buf()))?;
        let source_root = relative_to(&repo_root, source_root)?;

        let localized_roots = localized
            .iter()
            .map(|(tag, root)| {
                let root = relative_to(&repo_root, root)?;
                if root == source_root {
                    return Err(Error::SameRoots(root));
                }
                if source_root.starts_with(&root) {
                    return Err(Error::NestedRoots(root, source_root.clone()));
                }

                Ok(LocalizedRoot {
                    tag: LanguageTag::parse(tag)?,
                    root,
                })
            })
            .collect::<Res<Vec<_>>>()?;

        Ok(Self {
            repo_root,
            source_root,
            localized_roots,
            include: config.include,
            exclude: config.exclude,
            jobs: config.jobs,
            marker: config.marker,
            similarity: config.similarity,
            patch: config.patch,
        })
    }

    /// Builds the context from parsed arguments, letting them override `config`.
    pub fn from_args(args: &Args, mut config: Config) -> Res<Self> {
        if !args.include.is_empty() {
            config.include = args.include.clone();
        }
        if !args.exclude.is_empty() {
            config.exclude = args.exclude.clone();
        }
        if let Some(jobs) = args.jobs {
            config.jobs = jobs;
        }

        Self::new(&args.repo, &args.source, &args.localized, config)
    }

    pub fn abs(&self, path: &Path) -> PathBuf {
        self.repo_root.join(path)
    }
}

/// `path` relative to the canonical `root`, without `.` components.
/// Absolute paths are resolved through symlinks first and must lie inside
/// `root`.
fn relative_to(root: &Path, path: &Path) -> Res<PathBuf> {
    let relative = if path.is_absolute() {
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        resolved
            .strip_prefix(root)
            .map_err(|_| Error::RootNotFound(path.to_path_buf()))?
            .to_path_buf()
    } else {
        path.to_path_buf()
    };

    Ok(relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}
