use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = crate::APP_NAME, version)]
#[command(about = "Report which localized files need to be created, initialized or updated")]
pub struct Args {
    /// Source files path (directory or single file), relative to the repository
    pub source: PathBuf,
    /// Localized files path per language, as LANGTAG:PATH
    #[arg(required = true, value_parser = parse_localized_root, value_name = "LANGTAG:PATH")]
    pub localized: Vec<(String, PathBuf)>,
    /// Repository root
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,
    /// Glob pattern selecting files to track (repeatable)
    #[arg(short = 'f', long = "include", value_name = "GLOB")]
    pub include: Vec<String>,
    /// Glob pattern of files to ignore (repeatable)
    #[arg(short = 'i', long = "exclude", value_name = "GLOB")]
    pub exclude: Vec<String>,
    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Format::Json)]
    pub format: Format,
    /// Worker threads, 0 for one per CPU
    #[arg(short, long)]
    pub jobs: Option<usize>,
    /// Configuration file to use instead of the user one
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[arg(short = 'l', long, default_value = "info")]
    pub log_level: log::LevelFilter,
    /// Log to a file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Every track as a JSON array
    Json,
    /// Comma-separated `path:status` tokens
    Summary,
}

fn parse_localized_root(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once(':') {
        Some((tag, path)) if !tag.is_empty() && !path.is_empty() => {
            Ok((tag.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("{} is not LANGTAG:PATH", value)),
    }
}
