use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

/// File name of the value document when none is given.
pub const DEFAULT_VALUE_FILE_NAME: &str = "Web.config";

/// Merge a marked config file into the live config file next to it
#[derive(Parser, Debug)]
#[command(name = "cmerge")]
#[command(version)]
#[command(
    about = "Merge a marked config file into the live config file next to it",
    long_about = None
)]
pub struct Cli {
    /// Marked file (the structure to keep, with <?merge ...?> directives)
    pub mark_file: PathBuf,

    /// Name of the value file, looked up in the marked file's directory
    #[arg(long, default_value = DEFAULT_VALUE_FILE_NAME)]
    pub value_file_name: String,

    /// Write the result here instead of replacing the value file
    #[arg(short, long, conflicts_with = "dry_run")]
    pub output: Option<PathBuf>,

    /// Print the result to stdout and leave every file alone
    #[arg(long)]
    pub dry_run: bool,

    /// Replace the value file without keeping a timestamped copy
    #[arg(long)]
    pub no_backup: bool,

    /// Re-indent the result instead of keeping the marked file's layout
    #[arg(long)]
    pub pretty: bool,

    /// Print one line per directive to stderr
    #[arg(long)]
    pub report: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Returns the most detailed level the log subscriber should emit.
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}
