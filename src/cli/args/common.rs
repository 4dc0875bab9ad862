//! Common CLI types shared across commands

use std::path::PathBuf;

use clap::Args;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty format - colored header, result table and summary (global default)
    #[default]
    Pretty,
    /// Table format - result rows only
    Table,
    /// JSON format - structured for scripts/APIs
    Json,
    /// Markdown format - GitHub table for issues and PR comments
    Markdown,
    /// CSV format - one row per metric
    Csv,
}

/// Flags shared by every validation command
#[derive(Debug, Clone, Args, Default)]
pub struct ValidationArgs {
    /// Migration archive to cross-check (directory or .tar.gz)
    #[arg(long, value_name = "PATH")]
    pub archive: Option<PathBuf>,

    /// Do not expect the extra migration log issue on the target
    #[arg(long)]
    pub skip_migration_log_offset: bool,

    /// Warn when fewer API requests remain than this (0 disables)
    #[arg(long, value_name = "N")]
    pub rate_limit_threshold: Option<u64>,

    /// Exit with status 3 when any metric fails
    #[arg(long)]
    pub strict_exit: bool,

    /// Store the report for later `migval session show`
    #[arg(long)]
    pub save_session: bool,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}
