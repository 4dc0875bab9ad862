//! CLI command definitions and handlers

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
pub use clap_complete::Shell;

pub mod args;
pub mod bitbucket;
pub mod completion;
pub mod context;
pub mod init;
pub mod pipeline;
pub mod session;
pub mod status;
pub mod validate;

pub use args::{GlobalOptions, OutputFormat, ValidationArgs};
pub use context::CommandContext;

/// Exit status when `--strict-exit` is set and a metric failed
pub const STRICT_FAILURE_EXIT_CODE: i32 = 3;

/// migval - verify that a repository migration to GitHub lost nothing
#[derive(Parser, Debug)]
#[command(name = "migval")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (pretty, table, json, markdown, csv)
    #[arg(
        long,
        global = true,
        env = "MIGVAL_FORMAT",
        default_value = "pretty",
        hide_env = true,
        hide_possible_values = true
    )]
    pub format: OutputFormat,

    /// Override config file location
    #[arg(long, global = true, env = "MIGVAL_CONFIG", hide_env = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true, env = "MIGVAL_DEBUG", hide_env = true)]
    pub debug: bool,

    /// Override the saved session directory
    #[arg(long, global = true, env = "MIGVAL_SESSION_DIR", hide_env = true)]
    pub session_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare a GitHub source repository with its migrated GitHub target
    Validate(ValidateArgs),

    /// Compare a Bitbucket Server repository with its migrated GitHub target
    Bitbucket(BitbucketArgs),

    /// Inspect saved validation reports
    #[command(subcommand)]
    Session(SessionCommands),

    /// Initialize migval configuration
    Init,

    /// Show credential and configuration status
    Status,

    /// Display version information
    Version,

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  bash:   migval completion bash > /etc/bash_completion.d/migval
  zsh:    migval completion zsh > \"${fpath[1]}/_migval\"
  fish:   migval completion fish > ~/.config/fish/completions/migval.fish")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// GitHub to GitHub validation
#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Source organization or user
    #[arg(long)]
    pub source_org: String,

    /// Source repository name
    #[arg(long)]
    pub source_repo: String,

    /// Target organization or user
    #[arg(long)]
    pub target_org: String,

    /// Target repository name
    #[arg(long)]
    pub target_repo: String,

    /// Source token (falls back to config)
    #[arg(long, env = "GH_SOURCE_PAT", hide_env_values = true)]
    pub source_token: Option<String>,

    /// Target token (falls back to config)
    #[arg(long, env = "GH_PAT", hide_env_values = true)]
    pub target_token: Option<String>,

    /// Source REST API URL, e.g. https://ghes.example.com/api/v3
    #[arg(long)]
    pub source_api_url: Option<String>,

    /// Target REST API URL
    #[arg(long)]
    pub target_api_url: Option<String>,

    /// Also compare Git LFS object counts
    #[arg(long)]
    pub include_lfs: bool,

    #[command(flatten)]
    pub common: ValidationArgs,
}

/// Bitbucket Server to GitHub validation
#[derive(Debug, Clone, Args)]
pub struct BitbucketArgs {
    /// Bitbucket Server base URL (falls back to config)
    #[arg(long, env = "BBS_SERVER_URL", hide_env = true)]
    pub bbs_url: Option<String>,

    /// Bitbucket project key
    #[arg(long)]
    pub bbs_project: String,

    /// Bitbucket repository slug
    #[arg(long)]
    pub bbs_repo: String,

    /// Bitbucket HTTP access token
    #[arg(long, env = "BBS_TOKEN", hide_env_values = true, conflicts_with = "bbs_username")]
    pub bbs_token: Option<String>,

    /// Bitbucket username for basic auth
    #[arg(long, env = "BBS_USERNAME", hide_env = true, requires = "bbs_password")]
    pub bbs_username: Option<String>,

    /// Bitbucket password for basic auth
    #[arg(long, env = "BBS_PASSWORD", hide_env_values = true)]
    pub bbs_password: Option<String>,

    /// Target organization or user
    #[arg(long)]
    pub target_org: String,

    /// Target repository name
    #[arg(long)]
    pub target_repo: String,

    /// Target token (falls back to config)
    #[arg(long, env = "GH_PAT", hide_env_values = true)]
    pub target_token: Option<String>,

    /// Target REST API URL
    #[arg(long)]
    pub target_api_url: Option<String>,

    /// Fail instead of inform when branch permission counts differ
    #[arg(long)]
    pub branch_permissions_hard_fail: bool,

    #[command(flatten)]
    pub common: ValidationArgs,
}

/// Saved session subcommands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// List saved sessions, newest first
    List,

    /// Show a saved report
    Show {
        /// Session id or unique prefix
        id: String,
    },

    /// Delete a saved session
    Delete {
        /// Session id or unique prefix
        id: String,
    },

    /// Delete every saved session
    Clear {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Print the session database location
    Path,
}
