//! `validate` command: GitHub source to GitHub target

use std::sync::Arc;

use log::info;

use crate::cli::pipeline::{self, Side};
use crate::cli::{CommandContext, GlobalOptions, ValidateArgs};
use crate::error::Result;
use crate::validate::{ComparisonOptions, RepositoryIdentity};

/// Comparison options for a GitHub-to-GitHub run.
pub fn comparison_options(args: &ValidateArgs) -> ComparisonOptions {
    ComparisonOptions {
        skip_lfs: !args.include_lfs,
        skip_migration_log_offset: args.common.skip_migration_log_offset,
        ..Default::default()
    }
}

/// Run the validate command. Returns the process exit code.
pub async fn run(opts: &GlobalOptions, args: &ValidateArgs) -> Result<i32> {
    let ctx = CommandContext::new(opts)?;

    let source = ctx.source_github(args.source_token.as_deref(), args.source_api_url.as_deref())?;
    let target = ctx.target_github(args.target_token.as_deref(), args.target_api_url.as_deref())?;
    info!("Source API {}, target API {}", source.api_url(), target.api_url());

    pipeline::run(
        &ctx,
        Side::new(
            Arc::new(source),
            RepositoryIdentity::new(&args.source_org, &args.source_repo),
        ),
        Side::new(
            Arc::new(target),
            RepositoryIdentity::new(&args.target_org, &args.target_repo),
        ),
        comparison_options(args),
        &args.common,
    )
    .await
}
