//! `bitbucket` command: Bitbucket Server source to GitHub target

use std::sync::Arc;

use crate::cli::pipeline::{self, Side};
use crate::cli::{BitbucketArgs, CommandContext, GlobalOptions};
use crate::error::Result;
use crate::validate::{ComparisonOptions, RepositoryIdentity};

/// Bitbucket has no issues, releases or LFS counts to compare, and branch
/// permissions do not map one-to-one onto GitHub protection rules.
pub fn comparison_options(args: &BitbucketArgs) -> ComparisonOptions {
    ComparisonOptions {
        skip_issues: true,
        skip_releases: true,
        skip_lfs: true,
        skip_migration_log_offset: args.common.skip_migration_log_offset,
        branch_permissions_advisory: !args.branch_permissions_hard_fail,
        source_label: "Bitbucket".to_string(),
    }
}

/// Run the bitbucket command. Returns the process exit code.
pub async fn run(opts: &GlobalOptions, args: &BitbucketArgs) -> Result<i32> {
    let ctx = CommandContext::new(opts)?;

    let source = ctx.bitbucket(args)?;
    let target = ctx.target_github(args.target_token.as_deref(), args.target_api_url.as_deref())?;

    pipeline::run(
        &ctx,
        Side::new(
            Arc::new(source),
            RepositoryIdentity::new(&args.bbs_project, &args.bbs_repo),
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
