//! Validation run shared by the `validate` and `bitbucket` commands

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use crate::cli::{CommandContext, OutputFormat, STRICT_FAILURE_EXIT_CODE, ValidationArgs};
use crate::client::MetricProvider;
use crate::error::Result;
use crate::output;
use crate::validate::{
    ComparisonOptions, RepositoryIdentity, RetrievalOptions, ValidationReport, check_rate_limits,
    compare, load_archive, retrieve_pair, validate_access_pair,
};

/// One side of a validation run
pub struct Side {
    pub provider: Arc<dyn MetricProvider>,
    pub identity: RepositoryIdentity,
}

impl Side {
    pub fn new(provider: Arc<dyn MetricProvider>, identity: RepositoryIdentity) -> Self {
        Self { provider, identity }
    }
}

/// Spinner for pretty output; hidden for machine-readable formats.
fn spinner(format: OutputFormat) -> ProgressBar {
    if format != OutputFormat::Pretty {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Retrieve, compare and report. Returns the process exit code.
pub async fn run(
    ctx: &CommandContext,
    source: Side,
    target: Side,
    options: ComparisonOptions,
    args: &ValidationArgs,
) -> Result<i32> {
    let progress = spinner(ctx.format);

    progress.set_message("Checking repository access...");
    validate_access_pair(
        source.provider.as_ref(),
        &source.identity,
        target.provider.as_ref(),
        &target.identity,
    )
    .await?;

    let threshold = ctx.rate_limit_threshold(args.rate_limit_threshold);
    let mut warnings = check_rate_limits(
        &[
            ("source", source.provider.as_ref()),
            ("target", target.provider.as_ref()),
        ],
        threshold,
    )
    .await;

    progress.set_message(format!(
        "Collecting metrics for {} and {}...",
        source.identity, target.identity
    ));
    let result = retrieve_pair(
        Arc::clone(&source.provider),
        source.identity.clone(),
        Arc::clone(&target.provider),
        target.identity.clone(),
        RetrievalOptions::from(&options),
    )
    .await;
    progress.finish_and_clear();
    let (source_outcome, target_outcome) = result?;

    let mut source_snapshot = source_outcome.snapshot;
    if let Some(path) = &args.archive {
        info!("Analyzing migration archive {}", path.display());
        source_snapshot = source_snapshot.with_archive(load_archive(path)?);
    }

    warnings.extend(source_outcome.errors.iter().map(|e| format!("source {}", e)));
    warnings.extend(target_outcome.errors.iter().map(|e| format!("target {}", e)));

    let results = compare(&source_snapshot, &target_outcome.snapshot, &options);
    let report = ValidationReport::new(
        source.identity,
        target.identity,
        options,
        results,
        warnings,
    );

    output::emit(&report, ctx.format, args.output.as_deref())?;

    if args.save_session {
        let id = ctx.sessions()?.save(&report)?;
        if ctx.format == OutputFormat::Pretty {
            println!("\n{} Session saved: {}", "✓".green(), id.bold());
        } else {
            eprintln!("Session saved: {}", id);
        }
    }

    if args.strict_exit && report.has_failures() {
        Ok(STRICT_FAILURE_EXIT_CODE)
    } else {
        Ok(0)
    }
}
