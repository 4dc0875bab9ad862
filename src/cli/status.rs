//! Status command implementation

use colored::Colorize;

use crate::cli::GlobalOptions;
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionStore;

fn configured(label: &str, value: Option<&str>, hint: &str) {
    match value {
        Some(v) if !v.trim().is_empty() => println!("{} {}", "✓".green(), label),
        _ => println!("{} {} {}", "○".dimmed(), label, hint.dimmed()),
    }
}

/// Run the status command to display configuration status
pub fn run(opts: &GlobalOptions) -> Result<()> {
    println!("{}\n", "migval Configuration Status".bold());

    let config_path = Config::resolve_path(opts.config_ref())?;

    let config = match Config::load_from(&config_path) {
        Ok(config) => {
            println!("Config file: {}", config_path.display().to_string().cyan());
            config
        }
        Err(_) => {
            println!("{} Configuration not found", "✗".red());
            println!(
                "  → Run {} or pass credentials as flags",
                "migval init".cyan()
            );
            Config::default()
        }
    };
    println!();

    let github = &config.github;
    println!("{}", "GitHub".bold());
    configured(
        "Source token configured",
        github.source_token.as_deref(),
        "(not set; use --source-token or GH_SOURCE_PAT)",
    );
    configured(
        "Target token configured",
        github.target_token.as_deref(),
        "(not set; use --target-token or GH_PAT)",
    );
    if let Some(url) = &github.source_api_url {
        println!("{} Source API: {}", "○".dimmed(), url.cyan());
    }
    if let Some(url) = &github.target_api_url {
        println!("{} Target API: {}", "○".dimmed(), url.cyan());
    }
    println!();

    let bbs = &config.bitbucket;
    println!("{}", "Bitbucket Server".bold());
    match &bbs.url {
        Some(url) => println!("{} Server: {}", "✓".green(), url.cyan()),
        None => println!("{} Server {}", "○".dimmed(), "(not set; use --bbs-url)".dimmed()),
    }
    if bbs.token.is_some() {
        println!("{} Access token configured", "✓".green());
    } else if bbs.username.is_some() && bbs.password.is_some() {
        println!("{} Username and password configured", "✓".green());
    } else {
        println!("{} No Bitbucket credentials", "○".dimmed());
    }
    println!();

    let prefs = &config.preferences;
    println!("{}", "Preferences".bold());
    println!("  Rate limit warning threshold: {}", prefs.rate_limit_threshold);
    println!("  Max retries: {}", prefs.max_retries);
    println!("  Request timeout: {}s", prefs.request_timeout_secs);
    println!();

    match SessionStore::open(opts.session_dir_ref()) {
        Ok(store) => {
            let count = store.list().map(|s| s.len()).unwrap_or(0);
            println!(
                "Saved sessions: {} ({})",
                count,
                store.path().display().to_string().dimmed()
            );
        }
        Err(e) => println!("{} Session store unavailable: {}", "⚠".yellow(), e),
    }

    Ok(())
}
