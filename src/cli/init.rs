//! Init command implementation

use colored::Colorize;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};

use crate::cli::GlobalOptions;
use crate::config::Config;
use crate::error::Result;

/// Prompt for a secret; blank keeps the current value.
fn secret(theme: &ColorfulTheme, prompt: &str, current: Option<String>) -> Result<Option<String>> {
    let prompt = if current.is_some() {
        format!("{} (leave blank to keep current)", prompt)
    } else {
        prompt.to_string()
    };
    let value: String = Password::with_theme(theme)
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?;

    Ok(if value.trim().is_empty() {
        current
    } else {
        Some(value.trim().to_string())
    })
}

/// Prompt for an optional URL; blank clears it.
fn optional_url(theme: &ColorfulTheme, prompt: &str, current: Option<String>) -> Result<Option<String>> {
    let value: String = Input::with_theme(theme)
        .with_prompt(prompt)
        .with_initial_text(current.unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

/// Run the init command
pub fn run(opts: &GlobalOptions) -> Result<()> {
    let theme = ColorfulTheme::default();
    let path = Config::resolve_path(opts.config_ref())?;
    let mut config = Config::load_or_default(&path)?;

    println!("{}", "Welcome to migval!".bold().green());
    println!("Let's store the credentials used to validate migrations.\n");

    println!("{}", "Target (GitHub)".bold());
    config.github.target_token = secret(&theme, "Target GitHub token", config.github.target_token.take())?;
    config.github.target_api_url = optional_url(
        &theme,
        "Target API URL (blank for github.com)",
        config.github.target_api_url.take(),
    )?;

    let github_source = Confirm::with_theme(&theme)
        .with_prompt("Validate migrations from GitHub or GitHub Enterprise Server?")
        .default(true)
        .interact()?;
    if github_source {
        println!("\n{}", "Source (GitHub)".bold());
        config.github.source_token =
            secret(&theme, "Source GitHub token", config.github.source_token.take())?;
        config.github.source_api_url = optional_url(
            &theme,
            "Source API URL (blank for github.com)",
            config.github.source_api_url.take(),
        )?;
    }

    let bitbucket_source = Confirm::with_theme(&theme)
        .with_prompt("Validate migrations from Bitbucket Server?")
        .default(config.bitbucket.url.is_some())
        .interact()?;
    if bitbucket_source {
        println!("\n{}", "Source (Bitbucket Server)".bold());
        config.bitbucket.url = optional_url(
            &theme,
            "Bitbucket Server URL",
            config.bitbucket.url.take(),
        )?;

        let methods = ["HTTP access token", "Username and password"];
        let method = Select::with_theme(&theme)
            .with_prompt("Authentication method")
            .items(&methods[..])
            .default(0)
            .interact()?;

        if method == 0 {
            config.bitbucket.token = secret(&theme, "Access token", config.bitbucket.token.take())?;
            config.bitbucket.username = None;
            config.bitbucket.password = None;
        } else {
            let username: String = Input::with_theme(&theme)
                .with_prompt("Username")
                .with_initial_text(config.bitbucket.username.take().unwrap_or_default())
                .interact_text()?;
            config.bitbucket.username = Some(username.trim().to_string());
            config.bitbucket.password = secret(&theme, "Password", config.bitbucket.password.take())?;
            config.bitbucket.token = None;
        }
    }

    config.save_to(&path)?;

    println!("\n{} Configuration saved to: {}", "✓".green(), path.display());
    println!("\n{}", "You're all set! Try running:".bold());
    println!("  {} - Show configuration status", "migval status".cyan());
    println!(
        "  {} - Compare two GitHub repositories",
        "migval validate --source-org A --source-repo R --target-org B --target-repo R".cyan()
    );

    Ok(())
}
