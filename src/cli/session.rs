//! Session command implementations

use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::cli::{CommandContext, GlobalOptions, SessionCommands};
use crate::error::Result;
use crate::output;

/// Dispatch a session subcommand
pub fn run(opts: &GlobalOptions, command: &SessionCommands) -> Result<()> {
    let ctx = CommandContext::new(opts)?;
    let store = ctx.sessions()?;

    match command {
        SessionCommands::List => {
            let sessions = store.list()?;
            output::print(&sessions, ctx.format)
        }
        SessionCommands::Show { id } => {
            let session = store.load(id)?;
            output::print(&session.report, ctx.format)
        }
        SessionCommands::Delete { id } => {
            // Resolve prefixes to a full id first
            let session = store.load(id)?;
            store.delete(&session.id)?;
            println!("{} Deleted session: {}", "✓".green(), session.id);
            Ok(())
        }
        SessionCommands::Clear { yes } => {
            if !yes {
                let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("Delete every saved session?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let removed = store.clear()?;
            println!("{} Removed {} session(s)", "✓".green(), removed);
            Ok(())
        }
        SessionCommands::Path => {
            println!("{}", store.path().display());
            Ok(())
        }
    }
}
