//! migval - validate repository migrations into GitHub

use clap::Parser;

mod cli;
mod client;
mod config;
mod error;
mod models;
mod output;
mod session;
mod validate;

use cli::{Cli, Commands, GlobalOptions};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

/// `--debug` raises the default filter; `RUST_LOG` still wins when set.
fn init_logging(debug: bool) {
    let default_filter = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let opts = GlobalOptions::from_cli(&cli);

    match cli.command {
        Commands::Validate(args) => cli::validate::run(&opts, &args).await,
        Commands::Bitbucket(args) => cli::bitbucket::run(&opts, &args).await,
        Commands::Session(command) => cli::session::run(&opts, &command).map(|_| 0),
        Commands::Init => cli::init::run(&opts).map(|_| 0),
        Commands::Status => cli::status::run(&opts).map(|_| 0),
        Commands::Version => {
            println!("migval version {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Completion { shell } => {
            cli::completion::run(shell);
            Ok(0)
        }
    }
}
