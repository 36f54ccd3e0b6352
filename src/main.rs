//! Tagbench - A benchmark harness for tag-indexed caches
//!
//! Entry point of the `tagbench` command.

use std::env;

use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tagbench::cli::{Cli, Command};
use tagbench::{commands, connect, Config, InitParams};

/// Main entry point for the benchmark harness.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging (stderr)
/// 2. Parse the command line; print help when no command is given
/// 3. Load configuration from environment variables
/// 4. Connect to the cache under test if the command needs one
/// 5. Run the command; any error aborts with a non-zero exit status
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, can be overridden with RUST_LOG.
    // Logs go to stderr so stdout carries only reports.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagbench=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::from_env();
    debug!("Configuration loaded: {:?}", config);

    match command {
        Command::Init(args) => {
            let command_line = env::args().collect::<Vec<_>>().join(" ");
            commands::init(&config, &InitParams::from(args), &command_line)?;
        }
        Command::Clean => {
            let cache = connect(&config)?;
            commands::clean(cache.as_ref()).await?;
        }
        Command::Load { name } => {
            let cache = connect(&config)?;
            commands::load(&config, cache.as_ref(), &name).await?;
        }
        Command::Tags { verbose } => {
            let cache = connect(&config)?;
            commands::tags(&config, cache.as_ref(), verbose).await?;
        }
        Command::Ops {
            name,
            client,
            quiet,
        } => {
            let cache = connect(&config)?;
            commands::ops(&config, cache.as_ref(), &name, client, quiet).await?;
        }
        Command::Report { name } => {
            commands::report(&config, &name)?;
        }
        Command::Bench { name, keep } => {
            let cache = connect(&config)?;
            commands::bench(&config, cache, &name, keep).await?;
        }
    }
    Ok(())
}
