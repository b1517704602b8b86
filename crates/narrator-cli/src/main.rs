//! CLI entry point - the composition root.
//!
//! Settings and adapters are wired in [`bootstrap`]; each subcommand is
//! routed to its handler with the resulting context.

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use narrator_cli::{Cli, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() {
    // Load environment variables before parsing so NARRATOR_* from .env apply
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(CliError::exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = bootstrap(&cli)?;

    let Some(command) = cli.command else {
        // No command provided - show help
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Read { chapter, start } => {
            handlers::read::execute(&ctx, &chapter, start).await?;
        }
        Commands::Sample { text } => {
            handlers::sample::execute(&ctx, &text).await?;
        }
        Commands::Voices { language } => {
            handlers::voices::execute(&ctx, language.as_deref()).await?;
        }
        Commands::Classify { text } => {
            handlers::classify::execute(&ctx, &text)?;
        }
    }

    Ok(())
}
