//! HomeDeck - button panel configuration checker and renderer
//!
//! Validates panel configuration files, lists how pages split across the
//! keys, and renders pages to PNG files.

use clap::{Parser, Subcommand};
use homedeck::cli::{ExitCode, PagesArgs, RenderArgs, ValidateArgs};
use homedeck::constants::APP_NAME;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// HomeDeck - button panel configuration checker and renderer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a configuration file
    Validate(ValidateArgs),
    /// List the keys of every page and sub-page
    Pages(PagesArgs),
    /// Render a page to PNG files
    Render(RenderArgs),
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let result = match &cli.command {
        Command::Validate(args) => args.execute(),
        Command::Pages(args) => args.execute(),
        Command::Render(args) => args.execute(),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        std::process::exit(err.code as i32);
    }
    std::process::exit(ExitCode::Success as i32);
}
