//! Notekeep CLI - Command-line interface for a MongoDB notes collection.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use notekeep_cli::cli::{Cli, Command};
use notekeep_cli::commands::{self, Session};
use notekeep_cli::config::Settings;
use notekeep_cli::error::CliResult;
use notekeep_cli::{logging, output};

#[tokio::main]
async fn main() {
    logging::init();

    // Run the CLI and handle errors
    if let Err(e) = run().await {
        output::newline();
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli.global)?;

    // Ctrl-C cancels whatever store call is in flight
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let session = Session::new(settings, cancel);

    // Run the appropriate command
    match cli.command {
        Command::Demo => commands::demo::run(&session).await,
        Command::Add(args) => commands::add::run(&session, args).await,
        Command::List(args) => commands::list::run(&session, args).await,
        Command::Show(args) => commands::show::run(&session, args).await,
        Command::Edit(args) => commands::edit::run(&session, args).await,
        Command::Rm(args) => commands::rm::run(&session, args).await,
        Command::Count(args) => commands::count::run(&session, args).await,
    }
}
