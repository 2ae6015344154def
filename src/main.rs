use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use ticketpad::cli::commands::Cli;
use ticketpad::cli::handlers;

/// Log to stderr so stdout stays clean for --json consumers.
fn init_tracing(dev: bool) {
    let filter = EnvFilter::try_from_env("TICKETPAD_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if dev { "ticketpad=debug" } else { "ticketpad=warn" })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.dev);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
