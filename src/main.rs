mod cli;
mod commands;
mod http;
mod model;
mod sheet;
mod util;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Citations(args) => commands::citations::run(args),
        Commands::CleanCitations(args) => commands::clean_citations::run(args),
        Commands::CheckUrls(args) => commands::check_urls::run(args),
        Commands::AssignIds(args) => commands::assign_ids::run(args),
        Commands::Scrub(args) => commands::scrub::run(args),
        Commands::ExecutiveOrders(args) => commands::executive_orders::run(args),
        Commands::Recommend(args) => commands::recommend::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
