//! gd - path-addressed drive client
//!
//! A command-line interface that lets a drive addressed by object ids be
//! used with plain slash paths.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gd_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
