//! agon - command-line client for the AGON portal API.
//!
//! A thin wrapper over `agon-client`, handy for checking a deployment and
//! for keeping a hosted backend awake.

mod cli;
mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands};
use commands::{get, keep_alive, login, logout, ping, whoami};
use context::CliContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let mut ctx = CliContext::new(&cli.api_url, cli.command.route())?;

    let result = match cli.command {
        Commands::Login(args) => login::run(&ctx, args).await,
        Commands::Logout(args) => logout::run(&ctx, args),
        Commands::Whoami(args) => whoami::run(&ctx, args).await,
        Commands::Get(args) => get::run(&ctx, args).await,
        Commands::Ping(args) => ping::run(&ctx, args).await,
        Commands::KeepAlive(args) => keep_alive::run(&ctx, args).await,
    };

    ctx.settle();
    result
}

fn init_logging(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Logs go to stderr so command output on stdout stays parseable.
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
