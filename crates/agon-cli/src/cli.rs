//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{get, keep_alive, login, logout, ping, whoami};

/// Backend address used when neither `--api-url` nor `AGON_API_URL` is set.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";

/// Command-line client for the AGON portal API.
#[derive(Parser, Debug)]
#[command(name = "agon")]
#[command(author, version = env!("AGON_VERSION"), about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Backend API base URL
    #[arg(long, env = "AGON_API_URL", default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session tokens
    Login(login::LoginArgs),

    /// Erase the stored session
    Logout(logout::LogoutArgs),

    /// Resolve and display the signed-in user
    Whoami(whoami::WhoamiArgs),

    /// Send an authenticated GET request and print the JSON response
    Get(get::GetArgs),

    /// Check that the backend is up
    Ping(ping::PingArgs),

    /// Ping the backend periodically so it is not suspended
    KeepAlive(keep_alive::KeepAliveArgs),
}

impl Commands {
    /// Route the command runs on, as seen by the login redirect.
    pub fn route(&self) -> &'static str {
        match self {
            Commands::Login(_) => "/login",
            Commands::Logout(_) => "/logout",
            Commands::Whoami(_) => "/whoami",
            Commands::Get(_) => "/get",
            Commands::Ping(_) => "/ping",
            Commands::KeepAlive(_) => "/keep-alive",
        }
    }
}
