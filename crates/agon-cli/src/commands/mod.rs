//! Subcommand implementations.

pub mod get;
pub mod keep_alive;
pub mod login;
pub mod logout;
pub mod ping;
pub mod whoami;
