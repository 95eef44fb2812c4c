//! Logout command implementation.

use anyhow::{Context, Result};
use clap::Args;

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LogoutArgs {}

pub fn run(ctx: &CliContext, _args: LogoutArgs) -> Result<()> {
    let was_logged_in = ctx.client().is_logged_in().unwrap_or(false);

    ctx.client().logout().context("Failed to erase session")?;

    if was_logged_in {
        output::success("Logged out");
    } else {
        output::success("No active session");
    }

    Ok(())
}
