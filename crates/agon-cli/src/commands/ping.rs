//! Ping command implementation.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct PingArgs {}

pub async fn run(ctx: &CliContext, _args: PingArgs) -> Result<()> {
    let started = Instant::now();

    ctx.client()
        .ping()
        .await
        .with_context(|| format!("Backend at {} did not answer", ctx.client().base_url()))?;

    output::success(&format!(
        "Backend is up ({} ms)",
        started.elapsed().as_millis()
    ));

    Ok(())
}
