//! Keep-alive command implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use tokio::sync::watch;

use agon_client::{DEFAULT_PING_INTERVAL, KeepAlive};

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct KeepAliveArgs {
    /// Seconds between pings
    #[arg(long, default_value_t = DEFAULT_PING_INTERVAL.as_secs(), value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,
}

pub async fn run(ctx: &CliContext, args: KeepAliveArgs) -> Result<()> {
    let interval = Duration::from_secs(args.interval);

    // A terminal session counts as always in the foreground.
    let (visible, visibility) = watch::channel(true);
    let keep_alive = KeepAlive::spawn(Arc::new(ctx.client().clone()), visibility, interval);

    output::note(&format!(
        "Pinging {} every {}s, press Ctrl-C to stop",
        ctx.client().base_url(),
        args.interval
    ));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    drop(visible);
    keep_alive.stop();
    output::success("Stopped");

    Ok(())
}
