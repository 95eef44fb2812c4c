//! Whoami command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use agon_client::{IdentityBootstrap, RetryPolicy};
use agon_core::error::AuthError;

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    /// Print the full profile as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(ctx: &CliContext, args: WhoamiArgs) -> Result<()> {
    let bootstrap = IdentityBootstrap::new(Arc::new(ctx.client().clone()), RetryPolicy::default());

    let user = bootstrap
        .start()
        .await
        .context("Failed to load profile")?
        .ok_or(AuthError::NoSession)
        .context("No active session. Run 'agon login' first.")?;

    if args.json {
        return output::json(&user, false);
    }

    output::field("Username", user.username.as_str());
    output::field("Name", user.display_name().as_str());
    output::field("Role", user.role.to_string().as_str());
    output::field("Email", user.email.as_str());
    output::field("Document", user.document_number.as_deref());
    output::field("Phone", user.phone_number.as_deref());
    output::field("API", ctx.client().base_url().as_str());

    if let Some(updated_at) = ctx.store().updated_at().ok().flatten() {
        output::field(
            "Session saved",
            updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string().as_str(),
        );
    }

    Ok(())
}
