//! Login command implementation.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::warn;

use agon_client::{IdentityBootstrap, RetryPolicy};
use agon_core::{Credentials, Error};

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Username (usually the document number)
    #[arg(long, env = "AGON_USERNAME")]
    pub username: String,

    /// Account password
    #[arg(long, env = "AGON_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn run(ctx: &CliContext, args: LoginArgs) -> Result<()> {
    let credentials = Credentials::new(&args.username, &args.password);

    output::note("Logging in...");

    if let Err(err) = ctx.client().login(&credentials).await {
        return Err(explain(err));
    }

    output::success("Logged in successfully");
    println!();

    // The token pair is stored; a failed profile fetch only costs the summary.
    let bootstrap = IdentityBootstrap::new(Arc::new(ctx.client().clone()), RetryPolicy::default());
    match bootstrap.refetch().await {
        Ok(user) => {
            output::field("Username", user.username.as_str());
            output::field("Name", user.display_name().as_str());
            output::field("Role", user.role.to_string().as_str());
        }
        Err(e) => {
            warn!(error = %e, "Could not load profile after login");
            output::field("Username", credentials.username().trim());
        }
    }
    output::field("API", ctx.client().base_url().as_str());

    Ok(())
}

/// Turn a login failure into the message a person needs to see.
fn explain(err: Error) -> anyhow::Error {
    let message = match &err {
        Error::Transport(_) => "The server is waking up. Wait a few seconds and try again.",
        Error::Http(http) if matches!(http.status, 400 | 401) => {
            "Invalid credentials. Check your username and password."
        }
        Error::InvalidInput(_) => "Username and password are required",
        _ => "Failed to login",
    };
    anyhow::Error::new(err).context(message)
}
