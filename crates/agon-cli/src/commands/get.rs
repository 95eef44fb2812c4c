//! Get command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use agon_core::ApiRequest;

use crate::context::CliContext;
use crate::output;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Path relative to the API base URL (e.g. /academic/courses/)
    pub path: String,

    /// Query parameter as key=value (repeatable)
    #[arg(short, long = "query", value_parser = parse_query)]
    pub query: Vec<(String, String)>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(ctx: &CliContext, args: GetArgs) -> Result<()> {
    let mut request = ApiRequest::get(&args.path);
    for (key, value) in &args.query {
        request = request.query(key, value);
    }

    let response = ctx
        .client()
        .send(request)
        .await
        .with_context(|| format!("GET {} failed", args.path))?;

    if response.bytes().is_empty() {
        return Ok(());
    }

    let body: Value = response.json().context("Response is not JSON")?;

    output::json(&body, args.compact)
}

fn parse_query(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
