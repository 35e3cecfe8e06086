//! `pubview url`: show the request URL for a position.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::{Context, EndpointArgs};
use crate::output::{pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug, Clone)]
pub struct UrlArgs {
    /// Position id to build the URL for.
    pub position_id: String,

    #[command(flatten)]
    pub endpoint: EndpointArgs,
}

#[derive(Debug, Serialize)]
struct UrlReport {
    url: String,
    base_url: String,
    api_version: u8,
    position_id: String,
}

pub fn run_url(args: &UrlArgs, ctx: &Context) -> Result<()> {
    let endpoint = args.endpoint.resolve(&ctx.config)?;
    let report = UrlReport {
        url: endpoint.url_for(&args.position_id)?,
        base_url: endpoint.base_url().to_string(),
        api_version: endpoint.api_version(),
        position_id: args.position_id.trim().to_string(),
    };

    render_mode(
        ctx.output,
        &report,
        |r, w| writeln!(w, "{}", r.url),
        |r, w| {
            pretty_section(w, "Request URL")?;
            pretty_kv(w, "url", &r.url)?;
            pretty_kv(w, "position", &r.position_id)?;
            pretty_kv(w, "api-version", r.api_version.to_string())
        },
    )
}
