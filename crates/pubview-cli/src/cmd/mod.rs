pub mod keys;
pub mod table;
pub mod url;

use anyhow::Result;
use clap::Args;
use pubview_core::config::ViewerConfig;
use pubview_core::endpoint::{EndpointError, PublicationEndpoint};
use pubview_core::error::ErrorCode;
use pubview_core::fetch::{RequestOptions, RetryPolicy, RetryingFetcher, UreqTransport};
use serde_json::Value;
use tracing::{info, warn};

use crate::output::OutputMode;
use crate::store::{FileStore, ResponseStore};

/// Resolved config plus output mode, shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: ViewerConfig,
    pub output: OutputMode,
}

impl Context {
    pub fn store(&self) -> Option<FileStore> {
        self.config.store_dir().map(FileStore::new)
    }
}

/// Endpoint selection flags shared by commands that build a request URL.
#[derive(Args, Debug, Clone, Default)]
pub struct EndpointArgs {
    /// API version (1, 2 or 3). Defaults to `endpoint.api_version`.
    #[arg(long, value_name = "N")]
    pub api_version: Option<u8>,

    /// Endpoint base URL. Defaults to `endpoint.base_url` / PUBVIEW_BASE_URL.
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,
}

impl EndpointArgs {
    pub fn resolve(&self, config: &ViewerConfig) -> Result<PublicationEndpoint, EndpointError> {
        PublicationEndpoint::new(
            self.base_url.as_deref().unwrap_or(&config.endpoint.base_url),
            self.api_version.unwrap_or(config.endpoint.api_version),
        )
    }
}

/// Flags for commands that fetch from the remote endpoint.
#[derive(Args, Debug, Clone, Default)]
pub struct RemoteArgs {
    #[command(flatten)]
    pub endpoint: EndpointArgs,

    /// Attempts before giving up. Defaults to `retry.max_retries`.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Do not persist the raw response to the local store.
    #[arg(long)]
    pub no_store: bool,
}

/// Fetch the raw response for `position_id`, persisting it unless disabled.
///
/// Store failures are logged and never fail the command.
pub fn fetch_remote(ctx: &Context, args: &RemoteArgs, position_id: &str) -> Result<Value> {
    let position_id = position_id.trim();
    let config = &ctx.config;
    let url = args.endpoint.resolve(config)?.url_for(position_id)?;

    let policy = RetryPolicy {
        max_retries: args.max_retries.unwrap_or(config.retry.max_retries),
        ..config.retry_policy()
    };
    let credentials = config
        .credentials
        .scheme
        .provider(config.credential_token());
    let options = RequestOptions::json(credentials.as_ref());

    let fetcher = RetryingFetcher::new(UreqTransport::new(config.transport_settings()), policy);
    let body = fetcher.fetch(&url, &options)?;

    if config.store.enabled && !args.no_store {
        match ctx.store() {
            Some(store) => match store.save(position_id, &body) {
                Ok(path) => info!(path = %path.display(), "saved raw response"),
                Err(err) => warn!(code = %ErrorCode::StoreFailed, error = %format!("{err:#}"), "could not save raw response"),
            },
            None => warn!("no store directory available; raw response not saved"),
        }
    }

    Ok(body)
}
