//! pubview-core library.
//!
//! Retrieval, normalization and presentation of trade-publication messages.
//!
//! The pipeline is fetch → normalize → present:
//!
//! - [`fetch::RetryingFetcher`] issues one logical request with bounded retry,
//!   fixed backoff and a single manual redirect hop.
//! - [`normalize::normalize`] turns the raw `{ messages: { version: [...] } }`
//!   envelope into either a key summary or a typed [`model::VersionedMessageSet`].
//! - [`present::present`] flattens, orders and labels the messages as
//!   [`present::DisplayRow`]s.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums at module boundaries; [`error::ErrorCode`]
//!   for machine-readable codes.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod endpoint;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod present;

pub use fetch::{FetchError, RetryingFetcher};
pub use model::{ErrorEnvelope, VersionedMessageSet};
pub use normalize::{KeyAccessor, NormalizeMode, Normalized, normalize};
pub use present::{DisplayRow, present};
