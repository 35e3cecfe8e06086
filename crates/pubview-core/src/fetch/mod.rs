//! Retrying retrieval of one JSON resource.
//!
//! [`RetryingFetcher::fetch_with_retry`] drives the [`state::RetryState`]
//! machine: each `Attempting` state issues one request (plus at most one
//! redirect hop), each `BackingOff` state pauses for the fixed backoff.
//!
//! # Terminal conditions
//!
//! - 2xx with a JSON body → `Ok(body)`.
//! - 401 (primary or redirect hop) → [`FetchError::Authentication`], never
//!   retried.
//! - Anything else, `max_retries` times in a row →
//!   [`FetchError::RetriesExhausted`] with the last failure.

pub mod credentials;
pub mod error;
pub mod state;
pub mod transport;

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

pub use credentials::{CredentialProvider, CredentialScheme};
pub use error::{AttemptFailure, FetchError};
pub use state::{AttemptOutcome, RetryEvent, RetryState};
pub use transport::{
    HttpResponse, RequestOptions, Transport, TransportError, TransportSettings, UreqTransport,
};

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(1_000);

/// Suspends the calling thread between attempts.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

impl<P: Pause + ?Sized> Pause for &P {
    fn pause(&self, duration: Duration) {
        (**self).pause(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pause for ThreadSleep {
    fn pause(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

pub struct RetryingFetcher<T, P = ThreadSleep> {
    transport: T,
    pause: P,
    policy: RetryPolicy,
}

impl<T: Transport> RetryingFetcher<T> {
    pub const fn new(transport: T, policy: RetryPolicy) -> Self {
        Self::with_pause(transport, ThreadSleep, policy)
    }
}

impl<T: Transport, P: Pause> RetryingFetcher<T, P> {
    pub const fn with_pause(transport: T, pause: P, policy: RetryPolicy) -> Self {
        Self {
            transport,
            pause,
            policy,
        }
    }

    pub const fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch with the configured `max_retries`.
    pub fn fetch(&self, url: &str, options: &RequestOptions) -> Result<Value, FetchError> {
        self.fetch_with_retry(url, options, self.policy.max_retries)
    }

    /// Run one fetch cycle to a terminal state.
    ///
    /// # Errors
    ///
    /// [`FetchError::Authentication`] on a 401, otherwise
    /// [`FetchError::RetriesExhausted`] once `max_retries` attempts (at least
    /// one) have failed.
    pub fn fetch_with_retry(
        &self,
        url: &str,
        options: &RequestOptions,
        max_retries: u32,
    ) -> Result<Value, FetchError> {
        let mut state = RetryState::start();

        loop {
            let event = match state {
                RetryState::Succeeded(body) => {
                    info!(url, "fetch succeeded");
                    return Ok(body);
                }
                RetryState::Failed(err) => {
                    warn!(url, error = %err, "fetch failed");
                    return Err(err);
                }
                RetryState::Attempting { attempt } => {
                    debug!(url, attempt, max_retries, "issuing request");
                    RetryEvent::AttemptCompleted(self.attempt(url, options))
                }
                RetryState::BackingOff {
                    attempt,
                    ref failure,
                } => {
                    warn!(
                        url,
                        attempt,
                        error = %failure,
                        backoff = ?self.policy.backoff,
                        "attempt failed; retrying after backoff"
                    );
                    self.pause.pause(self.policy.backoff);
                    RetryEvent::BackoffElapsed
                }
            };

            state = state.transition(event, max_retries);
        }
    }

    fn attempt(&self, url: &str, options: &RequestOptions) -> AttemptOutcome {
        let response = match self.transport.get(url, options) {
            Ok(response) => response,
            Err(err) => return AttemptOutcome::Failed(AttemptFailure::Network(err.to_string())),
        };

        match response.status {
            401 => AttemptOutcome::Unauthorized,
            301 | 302 | 307 => self.follow_redirect(url, options, &response),
            _ if response.is_success() => decode(&response.body),
            status => AttemptOutcome::Failed(AttemptFailure::Http { status }),
        }
    }

    /// Exactly one follow-up request to `Location`, with the same options.
    fn follow_redirect(
        &self,
        url: &str,
        options: &RequestOptions,
        response: &HttpResponse,
    ) -> AttemptOutcome {
        let status = response.status;
        let Some(location) = response.location.as_deref() else {
            return AttemptOutcome::Failed(AttemptFailure::RedirectFollow {
                status,
                reason: "missing Location header".to_string(),
            });
        };

        let target = resolve_location(url, location);
        debug!(from = url, to = %target, status, "following redirect");

        match self.transport.get(&target, options) {
            Ok(second) if second.is_success() => decode(&second.body),
            Ok(second) if second.status == 401 => AttemptOutcome::Unauthorized,
            Ok(second) => AttemptOutcome::Failed(AttemptFailure::RedirectFollow {
                status,
                reason: format!("{target} answered {}", second.status),
            }),
            Err(err) => AttemptOutcome::Failed(AttemptFailure::RedirectFollow {
                status,
                reason: err.to_string(),
            }),
        }
    }
}

fn decode(body: &str) -> AttemptOutcome {
    match serde_json::from_str(body) {
        Ok(value) => AttemptOutcome::Succeeded(value),
        Err(err) => AttemptOutcome::Failed(AttemptFailure::Decode(err.to_string())),
    }
}

/// Resolve a `Location` value against the URL that produced it.
fn resolve_location(base: &str, location: &str) -> String {
    if location.contains("://") {
        return location.to_owned();
    }

    let (scheme, rest) = base.split_once("://").unwrap_or(("http", base));
    if let Some(network_path) = location.strip_prefix("//") {
        return format!("{scheme}://{network_path}");
    }

    let (authority, tail) = rest.split_at(rest.find(['/', '?', '#']).unwrap_or(rest.len()));
    let base_path = &tail[..tail.find(['?', '#']).unwrap_or(tail.len())];

    if location.starts_with('?') {
        return format!("{scheme}://{authority}{base_path}{location}");
    }
    if location.is_empty() || location.starts_with('#') {
        let without_fragment = &tail[..tail.find('#').unwrap_or(tail.len())];
        return format!("{scheme}://{authority}{without_fragment}{location}");
    }

    let (path, suffix) = location.split_at(location.find(['?', '#']).unwrap_or(location.len()));
    let merged = if path.starts_with('/') {
        path.to_owned()
    } else {
        match base_path.rfind('/') {
            Some(idx) => format!("{}{path}", &base_path[..=idx]),
            None => format!("/{path}"),
        }
    };
    format!("{scheme}://{authority}{}{suffix}", remove_dot_segments(&merged))
}

/// Collapse `.` and `..` segments of an absolute path.
fn remove_dot_segments(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').skip(1).collect();
    let last = segments.len().saturating_sub(1);
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            "." => {}
            ".." => {
                out.pop();
            }
            other => {
                out.push(other);
                continue;
            }
        }
        // A trailing dot segment still names a directory.
        if i == last {
            out.push("");
        }
    }
    format!("/{}", out.join("/"))
}
