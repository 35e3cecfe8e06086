//! HTTP transport seam.
//!
//! The retry loop only needs a status, an optional `Location` header and the
//! body text, so [`Transport`] returns exactly that. [`UreqTransport`] is the
//! production implementation; tests supply scripted stubs.

use std::time::Duration;

use super::credentials::CredentialProvider;

/// What the retry loop sees of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    pub fn redirect(status: u16, location: impl Into<String>) -> Self {
        Self {
            status,
            location: Some(location.into()),
            body: String::new(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No response was received (DNS, refused connection, timeout, TLS).
    #[error("request to {url} failed: {reason}")]
    Connection { url: String, reason: String },

    /// A response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(#[from] std::io::Error),
}

/// Headers attached to every request of a fetch cycle, including the
/// redirect hop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// `Accept: application/json` plus whatever the credential provider adds.
    #[must_use]
    pub fn json(credentials: &dyn CredentialProvider) -> Self {
        let options = Self::default().with_header("Accept", "application/json");
        match credentials.authorization() {
            Some(value) => options.with_header("Authorization", value),
            None => options,
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

pub trait Transport {
    /// Issue one GET. Non-2xx statuses are responses, not errors.
    fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse, TransportError> {
        (**self).get(url, options)
    }
}

/// Transport-level knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    /// Redirect hops the HTTP client follows on its own. Zero leaves every
    /// hop to the fetcher, which repeats the request options on it.
    pub redirects: u32,
    /// Whole-request timeout. The retry loop has no other cancellation.
    pub timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            redirects: 0,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    #[must_use]
    pub fn new(settings: TransportSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .redirects(settings.redirects)
            .redirect_auth_headers(ureq::RedirectAuthHeaders::SameHost)
            .timeout(settings.timeout)
            .user_agent(concat!("pubview/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(TransportSettings::default())
    }
}

impl Transport for UreqTransport {
    fn get(&self, url: &str, options: &RequestOptions) -> Result<HttpResponse, TransportError> {
        let mut request = self.agent.get(url);
        for (name, value) in options.headers() {
            request = request.set(name, value);
        }

        let response = match request.call() {
            Ok(response) | Err(ureq::Error::Status(_, response)) => response,
            Err(err) => {
                return Err(TransportError::Connection {
                    url: url.to_owned(),
                    reason: err.to_string(),
                });
            }
        };

        let status = response.status();
        let location = response.header("Location").map(ToOwned::to_owned);
        let body = response.into_string()?;

        Ok(HttpResponse {
            status,
            location,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::credentials::{Anonymous, BearerToken, Negotiate};

    #[test]
    fn json_options_carry_accept_and_negotiate() {
        let options = RequestOptions::json(&Negotiate);
        assert_eq!(options.header("accept"), Some("application/json"));
        assert_eq!(options.header("Authorization"), Some("Negotiate"));
    }

    #[test]
    fn anonymous_options_have_no_authorization() {
        let options = RequestOptions::json(&Anonymous);
        assert_eq!(options.headers().len(), 1);
        assert!(options.header("Authorization").is_none());
    }

    #[test]
    fn bearer_options_format_token() {
        let options = RequestOptions::json(&BearerToken::new("t0k"));
        assert_eq!(options.header("Authorization"), Some("Bearer t0k"));
    }

    #[test]
    fn success_range_is_2xx_only() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(302, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
    }
}
