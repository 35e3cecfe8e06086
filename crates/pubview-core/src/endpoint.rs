//! Request URL construction.

use crate::error::ErrorCode;

pub const DEFAULT_BASE_URL: &str = "http://localhost:10499/api/trade-publication/publication-message";

/// API versions the publication service answers.
pub const SUPPORTED_API_VERSIONS: [u8; 3] = [1, 2, 3];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("position id must not be empty")]
    EmptyPositionId,

    #[error("unsupported api-version {0} (expected 1, 2 or 3)")]
    UnsupportedApiVersion(u8),

    #[error("base URL must start with http:// or https://, got '{0}'")]
    InvalidBaseUrl(String),
}

impl EndpointError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidEndpoint
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationEndpoint {
    base_url: String,
    api_version: u8,
}

impl PublicationEndpoint {
    /// # Errors
    ///
    /// Rejects a base URL without an http(s) scheme and an api-version
    /// outside [`SUPPORTED_API_VERSIONS`].
    pub fn new(base_url: &str, api_version: u8) -> Result<Self, EndpointError> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(EndpointError::InvalidBaseUrl(base_url.to_owned()));
        }
        if !SUPPORTED_API_VERSIONS.contains(&api_version) {
            return Err(EndpointError::UnsupportedApiVersion(api_version));
        }

        Ok(Self {
            base_url: trimmed.to_owned(),
            api_version,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn api_version(&self) -> u8 {
        self.api_version
    }

    /// `<base>/<position id>?api-version=<n>`
    ///
    /// # Errors
    ///
    /// Fails when `position_id` is blank.
    pub fn url_for(&self, position_id: &str) -> Result<String, EndpointError> {
        let position_id = position_id.trim();
        if position_id.is_empty() {
            return Err(EndpointError::EmptyPositionId);
        }

        Ok(format!(
            "{}/{}?api-version={}",
            self.base_url,
            encode_segment(position_id),
            self.api_version
        ))
    }
}

impl Default for PublicationEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_version: 1,
        }
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_builds_expected_url() {
        let url = PublicationEndpoint::default().url_for("POS-42").unwrap();
        assert_eq!(
            url,
            "http://localhost:10499/api/trade-publication/publication-message/POS-42?api-version=1"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let endpoint = PublicationEndpoint::new("https://svc.local/msgs/", 3).unwrap();
        assert_eq!(endpoint.base_url(), "https://svc.local/msgs");
        assert_eq!(
            endpoint.url_for("P1").unwrap(),
            "https://svc.local/msgs/P1?api-version=3"
        );
    }

    #[test]
    fn unsupported_version_is_rejected() {
        assert_eq!(
            PublicationEndpoint::new("http://svc", 4),
            Err(EndpointError::UnsupportedApiVersion(4))
        );
        assert_eq!(
            PublicationEndpoint::new("http://svc", 0),
            Err(EndpointError::UnsupportedApiVersion(0))
        );
    }

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(matches!(
            PublicationEndpoint::new("svc.local/msgs", 1),
            Err(EndpointError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn blank_position_id_is_rejected() {
        let endpoint = PublicationEndpoint::default();
        assert_eq!(endpoint.url_for("   "), Err(EndpointError::EmptyPositionId));
    }

    #[test]
    fn position_id_is_percent_encoded() {
        let url = PublicationEndpoint::default().url_for("a b/c").unwrap();
        assert!(url.ends_with("/a%20b%2Fc?api-version=1"));
    }
}
