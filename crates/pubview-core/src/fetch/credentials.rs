//! Pluggable credential providers.
//!
//! The retry loop never looks at credentials; it only forwards whatever
//! `Authorization` value the provider produced when the request options were
//! built.

use serde::{Deserialize, Serialize};
use tracing::warn;

pub trait CredentialProvider {
    /// Value for the `Authorization` header, or `None` to send none.
    fn authorization(&self) -> Option<String>;
}

/// Ambient negotiation (`Authorization: Negotiate`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Negotiate;

impl CredentialProvider for Negotiate {
    fn authorization(&self) -> Option<String> {
        Some("Negotiate".to_string())
    }
}

#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

impl CredentialProvider for BearerToken {
    fn authorization(&self) -> Option<String> {
        Some(format!("Bearer {}", self.0))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn authorization(&self) -> Option<String> {
        None
    }
}

/// Configured credential scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialScheme {
    #[default]
    Negotiate,
    Bearer,
    None,
}

impl CredentialScheme {
    /// Build the provider for this scheme. A bearer scheme without a token
    /// degrades to anonymous; the server's 401 then surfaces the problem.
    #[must_use]
    pub fn provider(self, token: Option<String>) -> Box<dyn CredentialProvider> {
        match self {
            Self::Negotiate => Box::new(Negotiate),
            Self::Bearer => match token.filter(|value| !value.trim().is_empty()) {
                Some(token) => Box::new(BearerToken::new(token)),
                None => {
                    warn!("bearer credentials selected but no token is set; sending no Authorization header");
                    Box::new(Anonymous)
                }
            },
            Self::None => Box::new(Anonymous),
        }
    }
}
