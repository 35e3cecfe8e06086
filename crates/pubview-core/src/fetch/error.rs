use crate::error::ErrorCode;
use crate::model::ErrorEnvelope;

/// Why a single attempt did not produce a body. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptFailure {
    /// Non-2xx, non-401 status.
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// The transport itself faulted before a status was observed.
    #[error("network error: {0}")]
    Network(String),

    /// A redirect was answered but the single follow-up hop did not succeed.
    #[error("redirect ({status}) could not be followed: {reason}")]
    RedirectFollow { status: u16, reason: String },

    /// A 2xx response whose body is not JSON.
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
}

/// Terminal failure of a fetch cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The server answered 401. Never retried.
    #[error("Authentication failed")]
    Authentication,

    /// Every attempt failed; carries the last failure seen.
    #[error("Failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: AttemptFailure },
}

impl FetchError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication => ErrorCode::AuthenticationFailed,
            Self::RetriesExhausted { .. } => ErrorCode::RetriesExhausted,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }

    /// The `{ "error": ... }` value handed to the presentation layer.
    #[must_use]
    pub fn to_envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope::new(self.to_string())
    }
}
