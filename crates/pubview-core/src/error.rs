use std::fmt;

/// Machine-readable error codes surfaced alongside error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    AuthenticationFailed,
    RetriesExhausted,
    ConfigParseError,
    InvalidEndpoint,
    InputReadFailed,
    StoreFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "E1001",
            Self::RetriesExhausted => "E1002",
            Self::ConfigParseError => "E2001",
            Self::InvalidEndpoint => "E2002",
            Self::InputReadFailed => "E3001",
            Self::StoreFailed => "E3002",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::AuthenticationFailed => Some(
                "Check the credentials scheme in config.toml or export the token named by `credentials.token_env`.",
            ),
            Self::RetriesExhausted => {
                Some("Verify the endpoint is reachable, or raise `retry.max_retries`.")
            }
            Self::ConfigParseError => Some("Fix syntax in .pubview/config.toml and retry."),
            Self::InvalidEndpoint => Some("Use an api-version of 1, 2 or 3 and a non-empty position id."),
            Self::InputReadFailed => Some("Check the path passed to --input."),
            Self::StoreFailed => Some("Check permissions on the store directory, or pass --no-store."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
