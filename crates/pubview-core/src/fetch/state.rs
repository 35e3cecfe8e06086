//! Retry state machine.
//!
//! ```text
//!              AttemptCompleted(Succeeded)
//!   Attempting ───────────────────────────▶ Succeeded
//!   │    ▲     AttemptCompleted(Unauthorized)
//!   │    │  ───────────────────────────────▶ Failed(Authentication)
//!   │    │     AttemptCompleted(Failed), n == max
//!   │    │  ───────────────────────────────▶ Failed(RetriesExhausted)
//!   │    │
//!   │    └─ BackoffElapsed (n + 1)
//!   ▼ AttemptCompleted(Failed), n < max
//!   BackingOff
//! ```
//!
//! [`RetryState::transition`] is pure. Events that do not apply to the
//! current state leave it unchanged, and terminal states absorb everything.

use serde_json::Value;

use super::error::{AttemptFailure, FetchError};

/// Result of one attempt (including its optional redirect hop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Succeeded(Value),
    Unauthorized,
    Failed(AttemptFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryEvent {
    AttemptCompleted(AttemptOutcome),
    BackoffElapsed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `attempt` (1-based) is about to be, or is being, issued.
    Attempting { attempt: u32 },
    /// Attempt `attempt` failed and the backoff pause is pending.
    BackingOff { attempt: u32, failure: AttemptFailure },
    Succeeded(Value),
    Failed(FetchError),
}

impl RetryState {
    #[must_use]
    pub const fn start() -> Self {
        Self::Attempting { attempt: 1 }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_))
    }

    /// Advance by one event. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn transition(self, event: RetryEvent, max_attempts: u32) -> Self {
        let max_attempts = max_attempts.max(1);

        match (self, event) {
            (Self::Attempting { attempt }, RetryEvent::AttemptCompleted(outcome)) => match outcome {
                AttemptOutcome::Succeeded(body) => Self::Succeeded(body),
                AttemptOutcome::Unauthorized => Self::Failed(FetchError::Authentication),
                AttemptOutcome::Failed(failure) if attempt < max_attempts => {
                    Self::BackingOff { attempt, failure }
                }
                AttemptOutcome::Failed(failure) => Self::Failed(FetchError::RetriesExhausted {
                    attempts: attempt,
                    last: failure,
                }),
            },
            (Self::BackingOff { attempt, .. }, RetryEvent::BackoffElapsed) => Self::Attempting {
                attempt: attempt.saturating_add(1),
            },
            (state, _) => state,
        }
    }
}
