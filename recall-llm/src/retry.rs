//! Bounded retry-with-correction protocol.
//!
//! Both structured protocols (forced tool call, single digit) share the
//! same shape:
//!
//! ```text
//! Attempting(1) ──valid──▶ Succeeded(result)
//!      │ correctable failure (correction messages injected)
//!      ▼
//! Attempting(2) ──valid──▶ Succeeded(result)
//!      │
//!      ▼
//! Attempting(max) ──failure──▶ Exhausted
//! ```
//!
//! Exhaustion is not an error: callers map it to their own sentinel.

/// Attempt bound shared by every retried protocol.
pub const MAX_PROTOCOL_ATTEMPTS: u32 = 3;

/// State of a retried protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState<T> {
    /// The given 1-based attempt is in flight.
    Attempting(u32),
    /// A valid result was produced.
    Succeeded(T),
    /// Every attempt failed.
    Exhausted,
}

/// Drives an [`AttemptState`] through its transitions.
#[derive(Debug, Clone)]
pub struct RetryProtocol<T> {
    state: AttemptState<T>,
    max_attempts: u32,
    attempts_made: u32,
}

impl<T> RetryProtocol<T> {
    /// Start a protocol allowing at most `max_attempts` attempts.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        let state = if max_attempts == 0 {
            AttemptState::Exhausted
        } else {
            AttemptState::Attempting(1)
        };
        Self {
            state,
            max_attempts,
            attempts_made: 0,
        }
    }

    /// The attempt number to run next, or `None` once the protocol has
    /// finished. Each call that returns `Some` counts as one attempt.
    pub fn next_attempt(&mut self) -> Option<u32> {
        match self.state {
            AttemptState::Attempting(n) if n > self.attempts_made => {
                self.attempts_made = n;
                Some(n)
            }
            _ => None,
        }
    }

    /// Record a valid result.
    pub fn succeed(&mut self, result: T) {
        if matches!(self.state, AttemptState::Attempting(_)) {
            self.state = AttemptState::Succeeded(result);
        }
    }

    /// Record a failed attempt; moves to the next attempt or to exhaustion.
    pub fn fail(&mut self) {
        if let AttemptState::Attempting(n) = self.state {
            self.state = if n >= self.max_attempts {
                AttemptState::Exhausted
            } else {
                AttemptState::Attempting(n + 1)
            };
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &AttemptState<T> {
        &self.state
    }

    /// Number of attempts started so far.
    #[must_use]
    pub fn attempts_made(&self) -> u32 {
        self.attempts_made
    }

    /// Consume the protocol, yielding the result if one succeeded.
    #[must_use]
    pub fn into_result(self) -> Option<T> {
        match self.state {
            AttemptState::Succeeded(result) => Some(result),
            AttemptState::Attempting(_) | AttemptState::Exhausted => None,
        }
    }
}
