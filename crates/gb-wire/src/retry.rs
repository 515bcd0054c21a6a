//! Bounded retry for bus operations.

use crate::bus::BusFault;
use crate::error::{WireError, WireResult};

pub const DEFAULT_ATTEMPTS: u32 = 3;

/// Number of attempts (first try included) made for each bus call.
///
/// The count resets on every call. No delay is inserted between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> WireResult<Self> {
        if max_attempts == 0 {
            return Err(WireError::Configuration {
                what: "retry policy needs at least one attempt".to_string(),
            });
        }
        Ok(Self { max_attempts })
    }

    /// Policy that never retries.
    pub fn once() -> Self {
        Self { max_attempts: 1 }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// On exhaustion returns the number of attempts made and the last fault.
    pub fn run<T>(
        &self,
        mut op: impl FnMut() -> Result<T, BusFault>,
    ) -> Result<T, (u32, BusFault)> {
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(fault) if attempt >= self.max_attempts => return Err((attempt, fault)),
                Err(fault) => {
                    tracing::debug!(
                        attempt,
                        max_attempts = self.max_attempts,
                        %fault,
                        "bus operation failed, retrying"
                    );
                    attempt += 1;
                }
            }
        }
    }
}
