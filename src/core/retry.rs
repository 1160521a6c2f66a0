//! Retry logic with a fixed delay
//!
//! The loop runs an operation up to `max_attempts` times. Whether a failure is
//! retried is decided by the error kind (`Retryable`), never by its text.
//! Errors that ask for a cooldown are followed by an extra pause before the
//! regular inter-attempt delay.

use super::error::FetchError;
use super::state_machine::{FetchState, FetchStateMachine, StateTransition};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Default number of attempts
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default pause between attempts
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Default pause after an authentication failure
pub const DEFAULT_AUTH_COOLDOWN: Duration = Duration::from_secs(10);

/// Classification the retry loop needs from an error
pub trait Retryable: Display {
    /// Transient failures are retried until attempts run out
    fn is_retryable(&self) -> bool;

    /// Failures that pause for the cooldown before the regular delay
    fn needs_cooldown(&self) -> bool {
        false
    }
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        FetchError::is_retryable(self)
    }

    fn needs_cooldown(&self) -> bool {
        FetchError::needs_cooldown(self)
    }
}

/// Options for retry behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOptions {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,
    /// Constant delay between attempts
    pub delay: Duration,
    /// Extra pause after errors that need a cooldown
    pub cooldown: Duration,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
            cooldown: DEFAULT_AUTH_COOLDOWN,
        }
    }
}

/// Result of a retried operation together with its state history
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub history: Vec<StateTransition>,
}

impl<T, E> RetryOutcome<T, E> {
    /// Number of attempts that were started
    pub fn attempts(&self) -> u32 {
        self.history.last().map_or(1, |t| t.attempt)
    }

    /// Number of failed attempts that were followed by another attempt
    pub fn retries(&self) -> usize {
        self.history
            .iter()
            .filter(|t| t.to == FetchState::Delaying)
            .count()
    }
}

/// Retry manager for executing operations with a fixed delay
///
/// # Examples
///
/// ```no_run
/// use vault_fetch::core::{FetchError, RetryManager, RetryOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), FetchError> {
///     let manager = RetryManager::new(RetryOptions::default());
///
///     let value = manager
///         .retry(|_attempt| async { Ok::<_, FetchError>("success") })
///         .await?;
///
///     assert_eq!(value, "success");
///     Ok(())
/// }
/// ```
pub struct RetryManager {
    options: RetryOptions,
}

impl RetryManager {
    /// Create a new RetryManager with the given options
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RetryOptions {
        &self.options
    }

    /// Execute the given async operation with retry logic
    ///
    /// The operation receives the 1-based attempt number.
    pub async fn retry<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable,
    {
        self.retry_with_history(operation).await.result
    }

    /// Execute the given async operation with retry logic, keeping the
    /// state transitions it went through
    ///
    /// A `max_attempts` of zero is treated as one attempt.
    pub async fn retry_with_history<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable,
    {
        let max_attempts = self.options.max_attempts.max(1);
        let mut machine = FetchStateMachine::new();
        let mut attempt = 1;

        loop {
            let error = match operation(attempt).await {
                Ok(value) => {
                    machine.transition(FetchState::Succeeded, attempt, None);
                    return RetryOutcome {
                        result: Ok(value),
                        history: machine.into_history(),
                    };
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                tracing::error!(attempt, error = %error, "Attempt {} failed fatally: {}", attempt, error);
                machine.transition(FetchState::FailedTerminal, attempt, Some(error.to_string()));
                return RetryOutcome {
                    result: Err(error),
                    history: machine.into_history(),
                };
            }

            if error.needs_cooldown() {
                machine.transition(FetchState::Cooldown, attempt, Some(error.to_string()));
                sleep(self.options.cooldown).await;
            }

            tracing::warn!(attempt, max_attempts, error = %error, "Attempt {} failed: {}", attempt, error);

            if attempt >= max_attempts {
                machine.transition(FetchState::FailedTerminal, attempt, Some(error.to_string()));
                return RetryOutcome {
                    result: Err(error),
                    history: machine.into_history(),
                };
            }

            machine.transition(FetchState::Delaying, attempt, Some(error.to_string()));
            sleep(self.options.delay).await;

            attempt += 1;
            machine.transition(FetchState::Attempting, attempt, None);
        }
    }
}
