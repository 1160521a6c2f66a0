//! State machine for tracking a fetch through its attempts
//!
//! The history is kept in memory only; nothing about a fetch is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fetch state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchState {
    Attempting,
    Cooldown,
    Delaying,
    Succeeded,
    FailedTerminal,
}

impl FetchState {
    /// Terminal states end the fetch
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedTerminal)
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    /// From state
    pub from: FetchState,

    /// To state
    pub to: FetchState,

    /// Attempt number (1-based) the transition belongs to
    pub attempt: u32,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Failure message, for transitions caused by an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// State machine for tracking the fetch workflow
#[derive(Debug)]
pub struct FetchStateMachine {
    current_state: FetchState,
    transitions: Vec<StateTransition>,
}

impl Default for FetchStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchStateMachine {
    /// Create a new state machine in the `Attempting` state
    pub fn new() -> Self {
        Self {
            current_state: FetchState::Attempting,
            transitions: Vec::new(),
        }
    }

    /// Transition to a new state
    pub fn transition(&mut self, to: FetchState, attempt: u32, message: Option<String>) {
        tracing::debug!(
            from = ?self.current_state,
            to = ?to,
            attempt,
            "fetch state transition"
        );

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            attempt,
            timestamp: Utc::now(),
            message,
        });
        self.current_state = to;
    }

    /// Get current state
    pub fn get_state(&self) -> FetchState {
        self.current_state
    }

    /// Recorded transitions, oldest first
    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    /// Consume the machine, keeping its history
    pub fn into_history(self) -> Vec<StateTransition> {
        self.transitions
    }

    /// Number of transitions into the given state
    pub fn count(&self, state: FetchState) -> usize {
        self.transitions.iter().filter(|t| t.to == state).count()
    }
}
