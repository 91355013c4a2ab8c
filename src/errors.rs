use std::time::Duration;

use thiserror::Error;

use crate::{activities::Activity, definitions::booking_request::SagaKey};

/// A single remote attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ActivityError(pub String);

impl ActivityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("attempt failed: {0}")]
    Failed(#[from] ActivityError),
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

/// Retries exhausted for one activity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{activity} gave up after {attempts} attempts, last {last}")]
pub struct TerminalFailure {
    pub activity: Activity,
    pub attempts: u32,
    pub last: AttemptFailure,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to persist: Locked")]
    Locked,
    #[error("Failed to persist: NotFound")]
    NotFound,
    #[error("Failed to persist: unexpected record at step {0}")]
    UnexpectedRecord(u8),
    #[error("Failed to persist: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SagaError {
    /// Confirm or cancel booking failed once all forward steps were done.
    /// Nothing is compensated at that point.
    #[error("saga {key} failed after all bookings were made: {source}")]
    PostCompletion {
        key: SagaKey,
        #[source]
        source: TerminalFailure,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("saga {0} is already running")]
    AlreadyRunning(SagaKey),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
