use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    definitions::{
        booking_request::SagaKey,
        saga_journal::{SagaJournal, SagaOutcome},
    },
    errors::PersistError,
};

/// Durable side of a saga: the journal it replays from and the lock that
/// keeps one executor per saga key.
#[async_trait]
pub trait StepPersister {
    async fn lock(&self, scope: LockScope, lock_type: LockType) -> Result<(), PersistError>;
    async fn retrieve(&self, key: &SagaKey) -> Result<SagaJournal, PersistError>;
    async fn store(&self, key: &SagaKey, step: u8, state: String) -> Result<(), PersistError>;
    async fn store_confirmation(&self, key: &SagaKey) -> Result<(), PersistError>;
    async fn store_outcome(&self, key: &SagaKey, outcome: SagaOutcome)
        -> Result<(), PersistError>;
    /// Takes over the next failed saga, or one whose lock is older than
    /// `for_duration`. Returns its key and the new executor id.
    async fn get_next_failed(
        &self,
        for_duration: Duration,
    ) -> Result<Option<(SagaKey, Uuid)>, PersistError>;
    /// Locks `scope` and starts a fresh journal holding `state` as step 0.
    /// Fails with [`PersistError::Locked`] while an unfinished journal exists.
    async fn save_initial_state(&self, scope: LockScope, state: String)
        -> Result<(), PersistError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockScope {
    pub key: SagaKey,
    pub executor_id: Uuid,
    pub name: String,
}

impl LockScope {
    pub fn from_key(key: SagaKey, name: String) -> Self {
        Self {
            key,
            executor_id: Uuid::new_v4(),
            name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockType {
    Executing,
    Failed,
    Finished,
    Initial,
    Retry,
}
