use std::time::Duration;

use uuid::Uuid;

use crate::{
    definitions::{
        booking_request::SagaKey,
        saga_journal::{SagaJournal, SagaOutcome},
    },
    errors::PersistError,
};

use super::persister::{LockScope, LockType, StepPersister};

/// Remembers nothing. Every run starts from scratch.
#[derive(Debug, Default, Clone)]
pub struct Blackhole {}

#[async_trait::async_trait]
impl StepPersister for Blackhole {
    async fn lock(&self, _scope: LockScope, _lock_type: LockType) -> Result<(), PersistError> {
        Ok(())
    }

    async fn retrieve(&self, _key: &SagaKey) -> Result<SagaJournal, PersistError> {
        Err(PersistError::NotFound)
    }

    async fn store(&self, _key: &SagaKey, _step: u8, _state: String) -> Result<(), PersistError> {
        Ok(())
    }

    async fn store_confirmation(&self, _key: &SagaKey) -> Result<(), PersistError> {
        Ok(())
    }

    async fn store_outcome(
        &self,
        _key: &SagaKey,
        _outcome: SagaOutcome,
    ) -> Result<(), PersistError> {
        Ok(())
    }

    async fn get_next_failed(
        &self,
        _for_duration: Duration,
    ) -> Result<Option<(SagaKey, Uuid)>, PersistError> {
        Ok(None)
    }

    async fn save_initial_state(
        &self,
        _scope: LockScope,
        _state: String,
    ) -> Result<(), PersistError> {
        Ok(())
    }
}
