use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use uuid::Uuid;

use crate::{
    definitions::{
        booking_request::SagaKey,
        saga_journal::{SagaJournal, SagaOutcome, INITIAL_STEP},
    },
    errors::PersistError,
};

use super::persister::{LockScope, LockType, StepPersister};

#[derive(Debug, Clone)]
pub struct InMemoryPersister {
    journals: Arc<RwLock<HashMap<SagaKey, SagaJournal>>>,
    locks: Arc<RwLock<HashMap<SagaKey, ExecutingContext>>>,
    lock_timeout: Duration,
}

impl InMemoryPersister {
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            journals: Arc::new(RwLock::new(Default::default())),
            locks: Arc::new(RwLock::new(Default::default())),
            lock_timeout,
        }
    }

    pub fn lock_type(&self, key: &SagaKey) -> Option<LockType> {
        self.locks
            .read()
            .expect("persister locks lock")
            .get(key)
            .map(|context| context.lock_type)
    }

    fn try_lock(&self, scope: LockScope, lock_type: LockType) -> Result<(), PersistError> {
        let mut locks = self.locks.write().expect("persister locks lock");
        let insert = if let Some(context) = locks.get(&scope.key) {
            scope.executor_id == context.executor_id
                || matches!(context.lock_type, LockType::Failed | LockType::Finished)
                || context.instant_started.elapsed() > self.lock_timeout
        } else {
            true
        };

        if insert {
            locks.insert(
                scope.key,
                ExecutingContext {
                    executor_id: scope.executor_id,
                    lock_type,
                    instant_started: Instant::now(),
                    name: scope.name,
                },
            );
            Ok(())
        } else {
            Err(PersistError::Locked)
        }
    }

    fn update<F>(&self, key: &SagaKey, f: F)
    where
        F: FnOnce(&mut SagaJournal),
    {
        let mut journals = self.journals.write().expect("journals lock");
        let journal = journals
            .entry(key.clone())
            .or_insert_with(|| SagaJournal::new(key.clone()));
        f(journal);
    }
}

#[async_trait::async_trait]
impl StepPersister for InMemoryPersister {
    async fn lock(&self, scope: LockScope, lock_type: LockType) -> Result<(), PersistError> {
        self.try_lock(scope, lock_type)
    }

    async fn retrieve(&self, key: &SagaKey) -> Result<SagaJournal, PersistError> {
        self.journals
            .read()
            .expect("journals lock")
            .get(key)
            .cloned()
            .ok_or(PersistError::NotFound)
    }

    async fn store(&self, key: &SagaKey, step: u8, state: String) -> Result<(), PersistError> {
        self.update(key, |journal| {
            journal.states.insert(step, state);
        });
        Ok(())
    }

    async fn store_confirmation(&self, key: &SagaKey) -> Result<(), PersistError> {
        self.update(key, |journal| journal.confirmed = true);
        Ok(())
    }

    async fn store_outcome(
        &self,
        key: &SagaKey,
        outcome: SagaOutcome,
    ) -> Result<(), PersistError> {
        self.update(key, |journal| journal.outcome = Some(outcome));
        Ok(())
    }

    async fn get_next_failed(
        &self,
        duration: Duration,
    ) -> Result<Option<(SagaKey, Uuid)>, PersistError> {
        let new_executor = Uuid::new_v4();
        let scope_result = self
            .locks
            .read()
            .expect("persister locks lock")
            .iter()
            .find(|(_, context)| match context.lock_type {
                LockType::Failed => true,
                LockType::Finished => false,
                _ => context.instant_started.elapsed() > duration,
            })
            .map(|(key, context)| LockScope {
                key: key.clone(),
                executor_id: new_executor,
                name: context.name.clone(),
            });
        if let Some(scope) = scope_result {
            let key = scope.key.clone();
            self.lock(scope, LockType::Retry).await?;
            Ok(Some((key, new_executor)))
        } else {
            Ok(None)
        }
    }

    async fn save_initial_state(
        &self,
        scope: LockScope,
        state: String,
    ) -> Result<(), PersistError> {
        let key = scope.key.clone();
        let mut journals = self.journals.write().expect("journals lock");
        // an unfinished journal still belongs to its saga, even once its lock failed
        if journals.get(&key).is_some_and(|j| j.outcome.is_none()) {
            return Err(PersistError::Locked);
        }
        self.try_lock(scope, LockType::Initial)?;

        let mut journal = SagaJournal::new(key.clone());
        journal.states.insert(INITIAL_STEP, state);
        journals.insert(key, journal);
        Ok(())
    }
}

#[derive(Debug)]
struct ExecutingContext {
    executor_id: Uuid,
    lock_type: LockType,
    instant_started: Instant,
    name: String,
}
