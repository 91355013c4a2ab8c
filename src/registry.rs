use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::Duration,
};

use tokio::{task::JoinHandle, time::sleep};

use crate::{
    activities::TravelActivities,
    config::SagaConfig,
    definitions::{
        booking_request::{BookingRequest, SagaKey},
        saga_journal::SagaOutcome,
        travel_saga::{SagaHandle, TravelSaga, SAGA_NAME},
    },
    errors::{PersistError, RegistryError, SagaError},
    executors::step_executor::StepExecutor,
    metrics::SagaMetrics,
    persisters::persister::{LockScope, StepPersister},
};

pub type SagaTask = JoinHandle<Result<SagaOutcome, SagaError>>;

/// What happened to a confirmation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalDelivery {
    Delivered,
    AlreadyConfirmed,
    /// No saga for that user is waiting for confirmation here. Nothing
    /// changed.
    NotRunning,
}

/// Starts travel sagas, routes confirmations to them by saga key and picks
/// up sagas whose executor failed.
pub struct SagaRegistry<A, P> {
    activities: Arc<A>,
    persister: P,
    config: SagaConfig,
    metrics: Arc<dyn SagaMetrics>,
    active: Arc<RwLock<HashMap<SagaKey, SagaHandle>>>,
}

impl<A, P> SagaRegistry<A, P>
where
    A: TravelActivities + 'static,
    P: StepPersister + Clone + Send + Sync + 'static,
{
    pub fn new(
        activities: Arc<A>,
        persister: P,
        config: SagaConfig,
        metrics: Arc<dyn SagaMetrics>,
    ) -> Self {
        Self {
            activities,
            persister,
            config,
            metrics,
            active: Arc::new(RwLock::new(Default::default())),
        }
    }

    pub fn is_running(&self, key: &SagaKey) -> bool {
        self.active
            .read()
            .expect("active sagas lock")
            .contains_key(key)
    }

    /// Journals the request and spawns its saga. Returns once the saga is
    /// scheduled, the task resolves to the saga's outcome.
    pub async fn start_booking(
        &self,
        request: BookingRequest,
    ) -> Result<SagaTask, RegistryError> {
        let key = request.key();
        if self.is_running(&key) {
            return Err(RegistryError::AlreadyRunning(key));
        }

        let scope = LockScope::from_key(key.clone(), SAGA_NAME.to_string());
        let state = serde_json::to_string(&request).map_err(PersistError::from)?;
        self.persister
            .save_initial_state(scope.clone(), state)
            .await
            .map_err(|e| match e {
                PersistError::Locked => RegistryError::AlreadyRunning(key.clone()),
                e => e.into(),
            })?;

        log::info!("Scheduled saga {key}");
        let saga = self.create_saga(scope);
        Ok(self.spawn(saga, Some(request)))
    }

    pub async fn confirm_booking(&self, user_id: &str) -> Result<SignalDelivery, RegistryError> {
        let key = SagaKey::for_user(user_id);
        let handle = self
            .active
            .read()
            .expect("active sagas lock")
            .get(&key)
            .cloned();
        let Some(handle) = handle else {
            log::debug!("Ignoring confirmation for {key}, no saga running");
            return Ok(SignalDelivery::NotRunning);
        };

        if handle.confirm() {
            log::info!("Received user confirmation signal for {key}");
            self.persister.store_confirmation(&key).await?;
            Ok(SignalDelivery::Delivered)
        } else if handle.is_confirmed() {
            Ok(SignalDelivery::AlreadyConfirmed)
        } else {
            log::debug!("Ignoring confirmation for {key}, the wait already ended");
            Ok(SignalDelivery::NotRunning)
        }
    }

    /// Continues the next saga that failed or went stale, if any.
    pub async fn resume_next_failed(&self) -> Result<Option<SagaTask>, RegistryError> {
        let Some((key, executor_id)) = self
            .persister
            .get_next_failed(self.config.lock_timeout())
            .await?
        else {
            return Ok(None);
        };
        if self.is_running(&key) {
            log::warn!("Saga {key} is still running here, not resuming");
            return Ok(None);
        }

        log::info!("Resuming saga {key} with executor {executor_id}");
        let scope = LockScope {
            key,
            executor_id,
            name: SAGA_NAME.to_string(),
        };
        let saga = self.create_saga(scope);
        Ok(Some(self.spawn(saga, None)))
    }

    /// Polls for failed sagas forever, sleeping `idle` between empty polls.
    pub async fn run_resumer(&self, idle: Duration) {
        loop {
            match self.resume_next_failed().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => log::error!("Failed to resume saga: {e}"),
            }
            sleep(idle).await;
        }
    }

    fn create_saga(&self, scope: LockScope) -> TravelSaga<A, P> {
        let executor = StepExecutor::new(
            self.activities.clone(),
            self.config.retry_policy(),
            self.metrics.clone(),
        );
        TravelSaga::new(
            scope,
            executor,
            self.persister.clone(),
            self.config.confirmation_timeout(),
            self.metrics.clone(),
        )
    }

    fn spawn(&self, saga: TravelSaga<A, P>, request: Option<BookingRequest>) -> SagaTask {
        let handle = saga.handle();
        let key = handle.key().clone();
        self.active
            .write()
            .expect("active sagas lock")
            .insert(key.clone(), handle);

        let active = self.active.clone();
        tokio::spawn(async move {
            let result = match request {
                Some(request) => saga.run(request).await,
                None => saga.continue_from_last_step().await,
            };
            active.write().expect("active sagas lock").remove(&key);
            if let Err(e) = &result {
                log::error!("Saga {key} stopped with an execution fault: {e}");
            }
            result
        })
    }
}
