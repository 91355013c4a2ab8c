use std::{sync::Arc, time::Duration};

use crate::{
    activities::{Activity, TravelActivities},
    errors::{PersistError, SagaError},
    executors::step_executor::StepExecutor,
    metrics::SagaMetrics,
    persisters::persister::{LockScope, LockType, StepPersister},
};

use super::{
    booking_request::{BookingRequest, SagaKey},
    compensation::CompensationStack,
    confirmation::ConfirmationGate,
    saga_journal::{SagaJournal, SagaOutcome, StepRecord, DECISION_STEP, INITIAL_STEP},
};

pub const SAGA_NAME: &str = "travel_booking";

enum Forward {
    Booked(CompensationStack<Activity>),
    /// A step ran out of retries. Holds the compensations pushed before it.
    Failed(CompensationStack<Activity>),
}

/// Forward steps in execution order. The journal numbers them from 1.
pub const FORWARD_STEPS: [Activity; 3] = [
    Activity::BookFlight,
    Activity::BookHotel,
    Activity::ArrangeTransport,
];

/// Lets another task confirm a running saga.
#[derive(Debug, Clone)]
pub struct SagaHandle {
    key: SagaKey,
    gate: Arc<ConfirmationGate>,
}

impl SagaHandle {
    pub fn key(&self) -> &SagaKey {
        &self.key
    }

    /// Returns false if the saga was already confirmed or stopped waiting.
    pub fn confirm(&self) -> bool {
        self.gate.signal()
    }

    pub fn is_confirmed(&self) -> bool {
        self.gate.is_confirmed()
    }
}

/// Books flight, hotel and transport, then waits for the user to confirm.
///
/// Every completed booking pushes its cancellation onto a compensation stack.
/// A booking that runs out of retries unwinds that stack and the saga ends
/// [`SagaOutcome::CompensatedOnFailure`]. Once all bookings are made the saga
/// waits up to `confirmation_timeout` and then either confirms or cancels the
/// whole booking. The individual cancellations are not run on timeout.
///
/// Progress is journaled through the persister, so a saga continued by
/// another executor replays recorded steps instead of calling them again.
/// The confirm-or-cancel decision is journaled before its call is made and a
/// continued saga reuses it without waiting again.
pub struct TravelSaga<A, P> {
    lock_scope: LockScope,
    executor: StepExecutor<A>,
    persister: P,
    gate: Arc<ConfirmationGate>,
    confirmation_timeout: Duration,
    metrics: Arc<dyn SagaMetrics>,
}

impl<A, P> TravelSaga<A, P>
where
    A: TravelActivities,
    P: StepPersister + Send + Sync,
{
    pub fn new(
        lock_scope: LockScope,
        executor: StepExecutor<A>,
        persister: P,
        confirmation_timeout: Duration,
        metrics: Arc<dyn SagaMetrics>,
    ) -> Self {
        Self {
            lock_scope,
            executor,
            persister,
            gate: Arc::new(ConfirmationGate::new()),
            confirmation_timeout,
            metrics,
        }
    }

    pub fn handle(&self) -> SagaHandle {
        SagaHandle {
            key: self.lock_scope.key.clone(),
            gate: self.gate.clone(),
        }
    }

    pub fn confirm(&self) -> bool {
        self.gate.signal()
    }

    pub fn lock_scope(&self) -> &LockScope {
        &self.lock_scope
    }

    pub async fn run(self, request: BookingRequest) -> Result<SagaOutcome, SagaError> {
        self.persister
            .lock(self.lock_scope.clone(), LockType::Executing)
            .await?;
        let key = &self.lock_scope.key;
        let journal = match self.persister.retrieve(key).await {
            Ok(journal) => journal,
            Err(PersistError::NotFound) => SagaJournal::new(key.clone()),
            Err(e) => return Err(e.into()),
        };
        if !journal.states.contains_key(&INITIAL_STEP) {
            let state = serde_json::to_string(&request).map_err(PersistError::from)?;
            self.persister.store(key, INITIAL_STEP, state).await?;
        }

        let result = self.drive(&request, &journal).await;
        self.release(result).await
    }

    /// Picks a journaled saga up where its previous executor stopped.
    pub async fn continue_from_last_step(self) -> Result<SagaOutcome, SagaError> {
        self.persister
            .lock(self.lock_scope.clone(), LockType::Executing)
            .await?;
        let journal = self.persister.retrieve(&self.lock_scope.key).await?;
        let request = journal.request()?;
        log::info!(
            "Continuing saga {} from step {}",
            self.lock_scope.key,
            journal.last_step()
        );

        let result = self.drive(&request, &journal).await;
        self.release(result).await
    }

    async fn release(
        &self,
        result: Result<SagaOutcome, SagaError>,
    ) -> Result<SagaOutcome, SagaError> {
        let lock_type = if result.is_ok() {
            LockType::Finished
        } else {
            LockType::Failed
        };
        self.persister
            .lock(self.lock_scope.clone(), lock_type)
            .await?;
        result
    }

    async fn drive(
        &self,
        request: &BookingRequest,
        journal: &SagaJournal,
    ) -> Result<SagaOutcome, SagaError> {
        let key = &self.lock_scope.key;
        if let Some(outcome) = journal.outcome {
            log::info!("Saga {key} already finished as {outcome}");
            return Ok(outcome);
        }
        if journal.confirmed && !journal.states.contains_key(&DECISION_STEP) {
            self.gate.signal();
        }
        if journal.last_step() == INITIAL_STEP {
            log::info!("Starting travel booking for user: {}", request.user_id);
            self.metrics.saga_started(key);
        }

        let compensations = match self.book_forward(request, journal).await? {
            Forward::Booked(compensations) => compensations,
            Forward::Failed(compensations) => {
                return self.compensate(compensations, request).await
            }
        };
        log::debug!(
            "All bookings made for {key}, {} compensations registered",
            compensations.len()
        );

        let (activity, outcome) = self.decide(request, journal).await?;
        self.executor
            .execute(activity, request)
            .await
            .map_err(|source| SagaError::PostCompletion {
                key: key.clone(),
                source,
            })?;
        self.finish(outcome).await
    }

    /// Runs or replays the forward steps, pushing a compensation after each
    /// completed one.
    async fn book_forward(
        &self,
        request: &BookingRequest,
        journal: &SagaJournal,
    ) -> Result<Forward, SagaError> {
        let key = &self.lock_scope.key;
        let mut compensations = CompensationStack::new();
        for (index, activity) in FORWARD_STEPS.into_iter().enumerate() {
            let step = index as u8 + 1;
            let completed = match journal.step(step)? {
                Some(StepRecord::Completed(_)) => {
                    log::debug!("Replaying completed {activity} for {key}");
                    true
                }
                Some(StepRecord::Failed(_)) => false,
                Some(StepRecord::Decided(_)) => {
                    return Err(PersistError::UnexpectedRecord(step).into())
                }
                None => match self.executor.execute(activity, request).await {
                    Ok(()) => {
                        let state = StepRecord::Completed(activity).to_state()?;
                        self.persister.store(key, step, state).await?;
                        true
                    }
                    Err(failure) => {
                        log::error!(
                            "Error during travel booking for user: {}, initiating compensation: {failure}",
                            request.user_id
                        );
                        let state = StepRecord::Failed(activity).to_state()?;
                        self.persister.store(key, step, state).await?;
                        false
                    }
                },
            };

            if !completed {
                return Ok(Forward::Failed(compensations));
            }
            if let Some(compensation) = activity.compensation() {
                compensations.push(compensation);
            }
        }
        Ok(Forward::Booked(compensations))
    }

    /// Waits for confirmation and journals the resulting confirm or cancel
    /// call before it is made. A journaled decision is reused without waiting.
    async fn decide(
        &self,
        request: &BookingRequest,
        journal: &SagaJournal,
    ) -> Result<(Activity, SagaOutcome), SagaError> {
        let key = &self.lock_scope.key;
        if let Some(record) = journal.step(DECISION_STEP)? {
            self.gate.close();
            return match record {
                StepRecord::Decided(Activity::ConfirmBooking) => {
                    log::info!("Replaying confirmation decision for {key}");
                    Ok((Activity::ConfirmBooking, SagaOutcome::Confirmed))
                }
                StepRecord::Decided(Activity::CancelBooking) => {
                    log::info!("Replaying cancellation decision for {key}");
                    Ok((Activity::CancelBooking, SagaOutcome::CancelledByTimeout))
                }
                _ => Err(PersistError::UnexpectedRecord(DECISION_STEP).into()),
            };
        }

        log::info!(
            "Waiting for user confirmation for {:?}",
            self.confirmation_timeout
        );
        let decision = if self.gate.await_until(self.confirmation_timeout).await {
            log::info!("User confirmed the booking: {}", request.user_id);
            (Activity::ConfirmBooking, SagaOutcome::Confirmed)
        } else {
            log::info!(
                "User did not confirm within {:?}, cancelling the booking for user: {}",
                self.confirmation_timeout,
                request.user_id
            );
            (Activity::CancelBooking, SagaOutcome::CancelledByTimeout)
        };
        let state = StepRecord::Decided(decision.0).to_state()?;
        self.persister.store(key, DECISION_STEP, state).await?;
        Ok(decision)
    }

    async fn compensate(
        &self,
        compensations: CompensationStack<Activity>,
        request: &BookingRequest,
    ) -> Result<SagaOutcome, SagaError> {
        let failures = compensations
            .unwind_all(|activity| self.executor.execute(activity, request))
            .await;
        if !failures.is_empty() {
            log::error!(
                "Saga {} left {} compensations unfinished",
                self.lock_scope.key,
                failures.len()
            );
        }
        self.finish(SagaOutcome::CompensatedOnFailure).await
    }

    async fn finish(&self, outcome: SagaOutcome) -> Result<SagaOutcome, SagaError> {
        let key = &self.lock_scope.key;
        self.persister.store_outcome(key, outcome).await?;
        self.metrics.saga_finished(key, outcome);
        log::info!("Travel booking completed for user key {key}: {outcome}");
        Ok(outcome)
    }
}
