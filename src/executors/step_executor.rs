use std::{sync::Arc, time::Duration};

use crate::{
    activities::{dispatch, Activity, TravelActivities},
    definitions::booking_request::BookingRequest,
    errors::{AttemptFailure, TerminalFailure},
    metrics::SagaMetrics,
};

/// How often and for how long a remote call is attempted.
///
/// `backoff` is slept between attempts. The zero default retries right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(10),
            backoff: Duration::ZERO,
        }
    }
}

pub struct StepExecutor<A> {
    activities: Arc<A>,
    policy: RetryPolicy,
    metrics: Arc<dyn SagaMetrics>,
}

impl<A> Clone for StepExecutor<A> {
    fn clone(&self) -> Self {
        Self {
            activities: self.activities.clone(),
            policy: self.policy,
            metrics: self.metrics.clone(),
        }
    }
}

impl<A> StepExecutor<A>
where
    A: TravelActivities,
{
    pub fn new(activities: Arc<A>, policy: RetryPolicy, metrics: Arc<dyn SagaMetrics>) -> Self {
        Self {
            activities,
            policy,
            metrics,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calls `activity` until it succeeds or the policy runs out of attempts.
    pub async fn execute(
        &self,
        activity: Activity,
        request: &BookingRequest,
    ) -> Result<(), TerminalFailure> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            log::trace!("executing {activity} attempt {attempt}/{attempts}");
            let call = dispatch(self.activities.as_ref(), activity, request);
            let failure = match tokio::time::timeout(self.policy.attempt_timeout, call).await {
                Ok(Ok(())) => {
                    self.metrics.step_attempted(activity, attempt, true);
                    return Ok(());
                }
                Ok(Err(e)) => AttemptFailure::Failed(e),
                Err(_) => AttemptFailure::TimedOut(self.policy.attempt_timeout),
            };
            self.metrics.step_attempted(activity, attempt, false);

            if attempt >= attempts {
                log::error!(
                    "{activity} for {} failed on final attempt {attempt}: {failure}",
                    request.key()
                );
                return Err(TerminalFailure {
                    activity,
                    attempts: attempt,
                    last: failure,
                });
            }
            log::warn!(
                "{activity} for {} failed on attempt {attempt}/{attempts}: {failure}",
                request.key()
            );
            if !self.policy.backoff.is_zero() {
                tokio::time::sleep(self.policy.backoff).await;
            }
        }
    }
}
