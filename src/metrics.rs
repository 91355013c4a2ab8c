use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    activities::Activity,
    definitions::{booking_request::SagaKey, saga_journal::SagaOutcome},
};

/// Counters a saga reports while it runs. Passed in rather than global so
/// callers decide where they go.
pub trait SagaMetrics: Send + Sync {
    fn saga_started(&self, key: &SagaKey);
    fn step_attempted(&self, activity: Activity, attempt: u32, succeeded: bool);
    fn saga_finished(&self, key: &SagaKey, outcome: SagaOutcome);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl SagaMetrics for NoopMetrics {
    fn saga_started(&self, _key: &SagaKey) {}
    fn step_attempted(&self, _activity: Activity, _attempt: u32, _succeeded: bool) {}
    fn saga_finished(&self, _key: &SagaKey, _outcome: SagaOutcome) {}
}

/// Named counters kept in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryMetrics {
    counters: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .expect("metrics lock")
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    fn increment(&self, name: String) {
        *self
            .counters
            .write()
            .expect("metrics lock")
            .entry(name)
            .or_default() += 1;
    }
}

impl SagaMetrics for InMemoryMetrics {
    fn saga_started(&self, _key: &SagaKey) {
        self.increment("saga_started".to_string());
    }

    fn step_attempted(&self, activity: Activity, _attempt: u32, succeeded: bool) {
        self.increment(format!("attempt.{activity}"));
        if !succeeded {
            self.increment(format!("attempt_failed.{activity}"));
        }
    }

    fn saga_finished(&self, _key: &SagaKey, outcome: SagaOutcome) {
        self.increment(format!("outcome.{outcome}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = InMemoryMetrics::new();
        let key = SagaKey::for_user("u1");
        metrics.saga_started(&key);
        metrics.step_attempted(Activity::BookFlight, 1, false);
        metrics.step_attempted(Activity::BookFlight, 2, true);
        metrics.saga_finished(&key, SagaOutcome::Confirmed);

        assert_eq!(1, metrics.counter("saga_started"));
        assert_eq!(2, metrics.counter("attempt.book_flight"));
        assert_eq!(1, metrics.counter("attempt_failed.book_flight"));
        assert_eq!(1, metrics.counter("outcome.confirmed"));
        assert_eq!(0, metrics.counter("outcome.cancelled_by_timeout"));
    }
}
