use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{activities::Activity, errors::PersistError};

use super::booking_request::{BookingRequest, SagaKey};

/// Step holding the serialized booking request.
pub const INITIAL_STEP: u8 = 0;
/// Step holding the confirm-or-cancel decision taken after the wait.
pub const DECISION_STEP: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaOutcome {
    Confirmed,
    CancelledByTimeout,
    CompensatedOnFailure,
}

impl fmt::Display for SagaOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::CancelledByTimeout => write!(f, "cancelled_by_timeout"),
            Self::CompensatedOnFailure => write!(f, "compensated_on_failure"),
        }
    }
}

/// What happened to a forward step, or which closing call the saga chose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "activity", rename_all = "snake_case")]
pub enum StepRecord {
    Completed(Activity),
    Failed(Activity),
    Decided(Activity),
}

impl StepRecord {
    pub fn to_state(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Everything needed to replay a saga: the request, the forward step log,
/// whether confirmation arrived and the terminal outcome once reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaJournal {
    pub key: SagaKey,
    pub states: BTreeMap<u8, String>,
    pub confirmed: bool,
    pub outcome: Option<SagaOutcome>,
}

impl SagaJournal {
    pub fn new(key: SagaKey) -> Self {
        Self {
            key,
            states: Default::default(),
            confirmed: false,
            outcome: None,
        }
    }

    pub fn last_step(&self) -> u8 {
        self.states.last_key_value().map(|(k, _)| *k).unwrap_or(0)
    }

    pub fn request(&self) -> Result<BookingRequest, PersistError> {
        let state = self
            .states
            .get(&INITIAL_STEP)
            .ok_or(PersistError::NotFound)?;
        Ok(serde_json::from_str(state)?)
    }

    pub fn step(&self, step: u8) -> Result<Option<StepRecord>, PersistError> {
        self.states
            .get(&step)
            .map(|s| serde_json::from_str(s).map_err(PersistError::from))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_journal_reads_back_request_and_steps() {
        let request = BookingRequest::new(
            "u1",
            "Paris",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        let mut journal = SagaJournal::new(request.key());
        journal
            .states
            .insert(INITIAL_STEP, serde_json::to_string(&request).unwrap());
        journal.states.insert(
            1,
            StepRecord::Completed(Activity::BookFlight).to_state().unwrap(),
        );
        journal.states.insert(
            2,
            StepRecord::Failed(Activity::BookHotel).to_state().unwrap(),
        );
        journal.states.insert(
            DECISION_STEP,
            StepRecord::Decided(Activity::CancelBooking)
                .to_state()
                .unwrap(),
        );

        assert_eq!(request, journal.request().unwrap());
        assert_eq!(DECISION_STEP, journal.last_step());
        assert_eq!(
            Some(StepRecord::Completed(Activity::BookFlight)),
            journal.step(1).unwrap()
        );
        assert_eq!(
            Some(StepRecord::Failed(Activity::BookHotel)),
            journal.step(2).unwrap()
        );
        assert_eq!(None, journal.step(3).unwrap());
        assert_eq!(
            Some(StepRecord::Decided(Activity::CancelBooking)),
            journal.step(DECISION_STEP).unwrap()
        );
    }

    #[test]
    fn test_missing_request_is_not_found() {
        let journal = SagaJournal::new(SagaKey::for_user("u1"));
        assert!(matches!(journal.request(), Err(PersistError::NotFound)));
        assert_eq!(0, journal.last_step());
    }

    #[test]
    fn test_corrupt_step_is_reported() {
        let mut journal = SagaJournal::new(SagaKey::for_user("u1"));
        journal.states.insert(1, "not json".to_string());
        assert!(matches!(journal.step(1), Err(PersistError::Serialize(_))));
    }
}
