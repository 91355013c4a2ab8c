use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identity of a running saga, derived from the user it books for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SagaKey(String);

impl SagaKey {
    pub fn for_user(user_id: &str) -> Self {
        Self(format!("travel_{user_id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SagaKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub user_id: String,
    pub destination: String,
    pub travel_date: NaiveDate,
}

impl BookingRequest {
    pub fn new(
        user_id: impl Into<String>,
        destination: impl Into<String>,
        travel_date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            destination: destination.into(),
            travel_date,
        }
    }

    pub fn key(&self) -> SagaKey {
        SagaKey::for_user(&self.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_derived_from_user() {
        let request = BookingRequest::new(
            "u1",
            "Paris",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        );
        assert_eq!("travel_u1", request.key().as_str());
        assert_eq!(SagaKey::for_user("u1"), request.key());
    }

    #[test]
    fn test_request_uses_camel_case_fields() {
        let request: BookingRequest = serde_json::from_str(
            r#"{"userId":"u1","destination":"Paris","travelDate":"2025-06-01"}"#,
        )
        .unwrap();
        assert_eq!("u1", request.user_id);
        assert_eq!(
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            request.travel_date
        );
    }
}
