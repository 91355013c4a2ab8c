use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    activities::{Activity, TravelActivities},
    definitions::booking_request::BookingRequest,
    errors::ActivityError,
};

pub fn paris_request() -> BookingRequest {
    BookingRequest::new("u1", "Paris", NaiveDate::from_ymd_opt(2025, 6, 1).unwrap())
}

/// Activities that record every attempt and fail or hang on demand.
#[derive(Debug, Default)]
pub struct ScriptedActivities {
    calls: Mutex<Vec<Activity>>,
    failures: Mutex<HashMap<Activity, u32>>,
    hanging: Mutex<HashMap<Activity, u32>>,
}

impl ScriptedActivities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the first `times` attempts of `activity`.
    pub fn fails(self, activity: Activity, times: u32) -> Self {
        self.failures.lock().unwrap().insert(activity, times);
        self
    }

    pub fn always_fails(self, activity: Activity) -> Self {
        self.fails(activity, u32::MAX)
    }

    /// Never answers the first `times` attempts of `activity`.
    pub fn hangs_first(self, activity: Activity, times: u32) -> Self {
        self.hanging.lock().unwrap().insert(activity, times);
        self
    }

    pub fn hangs(self, activity: Activity) -> Self {
        self.hangs_first(activity, u32::MAX)
    }

    /// Every attempt in call order.
    pub fn calls(&self) -> Vec<Activity> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, activity: Activity) -> usize {
        self.calls().into_iter().filter(|a| *a == activity).count()
    }

    /// Calls with consecutive retries of the same activity collapsed.
    pub fn distinct_calls(&self) -> Vec<Activity> {
        let mut calls = self.calls();
        calls.dedup();
        calls
    }

    async fn attempt(&self, activity: Activity) -> Result<(), ActivityError> {
        self.calls.lock().unwrap().push(activity);
        if Self::take(&self.hanging, activity) {
            std::future::pending::<()>().await;
        }
        if Self::take(&self.failures, activity) {
            Err(ActivityError::new(format!("{activity} unavailable")))
        } else {
            Ok(())
        }
    }

    fn take(remaining: &Mutex<HashMap<Activity, u32>>, activity: Activity) -> bool {
        match remaining.lock().unwrap().get_mut(&activity) {
            Some(times) if *times > 0 => {
                *times -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl TravelActivities for ScriptedActivities {
    async fn book_flight(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::BookFlight).await
    }

    async fn cancel_flight(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::CancelFlight).await
    }

    async fn book_hotel(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::BookHotel).await
    }

    async fn cancel_hotel(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::CancelHotel).await
    }

    async fn arrange_transport(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::ArrangeTransport).await
    }

    async fn cancel_transport(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::CancelTransport).await
    }

    async fn cancel_booking(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::CancelBooking).await
    }

    async fn confirm_booking(&self, _request: &BookingRequest) -> Result<(), ActivityError> {
        self.attempt(Activity::ConfirmBooking).await
    }
}
