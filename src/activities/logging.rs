use async_trait::async_trait;

use crate::{definitions::booking_request::BookingRequest, errors::ActivityError};

use super::TravelActivities;

/// Activities that only log what a real integration would do.
#[derive(Debug, Default, Clone)]
pub struct LoggingActivities {
    fail_transport: bool,
}

impl LoggingActivities {
    /// Every `arrange_transport` call fails, which drives the saga into
    /// compensation.
    pub fn failing_transport() -> Self {
        Self {
            fail_transport: true,
        }
    }
}

#[async_trait]
impl TravelActivities for LoggingActivities {
    async fn book_flight(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!(
            "Flight booked for user: {} to destination: {} on date: {}",
            request.user_id,
            request.destination,
            request.travel_date
        );
        Ok(())
    }

    async fn cancel_flight(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!("Cancelling flight for user {}", request.user_id);
        Ok(())
    }

    async fn book_hotel(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!(
            "Hotel booked for user: {} at destination: {} on date: {}",
            request.user_id,
            request.destination,
            request.travel_date
        );
        Ok(())
    }

    async fn cancel_hotel(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!("Cancelling hotel for user {}", request.user_id);
        Ok(())
    }

    async fn arrange_transport(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        if self.fail_transport {
            return Err(ActivityError::new(format!(
                "no transport available at {}",
                request.destination
            )));
        }
        log::info!(
            "Transport arranged for user: {} at destination: {} on date: {}",
            request.user_id,
            request.destination,
            request.travel_date
        );
        Ok(())
    }

    async fn cancel_transport(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!("Cancelling transport for user {}", request.user_id);
        Ok(())
    }

    async fn cancel_booking(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!(
            "Cancelling booking for user: {} at destination: {} on date: {}",
            request.user_id,
            request.destination,
            request.travel_date
        );
        Ok(())
    }

    async fn confirm_booking(&self, request: &BookingRequest) -> Result<(), ActivityError> {
        log::info!(
            "Booking confirmed for user: {} at destination: {} on date: {}",
            request.user_id,
            request.destination,
            request.travel_date
        );
        Ok(())
    }
}
