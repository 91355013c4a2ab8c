use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{definitions::booking_request::BookingRequest, errors::ActivityError};

pub mod logging;

/// Remote operations a travel saga invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    BookFlight,
    CancelFlight,
    BookHotel,
    CancelHotel,
    ArrangeTransport,
    CancelTransport,
    CancelBooking,
    ConfirmBooking,
}

impl Activity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BookFlight => "book_flight",
            Self::CancelFlight => "cancel_flight",
            Self::BookHotel => "book_hotel",
            Self::CancelHotel => "cancel_hotel",
            Self::ArrangeTransport => "arrange_transport",
            Self::CancelTransport => "cancel_transport",
            Self::CancelBooking => "cancel_booking",
            Self::ConfirmBooking => "confirm_booking",
        }
    }

    /// The reversal paired with a forward booking step.
    pub fn compensation(&self) -> Option<Activity> {
        match self {
            Self::BookFlight => Some(Self::CancelFlight),
            Self::BookHotel => Some(Self::CancelHotel),
            Self::ArrangeTransport => Some(Self::CancelTransport),
            _ => None,
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Airline, hotel and transport systems as seen by the saga. Every call may
/// fail and is retried by the step executor.
#[async_trait]
pub trait TravelActivities: Send + Sync {
    async fn book_flight(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn cancel_flight(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn book_hotel(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn cancel_hotel(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn arrange_transport(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn cancel_transport(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn cancel_booking(&self, request: &BookingRequest) -> Result<(), ActivityError>;
    async fn confirm_booking(&self, request: &BookingRequest) -> Result<(), ActivityError>;
}

pub async fn dispatch<A: TravelActivities + ?Sized>(
    activities: &A,
    activity: Activity,
    request: &BookingRequest,
) -> Result<(), ActivityError> {
    match activity {
        Activity::BookFlight => activities.book_flight(request).await,
        Activity::CancelFlight => activities.cancel_flight(request).await,
        Activity::BookHotel => activities.book_hotel(request).await,
        Activity::CancelHotel => activities.cancel_hotel(request).await,
        Activity::ArrangeTransport => activities.arrange_transport(request).await,
        Activity::CancelTransport => activities.cancel_transport(request).await,
        Activity::CancelBooking => activities.cancel_booking(request).await,
        Activity::ConfirmBooking => activities.confirm_booking(request).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_forward_steps_have_compensations() {
        assert_eq!(
            Some(Activity::CancelFlight),
            Activity::BookFlight.compensation()
        );
        assert_eq!(Some(Activity::CancelHotel), Activity::BookHotel.compensation());
        assert_eq!(
            Some(Activity::CancelTransport),
            Activity::ArrangeTransport.compensation()
        );
        assert_eq!(None, Activity::ConfirmBooking.compensation());
        assert_eq!(None, Activity::CancelBooking.compensation());
        assert_eq!(None, Activity::CancelFlight.compensation());
    }

    #[test]
    fn test_serialized_name_matches_display() {
        let json = serde_json::to_string(&Activity::ArrangeTransport).unwrap();
        assert_eq!(format!("\"{}\"", Activity::ArrangeTransport), json);
    }
}
