pub mod booking_request;
pub mod compensation;
pub mod confirmation;
pub mod saga_journal;
pub mod travel_saga;
