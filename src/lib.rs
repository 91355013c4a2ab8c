//! Trip booking as a saga: flight, hotel and transport are booked in order,
//! undone in reverse if one of them cannot be made, and confirmed or
//! cancelled as a whole once the user answers or the confirmation window
//! closes.

pub mod activities;
pub mod config;
pub mod definitions;
pub mod errors;
pub mod executors;
pub mod metrics;
pub mod persisters;
pub mod registry;

#[cfg(test)]
mod testing;
