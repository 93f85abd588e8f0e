//! Reservation endpoints: booking, lifecycle transitions, payments

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
