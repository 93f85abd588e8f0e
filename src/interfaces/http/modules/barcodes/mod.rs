//! Barcode entry endpoints: confirmation, extra time, outside tracking

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
