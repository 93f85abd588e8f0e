//! Rate table
//!
//! Read-only price/duration lookup keyed by branch and customer type.

pub mod model;
pub mod repository;

pub use model::{select_rate, RateRow};
pub use repository::RateTable;
