//! Domain layer: admission aggregates, their invariants and repository ports

pub mod barcode;
pub mod directory;
pub mod money;
pub mod rate;
pub mod repositories;
pub mod reservation;
pub mod scan;

pub use barcode::{BarcodeEntry, BarcodeStatus, ExtraMinutesPolicy, ExtraTimeCharge, OutsideTrackEntry};
pub use directory::{Branch, Customer};
pub use rate::RateRow;
pub use repositories::{DomainResult, RepositoryProvider};
pub use reservation::{
    PaymentStatus, Reservation, ReservationDetail, ReservationStatus,
};
pub use scan::ScanQuery;

pub use crate::shared::errors::DomainError;
