//! Barcode aggregate
//!
//! Contains the barcode entry entity, its extra-time ledger and
//! outside-tracker, and the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    assign_barcode_numbers, generate_barcode_number, is_generated_number, BarcodeEntry,
    BarcodeStatus, ExtraMinutesPolicy, ExtraTimeCharge, ExtraTimeQuote, NewBarcodeEntry,
    OutsideTrackEntry,
};
pub use repository::BarcodeRepository;
