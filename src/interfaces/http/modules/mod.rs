pub mod barcodes;
pub mod health;
pub mod metrics;
pub mod rates;
pub mod reservations;
pub mod scan;
