//! Database entities module

pub mod barcode_entry;
pub mod branch;
pub mod customer;
pub mod customer_type;
pub mod extra_time_charge;
pub mod outside_track_entry;
pub mod rate_row;
pub mod reservation;
pub mod reservation_customer_count;
pub mod reservation_payment;

pub use barcode_entry::Entity as BarcodeEntry;
pub use branch::Entity as Branch;
pub use customer::Entity as Customer;
pub use customer_type::Entity as CustomerType;
pub use extra_time_charge::Entity as ExtraTimeCharge;
pub use outside_track_entry::Entity as OutsideTrackEntry;
pub use rate_row::Entity as RateRow;
pub use reservation::Entity as Reservation;
pub use reservation_customer_count::Entity as ReservationCustomerCount;
pub use reservation_payment::Entity as ReservationPayment;
