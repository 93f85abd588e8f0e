//! Reservation aggregate
//!
//! Contains the Reservation entity, its state machine and status
//! projection, and the repository interface.

pub mod model;
pub mod repository;

pub use model::{
    project_status, reservation_end_time, CustomerTypeCount, NewCustomerTypeCount, NewPayment,
    NewReservation, Payment, PaymentRecordStatus, PaymentStatus, Reservation, ReservationDetail,
    ReservationStatus,
};
pub use repository::ReservationRepository;
