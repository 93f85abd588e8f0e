//! Application layer: engine services, writer locks and event bus

pub mod engine;
pub mod events;
pub mod locks;
pub mod services;
pub mod settings;

pub use engine::{SessionEngine, SharedEngine};
pub use events::{create_event_bus, Event, EventBus, EventSubscriber, SharedEventBus};
pub use services::{
    CreateReservation, CustomerTypeLine, ExtraTimeReceipt, InitialPayment, RecordPayment,
    ScanOutcome,
};
pub use settings::{BarcodeIssuance, EngineSettings};
