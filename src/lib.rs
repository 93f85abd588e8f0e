//! # Admission service
//!
//! Session & billing engine for pay-to-play venues: bookings, per-guest
//! barcode tickets, the extra-time ledger, outside tracking and scan
//! resolution.
//!
//! ## Architecture
//!
//! - **domain**: entities, value types, time arithmetic and repository traits
//! - **application**: the engine and its services, writer locks, event bus
//! - **infrastructure**: SeaORM persistence and the in-memory store
//! - **interfaces**: REST API with Swagger documentation
//! - **config** / **server**: TOML configuration and runtime bootstrap
//! - **shared**: errors, clock, shutdown signal

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use application::{create_event_bus, Event, EventBus, SessionEngine, SharedEngine, SharedEventBus};
pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};
pub use interfaces::http::{create_api_router, ApiContext};
