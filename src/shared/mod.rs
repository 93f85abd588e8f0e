pub mod clock;
pub mod errors;
pub mod shutdown;

pub use clock::{Clock, FixedClock, SharedClock, SystemClock};
pub use errors::{AppError, DomainError, InfraError};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
