use rust_decimal::Decimal;

pub mod models;
pub mod repository;
pub mod input;
pub mod clock;

pub use models::{ParkingSpot, Ticket, TicketState, VehicleCategory, LoyaltyExitPolicy};
pub use repository::{SpotStore, TicketStore, StoreError, StoreResult};
pub use input::{InputSource, normalize_plate};
pub use clock::{Clock, SystemClock, ManualClock};

/// Every way an entry, exit or fare computation can fail.
#[derive(Debug, thiserror::Error)]
pub enum ParkingError {
    #[error("Invalid vehicle category selection: {0}")]
    InvalidCategory(String),
    #[error("Unknown vehicle category: {0}")]
    UnknownCategory(String),
    #[error("Invalid vehicle plate: {0}")]
    InvalidPlate(String),
    #[error("No parking spot available for {0}")]
    NoSpotAvailable(VehicleCategory),
    #[error("Invalid stay interval: {0}")]
    InvalidInterval(String),
    #[error("No open ticket for vehicle {0}")]
    TicketNotFound(String),
    #[error("Vehicle {0} already has an open ticket")]
    VehicleAlreadyParked(String),
    #[error("Ticket for vehicle {0} is already closed")]
    TicketAlreadyClosed(String),
    #[error("Failed to save ticket for vehicle {0}")]
    TicketSaveFailed(String),
    #[error("Failed to update ticket for vehicle {0}")]
    TicketUpdateFailed(String),
    #[error("Failed to update parking spot {0}")]
    SpotUpdateFailed(i32),
    #[error("Refusing to charge a negative price: {0}")]
    NegativePrice(Decimal),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl ParkingError {
    /// Wrap an opaque store failure. Domain errors raised inside a store
    /// (e.g. an unparseable stored category) are passed through unchanged.
    pub fn storage(err: StoreError) -> Self {
        match err.downcast::<ParkingError>() {
            Ok(err) => *err,
            Err(err) => ParkingError::StorageUnavailable(err.to_string()),
        }
    }
}

pub type ParkingResult<T> = Result<T, ParkingError>;
