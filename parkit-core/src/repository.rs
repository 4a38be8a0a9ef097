use async_trait::async_trait;

use crate::models::{ParkingSpot, Ticket, VehicleCategory};

/// Opaque failure reported by a store implementation.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository trait for spot availability
#[async_trait]
pub trait SpotStore: Send + Sync {
    /// Lowest-numbered available spot of `category`, or 0 when the pool is full.
    async fn next_available_slot(&self, category: VehicleCategory) -> StoreResult<i32>;

    /// Persist the availability flag of `spot`. `false` when no row was written.
    async fn update_spot(&self, spot: &ParkingSpot) -> StoreResult<bool>;
}

/// Repository trait for ticket records
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Insert a new open ticket. `false` when the record was not written.
    async fn save(&self, ticket: &Ticket) -> StoreResult<bool>;

    /// Most recent ticket of `plate` that has no out-time.
    async fn get_open_ticket_by_plate(&self, plate: &str) -> StoreResult<Option<Ticket>>;

    /// Persist price and out-time of a closed ticket.
    async fn update(&self, ticket: &Ticket) -> StoreResult<bool>;

    /// Whether `plate` has completed at least one earlier visit.
    async fn is_recurring_user(&self, plate: &str) -> StoreResult<bool>;
}
