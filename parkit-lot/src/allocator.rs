use std::sync::Arc;

use parkit_core::{ParkingError, ParkingResult, ParkingSpot, SpotStore, VehicleCategory};

/// Picks the spot a vehicle should park in
pub struct SpotAllocator {
    spots: Arc<dyn SpotStore>,
}

impl SpotAllocator {
    pub fn new(spots: Arc<dyn SpotStore>) -> Self {
        Self { spots }
    }

    /// Reserve the next free spot of `category`.
    ///
    /// The returned handle is already marked unavailable so the caller can
    /// persist it as-is. Nothing is written here.
    pub async fn allocate(&self, category: VehicleCategory) -> ParkingResult<ParkingSpot> {
        let spot_id = self
            .spots
            .next_available_slot(category)
            .await
            .map_err(|e| {
                tracing::error!("Error fetching next available {} spot: {}", category, e);
                ParkingError::storage(e)
            })?;

        if spot_id <= 0 {
            tracing::warn!("Parking slots for {} might be full", category);
            return Err(ParkingError::NoSpotAvailable(category));
        }

        Ok(ParkingSpot::new(spot_id, category, false))
    }
}
