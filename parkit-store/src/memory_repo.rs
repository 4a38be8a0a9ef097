use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use parkit_core::{ParkingSpot, SpotStore, StoreResult, Ticket, TicketStore, VehicleCategory};

#[derive(Debug, Default)]
struct LotState {
    spots: BTreeMap<i32, ParkingSpot>,
    tickets: Vec<Ticket>,
}

/// Process-local spot and ticket storage (will be swapped for Postgres in production)
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LotState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Car spots are numbered first, bike spots follow.
    pub fn seeded(car_spots: i32, bike_spots: i32) -> Self {
        let store = Self::new();
        {
            let mut state = store.state();
            let car = (1..=car_spots).map(|id| ParkingSpot::new(id, VehicleCategory::Car, true));
            let bike = (car_spots + 1..=car_spots + bike_spots)
                .map(|id| ParkingSpot::new(id, VehicleCategory::Bike, true));
            state.spots = car.chain(bike).map(|spot| (spot.id, spot)).collect();
        }
        store
    }

    pub fn spot(&self, id: i32) -> Option<ParkingSpot> {
        self.state().spots.get(&id).cloned()
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state().tickets.clone()
    }

    pub fn available_count(&self, category: VehicleCategory) -> usize {
        self.state()
            .spots
            .values()
            .filter(|s| s.category == category && s.is_available)
            .count()
    }

    fn state(&self) -> MutexGuard<'_, LotState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SpotStore for MemoryStore {
    async fn next_available_slot(&self, category: VehicleCategory) -> StoreResult<i32> {
        Ok(self
            .state()
            .spots
            .values()
            .find(|s| s.category == category && s.is_available)
            .map(|s| s.id)
            .unwrap_or(0))
    }

    async fn update_spot(&self, spot: &ParkingSpot) -> StoreResult<bool> {
        let mut state = self.state();
        match state.spots.get_mut(&spot.id) {
            Some(stored) => {
                stored.is_available = spot.is_available;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn save(&self, ticket: &Ticket) -> StoreResult<bool> {
        let mut state = self.state();
        if state
            .tickets
            .iter()
            .any(|t| t.vehicle_plate == ticket.vehicle_plate && t.is_open())
        {
            return Ok(false);
        }

        let mut ticket = ticket.clone();
        ticket.id = state.tickets.len() as i64 + 1;
        state.tickets.push(ticket);
        Ok(true)
    }

    async fn get_open_ticket_by_plate(&self, plate: &str) -> StoreResult<Option<Ticket>> {
        let state = self.state();
        let ticket = state
            .tickets
            .iter()
            .rev()
            .find(|t| t.vehicle_plate == plate && t.is_open())
            .cloned();

        // Hand out the spot as currently stored
        Ok(ticket.map(|mut t| {
            if let Some(spot) = state.spots.get(&t.spot.id) {
                t.spot = spot.clone();
            }
            t
        }))
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<bool> {
        let mut state = self.state();
        match state.tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(stored) => {
                stored.price = ticket.price;
                stored.out_time = ticket.out_time;
                stored.is_loyalty_user = ticket.is_loyalty_user;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_recurring_user(&self, plate: &str) -> StoreResult<bool> {
        Ok(self
            .state()
            .tickets
            .iter()
            .any(|t| t.vehicle_plate == plate && !t.is_open()))
    }
}
