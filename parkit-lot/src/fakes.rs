//! Recording store doubles for the allocator and manager tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use parkit_core::{
    InputSource, ParkingResult, ParkingSpot, SpotStore, StoreResult, Ticket, TicketStore,
    VehicleCategory,
};

#[derive(Default)]
struct SpotState {
    fixed_next: Option<i32>,
    spots: BTreeMap<i32, ParkingSpot>,
    queried: Vec<VehicleCategory>,
    updates: Vec<ParkingSpot>,
    fail_queries: bool,
    fail_updates: bool,
    reject_releases: bool,
    fail_releases: bool,
}

#[derive(Default)]
pub struct FakeSpotStore {
    state: Mutex<SpotState>,
}

impl FakeSpotStore {
    /// Always answers `id`, whatever the category.
    pub fn with_next(id: i32) -> Self {
        let store = Self::default();
        store.state().fixed_next = Some(id);
        store
    }

    /// Answers from a real availability table.
    pub fn with_spots(spots: Vec<ParkingSpot>) -> Self {
        let store = Self::default();
        store.state().spots = spots.into_iter().map(|s| (s.id, s)).collect();
        store
    }

    pub fn fail_queries(&self) {
        self.state().fail_queries = true;
    }

    pub fn fail_updates(&self) {
        self.state().fail_updates = true;
    }

    pub fn reject_releases(&self) {
        self.state().reject_releases = true;
    }

    pub fn fail_releases(&self) {
        self.state().fail_releases = true;
    }

    pub fn queried(&self) -> Vec<VehicleCategory> {
        self.state().queried.clone()
    }

    /// Every update attempted, including failed ones.
    pub fn updates(&self) -> Vec<ParkingSpot> {
        self.state().updates.clone()
    }

    pub fn spot(&self, id: i32) -> Option<ParkingSpot> {
        self.state().spots.get(&id).cloned()
    }

    fn state(&self) -> MutexGuard<'_, SpotState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl SpotStore for FakeSpotStore {
    async fn next_available_slot(&self, category: VehicleCategory) -> StoreResult<i32> {
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.queried.push(category);
        if state.fail_queries {
            return Err("connection refused".into());
        }
        if let Some(id) = state.fixed_next {
            return Ok(id);
        }

        Ok(state
            .spots
            .values()
            .find(|s| s.category == category && s.is_available)
            .map(|s| s.id)
            .unwrap_or(0))
    }

    async fn update_spot(&self, spot: &ParkingSpot) -> StoreResult<bool> {
        tokio::task::yield_now().await;

        let mut state = self.state();
        state.updates.push(spot.clone());
        if state.fail_updates || (spot.is_available && state.fail_releases) {
            return Err("connection reset".into());
        }
        if spot.is_available && state.reject_releases {
            return Ok(false);
        }

        state.spots.insert(spot.id, spot.clone());
        Ok(true)
    }
}

#[derive(Default)]
struct TicketState {
    tickets: Vec<Ticket>,
    recurring: HashSet<String>,
    save_attempts: usize,
    update_attempts: usize,
    fail_saves: bool,
    reject_saves: bool,
    reject_updates: bool,
    fail_lookups: bool,
    stored_category: Option<String>,
}

#[derive(Default)]
pub struct FakeTicketStore {
    state: Mutex<TicketState>,
}

impl FakeTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(ticket: Ticket) -> Self {
        let store = Self::default();
        store.insert(ticket);
        store
    }

    pub fn insert(&self, mut ticket: Ticket) {
        let mut state = self.state();
        ticket.id = state.tickets.len() as i64 + 1;
        state.tickets.push(ticket);
    }

    pub fn mark_recurring(&self, plate: &str) {
        self.state().recurring.insert(plate.to_string());
    }

    pub fn fail_saves(&self) {
        self.state().fail_saves = true;
    }

    pub fn reject_saves(&self) {
        self.state().reject_saves = true;
    }

    pub fn reject_updates(&self) {
        self.state().reject_updates = true;
    }

    pub fn fail_lookups(&self) {
        self.state().fail_lookups = true;
    }

    /// Read the spot category of looked-up tickets back from `name`.
    pub fn store_category_as(&self, name: &str) {
        self.state().stored_category = Some(name.to_string());
    }

    pub fn tickets(&self) -> Vec<Ticket> {
        self.state().tickets.clone()
    }

    pub fn save_attempts(&self) -> usize {
        self.state().save_attempts
    }

    pub fn update_attempts(&self) -> usize {
        self.state().update_attempts
    }

    fn state(&self) -> MutexGuard<'_, TicketState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl TicketStore for FakeTicketStore {
    async fn save(&self, ticket: &Ticket) -> StoreResult<bool> {
        let mut state = self.state();
        state.save_attempts += 1;
        if state.fail_saves {
            return Err("disk full".into());
        }
        if state.reject_saves {
            return Ok(false);
        }

        let mut ticket = ticket.clone();
        ticket.id = state.tickets.len() as i64 + 1;
        state.tickets.push(ticket);
        Ok(true)
    }

    async fn get_open_ticket_by_plate(&self, plate: &str) -> StoreResult<Option<Ticket>> {
        let state = self.state();
        if state.fail_lookups {
            return Err("connection refused".into());
        }

        let ticket = state
            .tickets
            .iter()
            .rev()
            .find(|t| t.vehicle_plate == plate && t.is_open())
            .cloned();

        match (ticket, &state.stored_category) {
            (Some(mut ticket), Some(name)) => {
                ticket.spot.category = name.parse()?;
                Ok(Some(ticket))
            }
            (ticket, _) => Ok(ticket),
        }
    }

    async fn update(&self, ticket: &Ticket) -> StoreResult<bool> {
        let mut state = self.state();
        state.update_attempts += 1;
        if state.reject_updates {
            return Ok(false);
        }

        match state.tickets.iter_mut().find(|t| t.id == ticket.id) {
            Some(stored) => {
                *stored = ticket.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_recurring_user(&self, plate: &str) -> StoreResult<bool> {
        Ok(self.state().recurring.contains(plate))
    }
}

/// Fixed operator answers.
pub struct StaticInput {
    pub selection: i32,
    pub plate: String,
}

impl StaticInput {
    pub fn new(selection: i32, plate: &str) -> Self {
        Self {
            selection,
            plate: plate.to_string(),
        }
    }
}

impl InputSource for StaticInput {
    fn read_category_selection(&self) -> ParkingResult<i32> {
        Ok(self.selection)
    }

    fn read_plate(&self) -> ParkingResult<String> {
        parkit_core::normalize_plate(&self.plate)
    }
}
