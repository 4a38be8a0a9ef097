use std::sync::Arc;

use chrono::{DateTime, Utc};
use parkit_core::{
    normalize_plate, Clock, InputSource, LoyaltyExitPolicy, ParkingError, ParkingResult,
    ParkingSpot, SpotStore, SystemClock, Ticket, TicketStore, VehicleCategory,
};
use parkit_fare::{round2, FarePolicy};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::allocator::SpotAllocator;
use crate::locks::PlateLocks;

/// What the driver is told after a successful entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryReceipt {
    pub plate: String,
    pub spot_id: i32,
    pub category: VehicleCategory,
    pub in_time: DateTime<Utc>,
    pub is_loyalty_user: bool,
}

/// What the driver is told after a successful exit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExitReceipt {
    pub plate: String,
    pub spot_id: i32,
    pub category: VehicleCategory,
    pub price: Decimal,
    pub in_time: DateTime<Utc>,
    pub out_time: DateTime<Utc>,
    pub is_loyalty_user: bool,
}

/// Drives a visit through NONE → OPEN → CLOSED against the two stores.
pub struct TicketLifecycleManager {
    allocator: SpotAllocator,
    fare_policy: FarePolicy,
    spots: Arc<dyn SpotStore>,
    tickets: Arc<dyn TicketStore>,
    clock: Arc<dyn Clock>,
    loyalty_exit_policy: LoyaltyExitPolicy,
    plate_locks: PlateLocks,
    // Held from spot lookup until the spot is persisted as taken
    allocation: Mutex<()>,
}

impl TicketLifecycleManager {
    pub fn new(
        spots: Arc<dyn SpotStore>,
        tickets: Arc<dyn TicketStore>,
        fare_policy: FarePolicy,
    ) -> Self {
        Self {
            allocator: SpotAllocator::new(spots.clone()),
            fare_policy,
            spots,
            tickets,
            clock: Arc::new(SystemClock),
            loyalty_exit_policy: LoyaltyExitPolicy::default(),
            plate_locks: PlateLocks::new(),
            allocation: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_loyalty_exit_policy(mut self, policy: LoyaltyExitPolicy) -> Self {
        self.loyalty_exit_policy = policy;
        self
    }

    /// Read the plate from `input`, then run the entry.
    pub async fn process_incoming_vehicle(
        &self,
        input: &dyn InputSource,
    ) -> ParkingResult<EntryReceipt> {
        let plate = input.read_plate()?;
        self.process_entry(&plate, input).await
    }

    /// Vehicle enters: reserve a spot and open a ticket.
    pub async fn process_entry(
        &self,
        plate: &str,
        input: &dyn InputSource,
    ) -> ParkingResult<EntryReceipt> {
        let plate = normalize_plate(plate)?;
        let _plate_guard = self.plate_locks.acquire(&plate).await;

        if self.load_open_ticket(&plate).await?.is_some() {
            tracing::warn!("Vehicle {} is already parked", plate);
            return Err(ParkingError::VehicleAlreadyParked(plate));
        }

        let category = VehicleCategory::from_selection(input.read_category_selection()?)
            .inspect_err(|e| tracing::warn!("Error parsing user input for type of vehicle: {}", e))?;

        let (spot, is_loyalty_user) = {
            let _allocation = self.allocation.lock().await;

            let spot = self.allocator.allocate(category).await?;
            let is_loyalty_user = self.is_recurring_user(&plate).await?;
            self.persist_spot(&spot).await?;

            (spot, is_loyalty_user)
        };

        if is_loyalty_user {
            tracing::info!(
                "Welcome back {}! As a recurring user you benefit from a {}% discount",
                plate,
                self.discount_percent()
            );
        }

        let in_time = self.clock.now();
        let ticket = Ticket::open(spot.clone(), plate.clone(), in_time, is_loyalty_user);

        if let Err(e) = self.save_ticket(&ticket).await {
            self.undo_reservation(spot).await;
            return Err(e);
        }

        tracing::info!(
            "Vehicle {} parked in {} spot {} at {}",
            plate,
            category,
            spot.id,
            in_time
        );

        Ok(EntryReceipt {
            plate,
            spot_id: spot.id,
            category,
            in_time,
            is_loyalty_user,
        })
    }

    /// Vehicle leaves: price and close the open ticket, then free the spot.
    pub async fn process_exit(&self, plate: &str) -> ParkingResult<ExitReceipt> {
        let plate = normalize_plate(plate)?;
        let _plate_guard = self.plate_locks.acquire(&plate).await;

        let mut ticket = self
            .load_open_ticket(&plate)
            .await?
            .ok_or_else(|| ParkingError::TicketNotFound(plate.clone()))?;

        let out_time = self.clock.now();
        let category = ticket.spot.category;

        let price = if self.is_recurring_user(&plate).await? {
            ticket.is_loyalty_user = true;
            match self.loyalty_exit_policy {
                LoyaltyExitPolicy::WaiveFare => round2(ticket.price),
                LoyaltyExitPolicy::DiscountedFare => self.fare_policy.compute_fare(
                    category,
                    ticket.in_time,
                    Some(out_time),
                    true,
                )?,
            }
        } else {
            self.fare_policy
                .compute_fare(category, ticket.in_time, Some(out_time), false)?
        };

        ticket.close(out_time, price)?;

        match self.tickets.update(&ticket).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!("Unable to update ticket {} for vehicle {}", ticket.id, plate);
                return Err(ParkingError::TicketUpdateFailed(plate));
            }
            Err(e) => {
                tracing::error!("Error updating ticket {} for vehicle {}: {}", ticket.id, plate, e);
                return Err(ParkingError::storage(e));
            }
        }

        let mut spot = ticket.spot.clone();
        spot.release();
        self.persist_spot(&spot).await?;

        tracing::info!(
            "Vehicle {} left spot {} at {}, fare {}",
            plate,
            spot.id,
            out_time,
            ticket.price
        );

        Ok(ExitReceipt {
            plate,
            spot_id: spot.id,
            category,
            price: ticket.price,
            in_time: ticket.in_time,
            out_time,
            is_loyalty_user: ticket.is_loyalty_user,
        })
    }

    /// The running ticket of a parked vehicle.
    pub async fn open_ticket(&self, plate: &str) -> ParkingResult<Ticket> {
        let plate = normalize_plate(plate)?;
        self.load_open_ticket(&plate)
            .await?
            .ok_or(ParkingError::TicketNotFound(plate))
    }

    async fn load_open_ticket(&self, plate: &str) -> ParkingResult<Option<Ticket>> {
        self.tickets.get_open_ticket_by_plate(plate).await.map_err(|e| {
            tracing::error!("Error loading ticket for vehicle {}: {}", plate, e);
            ParkingError::storage(e)
        })
    }

    async fn is_recurring_user(&self, plate: &str) -> ParkingResult<bool> {
        self.tickets.is_recurring_user(plate).await.map_err(|e| {
            tracing::error!("Error checking recurring status of {}: {}", plate, e);
            ParkingError::storage(e)
        })
    }

    async fn persist_spot(&self, spot: &ParkingSpot) -> ParkingResult<()> {
        match self.spots.update_spot(spot).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::error!("Spot {} was not updated", spot.id);
                Err(ParkingError::SpotUpdateFailed(spot.id))
            }
            Err(e) => {
                tracing::error!("Error updating spot {}: {}", spot.id, e);
                Err(ParkingError::storage(e))
            }
        }
    }

    async fn save_ticket(&self, ticket: &Ticket) -> ParkingResult<()> {
        match self.tickets.save(ticket).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::error!("Ticket for vehicle {} was not saved", ticket.vehicle_plate);
                Err(ParkingError::TicketSaveFailed(ticket.vehicle_plate.clone()))
            }
            Err(e) => {
                tracing::error!("Error saving ticket for vehicle {}: {}", ticket.vehicle_plate, e);
                Err(ParkingError::storage(e))
            }
        }
    }

    /// Compensation for an entry whose ticket could not be written.
    async fn undo_reservation(&self, mut spot: ParkingSpot) {
        spot.release();
        match self.spots.update_spot(&spot).await {
            Ok(true) => tracing::warn!("Released spot {} after failed entry", spot.id),
            Ok(false) => tracing::error!("Spot {} stays reserved without a ticket", spot.id),
            Err(e) => tracing::error!(
                "Spot {} stays reserved without a ticket: {}",
                spot.id,
                e
            ),
        }
    }

    fn discount_percent(&self) -> Decimal {
        ((Decimal::ONE - self.fare_policy.config().loyalty_discount) * Decimal::ONE_HUNDRED).normalize()
    }
}
