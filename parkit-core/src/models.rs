use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ParkingError, ParkingResult};

/// Vehicle class; each has its own pool of spots and its own hourly rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCategory {
    Car,
    Bike,
}

impl VehicleCategory {
    pub const ALL: [VehicleCategory; 2] = [VehicleCategory::Car, VehicleCategory::Bike];

    /// Resolve a terminal menu selection (1 = CAR, 2 = BIKE).
    pub fn from_selection(selection: i32) -> ParkingResult<Self> {
        match selection {
            1 => Ok(VehicleCategory::Car),
            2 => Ok(VehicleCategory::Bike),
            other => Err(ParkingError::InvalidCategory(other.to_string())),
        }
    }

    /// Name used in persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Car => "CAR",
            VehicleCategory::Bike => "BIKE",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleCategory {
    type Err = ParkingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAR" => Ok(VehicleCategory::Car),
            "BIKE" => Ok(VehicleCategory::Bike),
            _ => Err(ParkingError::UnknownCategory(s.to_string())),
        }
    }
}

/// What happens to the fare of a recurring user at exit.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoyaltyExitPolicy {
    /// Price is left at the value recorded at entry (0).
    #[default]
    WaiveFare,
    /// Price is computed with the loyalty discount applied.
    DiscountedFare,
}

/// A physical parking location. Only the availability flag ever changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParkingSpot {
    pub id: i32,
    pub category: VehicleCategory,
    pub is_available: bool,
}

impl ParkingSpot {
    pub fn new(id: i32, category: VehicleCategory, is_available: bool) -> Self {
        Self {
            id,
            category,
            is_available,
        }
    }

    pub fn occupy(&mut self) {
        self.is_available = false;
    }

    pub fn release(&mut self) {
        self.is_available = true;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketState {
    Open,
    Closed,
}

/// One vehicle visit: opened at entry, closed exactly once at exit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// Assigned by the ticket store; 0 until saved.
    pub id: i64,
    pub spot: ParkingSpot,
    pub vehicle_plate: String,
    pub price: Decimal,
    pub in_time: DateTime<Utc>,
    pub out_time: Option<DateTime<Utc>>,
    pub is_loyalty_user: bool,
}

impl Ticket {
    pub fn open(
        spot: ParkingSpot,
        vehicle_plate: String,
        in_time: DateTime<Utc>,
        is_loyalty_user: bool,
    ) -> Self {
        Self {
            id: 0,
            spot,
            vehicle_plate,
            price: Decimal::ZERO,
            in_time,
            out_time: None,
            is_loyalty_user,
        }
    }

    pub fn state(&self) -> TicketState {
        match self.out_time {
            Some(_) => TicketState::Closed,
            None => TicketState::Open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == TicketState::Open
    }

    /// Transition: Open → Closed.
    pub fn close(&mut self, out_time: DateTime<Utc>, price: Decimal) -> ParkingResult<()> {
        if !self.is_open() {
            return Err(ParkingError::TicketAlreadyClosed(self.vehicle_plate.clone()));
        }
        if out_time <= self.in_time {
            return Err(ParkingError::InvalidInterval(format!(
                "out time {} is not after in time {}",
                out_time, self.in_time
            )));
        }
        if price < Decimal::ZERO {
            return Err(ParkingError::NegativePrice(price));
        }

        self.out_time = Some(out_time);
        self.price = price;
        Ok(())
    }
}
