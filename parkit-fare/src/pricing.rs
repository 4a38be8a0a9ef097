use chrono::{DateTime, Utc};
use parkit_core::{ParkingError, ParkingResult, VehicleCategory};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: i64 = 3600;

/// Rates and rules the fare is computed from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareConfig {
    /// Currency units per hour for a car
    pub car_rate_per_hour: Decimal,

    /// Currency units per hour for a bike
    pub bike_rate_per_hour: Decimal,

    /// Stays up to and including this many seconds are free
    pub free_period_seconds: i64,

    /// Multiplier applied to recurring users (0.95 = 5% off)
    pub loyalty_discount: Decimal,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            car_rate_per_hour: dec!(1.5),
            bike_rate_per_hour: dec!(1.0),
            free_period_seconds: 1800,
            loyalty_discount: dec!(0.95),
        }
    }
}

impl FareConfig {
    pub fn hourly_rate(&self, category: VehicleCategory) -> Decimal {
        match category {
            VehicleCategory::Car => self.car_rate_per_hour,
            VehicleCategory::Bike => self.bike_rate_per_hour,
        }
    }
}

/// Stateless fare calculator. Cheap to clone; inject one per manager.
#[derive(Debug, Clone, Default)]
pub struct FarePolicy {
    config: FareConfig,
}

impl FarePolicy {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FareConfig {
        &self.config
    }

    /// Price of a stay from `in_time` to `out_time`.
    pub fn compute_fare(
        &self,
        category: VehicleCategory,
        in_time: DateTime<Utc>,
        out_time: Option<DateTime<Utc>>,
        is_loyalty_user: bool,
    ) -> ParkingResult<Decimal> {
        let out_time = out_time
            .ok_or_else(|| ParkingError::InvalidInterval("out time is missing".to_string()))?;

        if out_time <= in_time {
            return Err(ParkingError::InvalidInterval(format!(
                "out time {} is not after in time {}",
                out_time, in_time
            )));
        }

        let duration_seconds = (out_time - in_time).num_seconds();
        if duration_seconds <= self.config.free_period_seconds {
            return Ok(round2(Decimal::ZERO));
        }

        let discount = if is_loyalty_user {
            self.config.loyalty_discount
        } else {
            Decimal::ONE
        };
        let hours = Decimal::from(duration_seconds) / Decimal::from(SECONDS_PER_HOUR);
        let price = round2(discount * hours * self.config.hourly_rate(category));

        tracing::debug!(
            "Fare for {} over {}s (loyal: {}) = {}",
            category,
            duration_seconds,
            is_loyalty_user,
            price
        );

        Ok(price)
    }

    /// Fare for a category given by its stored name.
    pub fn compute_fare_by_name(
        &self,
        category: &str,
        in_time: DateTime<Utc>,
        out_time: Option<DateTime<Utc>>,
        is_loyalty_user: bool,
    ) -> ParkingResult<Decimal> {
        let category: VehicleCategory = category.parse()?;
        self.compute_fare(category, in_time, out_time, is_loyalty_user)
    }
}

/// Round to cents, halves away from zero, always carrying two decimals.
pub fn round2(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}
