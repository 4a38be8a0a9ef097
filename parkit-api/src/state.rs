use std::sync::Arc;

use parkit_core::{Clock, SpotStore, TicketStore};
use parkit_fare::{FareConfig, FarePolicy};
use parkit_lot::TicketLifecycleManager;
use parkit_store::app_config::BusinessRules;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TicketLifecycleManager>,
}

impl AppState {
    pub fn new(
        spots: Arc<dyn SpotStore>,
        tickets: Arc<dyn TicketStore>,
        rules: &BusinessRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let fare_policy = FarePolicy::new(fare_config(rules));
        let manager = TicketLifecycleManager::new(spots, tickets, fare_policy)
            .with_clock(clock)
            .with_loyalty_exit_policy(rules.loyalty_exit_policy);

        Self {
            manager: Arc::new(manager),
        }
    }
}

pub fn fare_config(rules: &BusinessRules) -> FareConfig {
    FareConfig {
        car_rate_per_hour: rules.car_rate_per_hour,
        bike_rate_per_hour: rules.bike_rate_per_hour,
        free_period_seconds: rules.free_period_seconds(),
        loyalty_discount: rules.loyalty_discount,
    }
}
