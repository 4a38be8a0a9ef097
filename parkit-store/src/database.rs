use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::app_config::BusinessRules;

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Overlay rows of the `business_rules` table on top of `defaults`.
    pub async fn fetch_business_rules(&self, defaults: BusinessRules) -> Result<BusinessRules, sqlx::Error> {
        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT rule_key, rule_value FROM business_rules")
                .fetch_all(&self.pool)
                .await?;

        let mut rules = defaults;
        for (key, value) in rows {
            apply_rule(&mut rules, &key, &value);
        }

        Ok(rules)
    }
}

// Expected format: {"value": <number/string>}
fn apply_rule(rules: &mut BusinessRules, key: &str, value: &Value) {
    let Some(v) = value.get("value") else {
        return;
    };

    match key {
        "car_rate_per_hour" => if let Some(d) = as_decimal(v) { rules.car_rate_per_hour = d; },
        "bike_rate_per_hour" => if let Some(d) = as_decimal(v) { rules.bike_rate_per_hour = d; },
        "loyalty_discount" => if let Some(d) = as_decimal(v) { rules.loyalty_discount = d; },
        "free_minutes" => if let Some(m) = v.as_i64() { rules.free_minutes = m; },
        "loyalty_exit_policy" => {
            if let Ok(policy) = serde_json::from_value(v.clone()) {
                rules.loyalty_exit_policy = policy;
            }
        }
        other => tracing::warn!("Ignoring unknown business rule {}", other),
    }
}

fn as_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::String(s) => Decimal::from_str(s).ok(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parkit_core::LoyaltyExitPolicy;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn defaults() -> BusinessRules {
        BusinessRules {
            car_rate_per_hour: dec!(1.5),
            bike_rate_per_hour: dec!(1.0),
            free_minutes: 30,
            loyalty_discount: dec!(0.95),
            loyalty_exit_policy: LoyaltyExitPolicy::WaiveFare,
        }
    }

    #[test]
    fn test_rule_overrides() {
        let mut rules = defaults();

        apply_rule(&mut rules, "car_rate_per_hour", &json!({"value": 2.25}));
        apply_rule(&mut rules, "bike_rate_per_hour", &json!({"value": "0.80"}));
        apply_rule(&mut rules, "free_minutes", &json!({"value": 15}));
        apply_rule(&mut rules, "loyalty_exit_policy", &json!({"value": "DISCOUNTED_FARE"}));

        assert_eq!(rules.car_rate_per_hour, dec!(2.25));
        assert_eq!(rules.bike_rate_per_hour, dec!(0.80));
        assert_eq!(rules.free_minutes, 15);
        assert_eq!(rules.loyalty_exit_policy, LoyaltyExitPolicy::DiscountedFare);
    }

    #[test]
    fn test_malformed_rules_are_ignored() {
        let mut rules = defaults();

        apply_rule(&mut rules, "car_rate_per_hour", &json!({"value": "lots"}));
        apply_rule(&mut rules, "loyalty_discount", &json!(0.5));
        apply_rule(&mut rules, "valet_fee", &json!({"value": 3}));

        assert_eq!(rules.car_rate_per_hour, dec!(1.5));
        assert_eq!(rules.loyalty_discount, dec!(0.95));
    }
}
