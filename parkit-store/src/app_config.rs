use parkit_core::LoyaltyExitPolicy;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub lot: LotConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub car_rate_per_hour: Decimal,
    pub bike_rate_per_hour: Decimal,
    pub free_minutes: i64,
    pub loyalty_discount: Decimal,
    #[serde(default)]
    pub loyalty_exit_policy: LoyaltyExitPolicy,
}

impl BusinessRules {
    pub fn free_period_seconds(&self) -> i64 {
        self.free_minutes * 60
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

/// Spot counts seeded into the in-memory store
#[derive(Debug, Deserialize, Clone)]
pub struct LotConfig {
    pub car_spots: i32,
    pub bike_spots: i32,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `PARKIT__SERVER__PORT=9000` would set `server.port`
            .add_source(config::Environment::with_prefix("PARKIT").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DEFAULTS: &str = include_str!("../../config/default.toml");

    fn from_toml(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_file() {
        let config = from_toml(DEFAULTS);

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.business_rules.car_rate_per_hour, dec!(1.5));
        assert_eq!(config.business_rules.bike_rate_per_hour, dec!(1.0));
        assert_eq!(config.business_rules.loyalty_discount, dec!(0.95));
        assert_eq!(config.business_rules.free_period_seconds(), 1800);
        assert_eq!(config.business_rules.loyalty_exit_policy, LoyaltyExitPolicy::WaiveFare);
        assert_eq!(config.lot.car_spots, 3);
    }

    #[test]
    fn test_policy_and_pool_defaults() {
        let toml = r#"
            [server]
            port = 1
            [storage]
            backend = "postgres"
            [database]
            url = "postgres://localhost/parkit"
            [lot]
            car_spots = 0
            bike_spots = 0
            [business_rules]
            car_rate_per_hour = "2.0"
            bike_rate_per_hour = "1.0"
            free_minutes = 0
            loyalty_discount = "0.9"
        "#;
        let config = from_toml(toml);

        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.business_rules.loyalty_exit_policy, LoyaltyExitPolicy::WaiveFare);
    }
}
