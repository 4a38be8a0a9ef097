pub mod pricing;

pub use pricing::{round2, FareConfig, FarePolicy};
