//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::Currency;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Global dunning defaults, used when a party has no override.
    #[serde(default)]
    pub dunning: DunningDefaults,
    /// Background job scheduling.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Currency statements are expressed in when the customer has none.
    #[serde(default = "default_currency")]
    pub default_currency: Currency,
    /// Days after delivery before a shipment gets an expected-invoice tracking.
    #[serde(default = "default_bulk_days_after_delivery")]
    pub bulk_days_after_delivery: i64,
    /// Days after delivery the partner invoice is expected.
    #[serde(default = "default_expected_invoice_offset_days")]
    pub expected_invoice_offset_days: i64,
}

fn default_currency() -> Currency {
    Currency::Eur
}

fn default_bulk_days_after_delivery() -> i64 {
    7
}

fn default_expected_invoice_offset_days() -> i64 {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_currency: default_currency(),
            bulk_days_after_delivery: default_bulk_days_after_delivery(),
            expected_invoice_offset_days: default_expected_invoice_offset_days(),
        }
    }
}

/// Global dunning thresholds and fees.
#[derive(Debug, Clone, Deserialize)]
pub struct DunningDefaults {
    /// Days overdue for level 1.
    #[serde(default = "default_level1_days")]
    pub level1_days_overdue: i64,
    /// Fee charged when level 1 is reached.
    #[serde(default = "default_level1_fee")]
    pub level1_fee: Decimal,
    /// Days overdue for level 2.
    #[serde(default = "default_level2_days")]
    pub level2_days_overdue: i64,
    /// Fee charged when level 2 is reached.
    #[serde(default = "default_level2_fee")]
    pub level2_fee: Decimal,
    /// Days overdue for level 3.
    #[serde(default = "default_level3_days")]
    pub level3_days_overdue: i64,
    /// Fee charged when level 3 is reached.
    #[serde(default = "default_level3_fee")]
    pub level3_fee: Decimal,
    /// Currency the fees are expressed in.
    #[serde(default = "default_currency")]
    pub fee_currency: Currency,
}

fn default_level1_days() -> i64 {
    7
}

fn default_level1_fee() -> Decimal {
    Decimal::TEN
}

fn default_level2_days() -> i64 {
    21
}

fn default_level2_fee() -> Decimal {
    Decimal::from(25)
}

fn default_level3_days() -> i64 {
    45
}

fn default_level3_fee() -> Decimal {
    Decimal::from(50)
}

impl Default for DunningDefaults {
    fn default() -> Self {
        Self {
            level1_days_overdue: default_level1_days(),
            level1_fee: default_level1_fee(),
            level2_days_overdue: default_level2_days(),
            level2_fee: default_level2_fee(),
            level3_days_overdue: default_level3_days(),
            level3_fee: default_level3_fee(),
            fee_currency: default_currency(),
        }
    }
}

/// Background scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between dunning / bulk-tracking runs. `0` disables the scheduler.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FREIGHTBOOK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
