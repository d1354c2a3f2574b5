//! # Engine Configuration
//!
//! Shop-wide settings passed to the engine at construction.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     SALON_DB_PATH=/srv/salon/salon.db                                   │
//! │     SALON_CONFLICT_MODE=overlap                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/salondesk/salon.toml (Linux)                              │
//! │     ~/Library/Application Support/com.salondesk.salon/salon.toml        │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [shop]
//! name = "Fade Street"
//! currency_code = "SAR"
//! currency_symbol = "SAR"
//! currency_decimals = 2
//! symbol_after = true
//! default_payment_method = "cash"
//!
//! [booking]
//! opening_time = "09:00"
//! closing_time = "22:00"
//! slot_minutes = 15
//! conflict_mode = "exact_slot"   # exact_slot | overlap
//! default_staff_commission_percent = 30
//!
//! [loyalty]
//! point_value_cents = 50
//! earn_rate_bps = 1000
//!
//! [database]
//! path = "/srv/salon/salon.db"
//! max_connections = 5
//!
//! [locks]
//! number_wait_ms = 2000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use salon_core::schedule::parse_slot;
use salon_core::{ConflictMode, LoyaltyPolicy, Money, SlotGrid, DEFAULT_STAFF_COMMISSION_PERCENT};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine the application data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopSettings {
    pub name: String,
    /// ISO 4217 code.
    pub currency_code: String,
    pub currency_symbol: String,
    /// Digits shown after the decimal point: 0 or 2.
    pub currency_decimals: u8,
    /// Render `40.00 SAR` instead of `SAR40.00`.
    pub symbol_after: bool,
    /// Used when a completion or checkout names no payment method.
    pub default_payment_method: String,
}

impl Default for ShopSettings {
    fn default() -> Self {
        ShopSettings {
            name: "Salon Desk".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            symbol_after: false,
            default_payment_method: "cash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingSettings {
    /// `HH:MM`, first bookable slot.
    pub opening_time: String,
    /// `HH:MM`, last bookable slot.
    pub closing_time: String,
    pub slot_minutes: u32,
    pub conflict_mode: ConflictMode,
    /// Commission for staff added without an explicit rate.
    pub default_staff_commission_percent: u32,
}

impl Default for BookingSettings {
    fn default() -> Self {
        BookingSettings {
            opening_time: "09:00".to_string(),
            closing_time: "22:00".to_string(),
            slot_minutes: 15,
            conflict_mode: ConflictMode::ExactSlot,
            default_staff_commission_percent: DEFAULT_STAFF_COMMISSION_PERCENT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltySettings {
    /// Value of one point in minor units.
    pub point_value_cents: i64,
    /// Points per currency unit paid, in basis points.
    pub earn_rate_bps: u32,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            point_value_cents: LoyaltyPolicy::DEFAULT_POINT_VALUE_CENTS,
            earn_rate_bps: LoyaltyPolicy::DEFAULT_EARN_RATE_BPS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `None` uses the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// How long an operation waits for a contended number bucket.
    pub number_wait_ms: u64,
}

impl Default for LockSettings {
    fn default() -> Self {
        LockSettings {
            number_wait_ms: 2000,
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub shop: ShopSettings,
    #[serde(default)]
    pub booking: BookingSettings,
    #[serde(default)]
    pub loyalty: LoyaltySettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub locks: LockSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`salon.toml`)
    /// 3. `SALON_*` environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                config = Self::from_toml(&std::fs::read_to_string(&path)?)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `SALON_*` overrides read through `lookup`.
    ///
    /// Unparseable numbers and unknown modes are logged and skipped.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("SALON_SHOP_NAME") {
            self.shop.name = name;
        }

        if let Some(symbol) = lookup("SALON_CURRENCY_SYMBOL") {
            self.shop.currency_symbol = symbol;
        }

        if let Some(path) = lookup("SALON_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(open) = lookup("SALON_OPENING_TIME") {
            self.booking.opening_time = open;
        }

        if let Some(close) = lookup("SALON_CLOSING_TIME") {
            self.booking.closing_time = close;
        }

        if let Some(minutes) = lookup("SALON_SLOT_MINUTES") {
            match minutes.parse() {
                Ok(m) => self.booking.slot_minutes = m,
                Err(_) => warn!(value = %minutes, "Ignoring SALON_SLOT_MINUTES"),
            }
        }

        if let Some(mode) = lookup("SALON_CONFLICT_MODE") {
            match mode.to_lowercase().as_str() {
                "exact_slot" | "exact" => self.booking.conflict_mode = ConflictMode::ExactSlot,
                "overlap" => self.booking.conflict_mode = ConflictMode::Overlap,
                _ => warn!(mode = %mode, "Unknown conflict mode in environment"),
            }
        }

        if let Some(wait) = lookup("SALON_NUMBER_WAIT_MS") {
            match wait.parse() {
                Ok(ms) => self.locks.number_wait_ms = ms,
                Err(_) => warn!(value = %wait, "Ignoring SALON_NUMBER_WAIT_MS"),
            }
        }

        if let Some(max) = lookup("SALON_MAX_CONNECTIONS") {
            match max.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring SALON_MAX_CONNECTIONS"),
            }
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.slot_grid()?;

        if self.shop.currency_decimals != 0 && self.shop.currency_decimals != 2 {
            return Err(ConfigError::invalid("shop.currency_decimals", "must be 0 or 2"));
        }
        if self.shop.default_payment_method.trim().is_empty() {
            return Err(ConfigError::invalid(
                "shop.default_payment_method",
                "must not be empty",
            ));
        }
        if self.booking.default_staff_commission_percent > 100 {
            return Err(ConfigError::invalid(
                "booking.default_staff_commission_percent",
                "must be between 0 and 100",
            ));
        }
        if self.loyalty.point_value_cents < 0 {
            return Err(ConfigError::invalid("loyalty.point_value_cents", "must not be negative"));
        }
        if self.loyalty.earn_rate_bps > 10000 {
            return Err(ConfigError::invalid(
                "loyalty.earn_rate_bps",
                "must be between 0 and 10000",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn slot_grid(&self) -> ConfigResult<SlotGrid> {
        let open = parse_slot(&self.booking.opening_time)
            .map_err(|e| ConfigError::invalid("booking.opening_time", e.to_string()))?;
        let close = parse_slot(&self.booking.closing_time)
            .map_err(|e| ConfigError::invalid("booking.closing_time", e.to_string()))?;
        SlotGrid::new(open, close, self.booking.slot_minutes)
            .map_err(|e| ConfigError::invalid("booking", e.to_string()))
    }

    pub fn loyalty_policy(&self) -> LoyaltyPolicy {
        LoyaltyPolicy {
            point_value_cents: self.loyalty.point_value_cents,
            earn_rate_bps: self.loyalty.earn_rate_bps,
        }
    }

    pub fn number_wait(&self) -> Duration {
        Duration::from_millis(self.locks.number_wait_ms)
    }

    /// Configured database file, or `<data dir>/salon.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join("salon.db"))
    }

    /// Formats an amount with the shop's currency.
    ///
    /// ## Example
    /// ```rust
    /// use salon_core::Money;
    /// use salon_engine::config::EngineConfig;
    ///
    /// let config = EngineConfig::default();
    /// assert_eq!(config.format_money(Money::from_cents(1234)), "$12.34");
    /// assert_eq!(config.format_money(Money::from_cents(-1234)), "-$12.34");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        let cents = amount.cents();
        let sign = if cents < 0 { "-" } else { "" };
        let abs = cents.unsigned_abs();

        let number = if self.shop.currency_decimals == 0 {
            // half up to whole units
            ((abs + 50) / 100).to_string()
        } else {
            format!("{}.{:02}", abs / 100, abs % 100)
        };

        if self.shop.symbol_after {
            format!("{}{} {}", sign, number, self.shop.currency_symbol)
        } else {
            format!("{}{}{}", sign, self.shop.currency_symbol, number)
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "salondesk", "salon")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("salon.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();

        let grid = config.slot_grid().unwrap();
        assert_eq!(grid.slots().len(), 53);
        assert_eq!(config.loyalty_policy(), LoyaltyPolicy::default());
        assert_eq!(config.number_wait(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            [shop]
            name = "Fade Street"
            currency_symbol = "SAR"
            symbol_after = true

            [booking]
            conflict_mode = "overlap"
            slot_minutes = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.shop.name, "Fade Street");
        assert_eq!(config.shop.currency_decimals, 2);
        assert_eq!(config.booking.conflict_mode, ConflictMode::Overlap);
        assert_eq!(config.booking.opening_time, "09:00");
        assert_eq!(config.loyalty.earn_rate_bps, 1000);
        assert_eq!(config.format_money(Money::from_cents(12370)), "123.70 SAR");
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("SALON_DB_PATH", "/tmp/salon.db"),
            ("SALON_CONFLICT_MODE", "OVERLAP"),
            ("SALON_SLOT_MINUTES", "not-a-number"),
            ("SALON_NUMBER_WAIT_MS", "500"),
        ]
        .into_iter()
        .collect();

        let mut config = EngineConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/salon.db")));
        assert_eq!(config.booking.conflict_mode, ConflictMode::Overlap);
        assert_eq!(config.booking.slot_minutes, 15);
        assert_eq!(config.number_wait(), Duration::from_millis(500));
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/salon.db"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config = EngineConfig::default();
        config.booking.closing_time = "8:00pm".to_string();
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.booking.slot_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.shop.currency_decimals = 3;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.loyalty.earn_rate_bps = 20000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_format_money_whole_units() {
        let mut config = EngineConfig::default();
        config.shop.currency_decimals = 0;
        assert_eq!(config.format_money(Money::from_cents(4050)), "$41");
        assert_eq!(config.format_money(Money::from_cents(4049)), "$40");
        assert_eq!(config.format_money(Money::zero()), "$0");
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&EngineConfig::default()).unwrap();
        assert!(toml_str.contains("[shop]"));
        assert!(toml_str.contains("[booking]"));
        assert!(toml_str.contains("conflict_mode = \"exact_slot\""));
    }
}
