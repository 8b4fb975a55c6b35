use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_FEE_RATE: f64 = 0.001;
const DEFAULT_MIN_PROFIT_THRESHOLD: f64 = 0.0005;
const DEFAULT_MAX_POSITION_PCT: f64 = 0.1;
const DEFAULT_SLIPPAGE_BUFFER: f64 = 0.0005;
const DEFAULT_DAILY_LOSS_LIMIT: f64 = 500.0;
const DEFAULT_MAX_HOLD_TIME_MS: u64 = 30_000;

const BASE_CURRENCIES: &[&str] = &["USDT", "USDC", "BUSD"];

/// Exchange API credentials. Read from the environment only, never from a
/// config file, and deliberately excluded from `Debug` so a logged `Config`
/// can never leak them.
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("api_key", &"<redacted>").field("api_secret", &"<redacted>").finish()
    }
}

impl Credentials {
    /// Reads `TRIARB_API_KEY` / `TRIARB_API_SECRET`. Both are required and
    /// must be non-empty; a missing or blank credential is a fatal startup
    /// error, never a silently-disabled trading mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = read_required_env("TRIARB_API_KEY")?;
        let api_secret = read_required_env("TRIARB_API_SECRET")?;
        Ok(Self { api_key, api_secret })
    }
}

fn read_required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingEnv(name)),
    }
}

/// Everything the engine needs besides credentials, loadable from a TOML
/// file with every field individually overridable via a `TRIARB_*`
/// environment variable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_currency: String,
    pub use_testnet: bool,
    pub fee_rate: f64,
    pub min_profit_threshold: f64,
    pub max_position_pct: f64,
    pub slippage_buffer: f64,
    pub daily_loss_limit: f64,
    pub max_hold_time_ms: u64,
    pub max_concurrent_triangles: u32,
    pub dry_run: bool,
    pub max_triangles: usize,
    pub order_timeout_ms: u64,
    pub use_market_orders: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: "USDT".to_string(),
            use_testnet: false,
            fee_rate: DEFAULT_FEE_RATE,
            min_profit_threshold: DEFAULT_MIN_PROFIT_THRESHOLD,
            max_position_pct: DEFAULT_MAX_POSITION_PCT,
            slippage_buffer: DEFAULT_SLIPPAGE_BUFFER,
            daily_loss_limit: DEFAULT_DAILY_LOSS_LIMIT,
            max_hold_time_ms: DEFAULT_MAX_HOLD_TIME_MS,
            max_concurrent_triangles: 1,
            dry_run: true,
            max_triangles: 100,
            order_timeout_ms: 5_000,
            use_market_orders: true,
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Loads an optional TOML file, then applies any `TRIARB_*` environment
    /// overrides on top, then validates. Returns `Config::default()`
    /// overlaid with env vars when `path` doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
            toml::from_str(&text)
                .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = env_string("TRIARB_BASE_CURRENCY") {
            self.base_currency = v;
        }
        if let Some(v) = env_parsed("TRIARB_USE_TESTNET") {
            self.use_testnet = v;
        }
        if let Some(v) = env_parsed("TRIARB_FEE_RATE") {
            self.fee_rate = v;
        }
        if let Some(v) = env_parsed("TRIARB_MIN_PROFIT_THRESHOLD") {
            self.min_profit_threshold = v;
        }
        if let Some(v) = env_parsed("TRIARB_MAX_POSITION_PCT") {
            self.max_position_pct = v;
        }
        if let Some(v) = env_parsed("TRIARB_SLIPPAGE_BUFFER") {
            self.slippage_buffer = v;
        }
        if let Some(v) = env_parsed("TRIARB_DAILY_LOSS_LIMIT") {
            self.daily_loss_limit = v;
        }
        if let Some(v) = env_parsed("TRIARB_MAX_HOLD_TIME_MS") {
            self.max_hold_time_ms = v;
        }
        if let Some(v) = env_parsed("TRIARB_MAX_CONCURRENT_TRIANGLES") {
            self.max_concurrent_triangles = v;
        }
        if let Some(v) = env_parsed("TRIARB_DRY_RUN") {
            self.dry_run = v;
        }
        if let Some(v) = env_parsed("TRIARB_MAX_TRIANGLES") {
            self.max_triangles = v;
        }
        if let Some(v) = env_parsed("TRIARB_ORDER_TIMEOUT_MS") {
            self.order_timeout_ms = v;
        }
        if let Some(v) = env_parsed("TRIARB_USE_MARKET_ORDERS") {
            self.use_market_orders = v;
        }
        if let Some(v) = env_string("TRIARB_LOG_LEVEL") {
            self.log_level = v;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !BASE_CURRENCIES.contains(&self.base_currency.as_str()) {
            return Err(ConfigError::InvalidChoice {
                field: "base_currency",
                allowed: BASE_CURRENCIES,
                value: self.base_currency.clone(),
            });
        }
        in_range("fee_rate", self.fee_rate, 0.0, 0.01)?;
        in_range("min_profit_threshold", self.min_profit_threshold, 0.0, 0.1)?;
        in_range("max_position_pct", self.max_position_pct, 0.01, 1.0)?;
        in_range("slippage_buffer", self.slippage_buffer, 0.0, 0.01)?;
        if self.daily_loss_limit < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "daily_loss_limit",
                constraint: ">= 0".to_string(),
                value: self.daily_loss_limit.to_string(),
            });
        }
        in_range_u64("max_hold_time_ms", self.max_hold_time_ms, 1_000, 60_000)?;
        in_range_u32("max_concurrent_triangles", self.max_concurrent_triangles, 1, 5)?;
        in_range_usize("max_triangles", self.max_triangles, 1, 500)?;
        in_range_u64("order_timeout_ms", self.order_timeout_ms, 1_000, 30_000)?;
        Ok(())
    }

    /// Combined fee across all three legs of a triangle: `1 - (1 - fee_rate)^3`.
    pub fn total_fee_rate(&self) -> f64 {
        1.0 - (1.0 - self.fee_rate).powi(3)
    }

    /// The minimum profit a triangle must clear once fees are accounted for.
    pub fn effective_min_profit(&self) -> f64 {
        self.min_profit_threshold + self.total_fee_rate()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            constraint: format!("in [{min}, {max}]"),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn in_range_u64(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            constraint: format!("in [{min}, {max}]"),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn in_range_u32(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            constraint: format!("in [{min}, {max}]"),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn in_range_usize(field: &'static str, value: usize, min: usize, max: usize) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            constraint: format!("in [{min}, {max}]"),
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn an_unknown_base_currency_is_rejected() {
        let config = Config { base_currency: "DOGE".to_string(), ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChoice { .. })));
    }

    #[test]
    fn a_fee_rate_above_the_ceiling_is_rejected() {
        let config = Config { fee_rate: 0.02, ..Config::default() };
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { field: "fee_rate", .. })));
    }

    #[test]
    fn total_fee_rate_compounds_across_three_legs() {
        let config = Config { fee_rate: 0.001, ..Config::default() };
        let expected = 1.0 - 0.999_f64.powi(3);
        assert!((config.total_fee_rate() - expected).abs() < 1e-12);
    }
}
