//! Engine configuration.
//!
//! [`EngineConfig::default`] carries the documented defaults; [`EngineConfig::from_env`]
//! overrides them from environment variables the same way the binary reads its own
//! settings. Unparseable values fall back to the default.

use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trade tape length per symbol.
    pub max_recent_trades: usize,
    /// Start a synthetic price feed for each active symbol.
    pub feed_enabled: bool,
    pub feed_interval_ms: u64,
    /// Seed price of the synthetic feed and of a fresh OHLC candle.
    pub feed_open_price: Decimal,
    pub feed_min_price: Decimal,
    pub feed_max_price: Decimal,
    /// Largest absolute price move per synthetic tick.
    pub feed_max_step: Decimal,
    /// Fixed RNG seed for the feed; random if unset.
    pub feed_seed: Option<u64>,
    /// JSON file holding the known tickers. In-memory only if unset.
    pub tickers_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recent_trades: 100,
            feed_enabled: true,
            feed_interval_ms: 1000,
            feed_open_price: Decimal::from(2800),
            feed_min_price: Decimal::from(1000),
            feed_max_price: Decimal::from(4000),
            feed_max_step: Decimal::ONE,
            feed_seed: None,
            tickers_path: None,
        }
    }
}

impl EngineConfig {
    /// Reads `MAX_RECENT_TRADES`, `FEED_ENABLED`, `FEED_INTERVAL_MS`, `FEED_SEED`, and
    /// `TICKERS_PATH`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_recent_trades: env_parse("MAX_RECENT_TRADES").unwrap_or(defaults.max_recent_trades),
            feed_enabled: env_parse("FEED_ENABLED").unwrap_or(defaults.feed_enabled),
            feed_interval_ms: env_parse("FEED_INTERVAL_MS").unwrap_or(defaults.feed_interval_ms),
            feed_seed: env_parse("FEED_SEED").or(defaults.feed_seed),
            tickers_path: std::env::var("TICKERS_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            ..defaults
        }
    }

    pub fn feed_interval(&self) -> Duration {
        Duration::from_millis(self.feed_interval_ms.max(1))
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = EngineConfig::default();
        assert_eq!(c.max_recent_trades, 100);
        assert_eq!(c.feed_interval(), Duration::from_secs(1));
        assert_eq!(c.feed_min_price, Decimal::from(1000));
        assert_eq!(c.feed_max_price, Decimal::from(4000));
        assert_eq!(c.feed_open_price, Decimal::from(2800));
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let c: EngineConfig =
            serde_json::from_str(r#"{"max_recent_trades": 5, "feed_enabled": false}"#).unwrap();
        assert_eq!(c.max_recent_trades, 5);
        assert!(!c.feed_enabled);
        assert_eq!(c.feed_interval_ms, 1000);
    }
}
