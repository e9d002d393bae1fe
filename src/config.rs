// =============================================================================
// Engine Configuration — tunable settings with atomic save
// =============================================================================
//
// Every field carries a serde default so that loading an older config file
// never breaks when new fields are added. Persistence uses the tmp + rename
// pattern to prevent corruption on crash.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::indicators::{macd, rsi};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_watchlist_path() -> String {
    "watchlist.json".to_string()
}

fn default_top_n() -> usize {
    6
}

fn default_rsi_period() -> usize {
    rsi::DEFAULT_PERIOD
}

fn default_macd_fast() -> usize {
    macd::DEFAULT_FAST
}

fn default_macd_slow() -> usize {
    macd::DEFAULT_SLOW
}

fn default_macd_signal() -> usize {
    macd::DEFAULT_SIGNAL
}

// =============================================================================
// IndicatorParams
// =============================================================================

/// Look-back windows for the oscillators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorParams {
    /// Momentum oscillator window.
    #[serde(default = "default_rsi_period")]
    pub rsi_period: usize,

    /// Fast EMA period of the convergence oscillator.
    #[serde(default = "default_macd_fast")]
    pub macd_fast: usize,

    /// Slow EMA period of the convergence oscillator.
    #[serde(default = "default_macd_slow")]
    pub macd_slow: usize,

    /// Signal-line EMA period of the convergence oscillator.
    #[serde(default = "default_macd_signal")]
    pub macd_signal: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: default_rsi_period(),
            macd_fast: default_macd_fast(),
            macd_slow: default_macd_slow(),
            macd_signal: default_macd_signal(),
        }
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for the Meridian analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Path of the snapshot watchlist consumed on each scan.
    #[serde(default = "default_watchlist_path")]
    pub watchlist_path: String,

    /// Where to write the JSON scan report; `None` disables the report.
    #[serde(default)]
    pub report_path: Option<String>,

    /// Seconds between scans; 0 means scan once and exit.
    #[serde(default)]
    pub scan_interval_secs: u64,

    /// How many ranked recommendations to surface.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Oscillator look-back windows.
    #[serde(default)]
    pub indicator_params: IndicatorParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            watchlist_path: default_watchlist_path(),
            report_path: None,
            scan_interval_secs: 0,
            top_n: default_top_n(),
            indicator_params: IndicatorParams::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            watchlist = %config.watchlist_path,
            scan_interval_secs = config.scan_interval_secs,
            "config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "config saved (atomic)");
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.watchlist_path, "watchlist.json");
        assert!(cfg.report_path.is_none());
        assert_eq!(cfg.scan_interval_secs, 0);
        assert_eq!(cfg.top_n, 6);
        assert_eq!(cfg.indicator_params.rsi_period, 14);
        assert_eq!(cfg.indicator_params.macd_fast, 12);
        assert_eq!(cfg.indicator_params.macd_slow, 26);
        assert_eq!(cfg.indicator_params.macd_signal, 9);
    }

    #[test]
    fn deserialise_empty_json_uses_defaults() {
        let cfg: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.watchlist_path, "watchlist.json");
        assert_eq!(cfg.top_n, 6);
        assert_eq!(cfg.indicator_params.rsi_period, 14);
    }

    #[test]
    fn deserialise_partial_json_fills_defaults() {
        let json = r#"{ "watchlist_path": "quotes.json", "indicator_params": { "rsi_period": 21 } }"#;
        let cfg: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.watchlist_path, "quotes.json");
        assert_eq!(cfg.indicator_params.rsi_period, 21);
        // Unmentioned nested fields keep their defaults.
        assert_eq!(cfg.indicator_params.macd_slow, 26);
        assert_eq!(cfg.top_n, 6);
    }

    #[test]
    fn roundtrip_serialisation() {
        let mut cfg = EngineConfig::default();
        cfg.report_path = Some("report.json".to_string());
        cfg.scan_interval_secs = 300;

        let json = serde_json::to_string(&cfg).unwrap();
        let cfg2: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg2.report_path.as_deref(), Some("report.json"));
        assert_eq!(cfg2.scan_interval_secs, 300);
        assert_eq!(cfg2.indicator_params.macd_fast, cfg.indicator_params.macd_fast);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("meridian-config-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");

        let mut cfg = EngineConfig::default();
        cfg.top_n = 3;
        cfg.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.top_n, 3);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(EngineConfig::load("/nonexistent/meridian.json").is_err());
    }
}
