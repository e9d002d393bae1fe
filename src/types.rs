// =============================================================================
// Shared types used across the Meridian analysis engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// The MACD pair as delivered by upstream quote sources: the oscillator line
/// and its smoothed signal line. The histogram is not transmitted; it is
/// completed as `macd - signal` when the pair enters the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdQuote {
    pub macd: f64,
    pub signal: f64,
}

/// A point-in-time snapshot of a tradeable instrument, as handed over by the
/// data-acquisition collaborator.
///
/// Absent optional fields mean "unknown", never zero — classifiers must be
/// able to tell "no data" from "zero value". The `prices` / `volumes` series
/// are ordered oldest-first (most recent sample last); sources that deliver
/// the opposite order are reversed at the feed boundary before the snapshot
/// reaches the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    pub symbol: String,
    /// Last traded price.
    pub price: f64,
    /// Percent change since the prior close.
    pub change: f64,
    /// Current session volume.
    pub volume: u64,

    #[serde(default, rename = "52w_high", skip_serializing_if = "Option::is_none")]
    pub high_52w: Option<f64>,
    #[serde(default, rename = "52w_low", skip_serializing_if = "Option::is_none")]
    pub low_52w: Option<f64>,

    // Pass-through fields: carried on the snapshot, unused by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sma: Option<f64>,

    /// Pre-computed momentum score, when the source supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    /// Pre-computed MACD pair, when the source supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdQuote>,

    /// Historical closes for indicator derivation, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<f64>,
    /// Historical volumes paired with `prices`, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<u64>,
}

impl InstrumentSnapshot {
    /// Basic shape check: every supplied numeric field must be finite.
    ///
    /// This is the only validation the engine relies on; freshness and
    /// correctness of upstream data are the feed's problem.
    pub fn is_well_formed(&self) -> bool {
        let finite_opt = |v: &Option<f64>| v.map_or(true, f64::is_finite);

        self.price.is_finite()
            && self.change.is_finite()
            && finite_opt(&self.high_52w)
            && finite_opt(&self.low_52w)
            && finite_opt(&self.market_cap)
            && finite_opt(&self.pe_ratio)
            && finite_opt(&self.sma)
            && finite_opt(&self.rsi)
            && self
                .macd
                .map_or(true, |m| m.macd.is_finite() && m.signal.is_finite())
            && self.prices.iter().all(|p| p.is_finite())
    }
}

/// Price trend derived from the percent change since the prior close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Uptrend,
    Downtrend,
    Sideways,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uptrend => write!(f, "uptrend"),
            Self::Downtrend => write!(f, "downtrend"),
            Self::Sideways => write!(f, "sideways"),
        }
    }
}

/// Volatility class derived from the 52-week range spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volatility {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Volatility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Trend strength. Variant order matters: `Weak < Moderate < Strong`, so the
/// stronger of two readings is simply `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

impl std::fmt::Display for Strength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weak => write!(f, "weak"),
            Self::Moderate => write!(f, "moderate"),
            Self::Strong => write!(f, "strong"),
        }
    }
}

/// Qualitative state of the momentum oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl std::fmt::Display for MomentumSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "overbought"),
            Self::Oversold => write!(f, "oversold"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Qualitative state of the convergence oscillator, strongest reading first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceSignal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl std::fmt::Display for ConvergenceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "strong_buy"),
            Self::Buy => write!(f, "buy"),
            Self::Neutral => write!(f, "neutral"),
            Self::Sell => write!(f, "sell"),
            Self::StrongSell => write!(f, "strong_sell"),
        }
    }
}

/// Price and indicator moving in opposite directions over the last two
/// samples — a reversal warning, not a trade signal on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Divergence {
    Bullish,
    Bearish,
}

/// Final directional action label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    #[serde(rename = "Buy")]
    Buy,
    #[serde(rename = "Hold")]
    Hold,
    #[serde(rename = "Sell")]
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "Strong Buy"),
            Self::Buy => write!(f, "Buy"),
            Self::Hold => write!(f, "Hold"),
            Self::Sell => write!(f, "Sell"),
            Self::StrongSell => write!(f, "Strong Sell"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_snapshot() -> InstrumentSnapshot {
        serde_json::from_str(r#"{ "symbol": "AAPL", "price": 150.0, "change": 2.5, "volume": 1000 }"#)
            .unwrap()
    }

    #[test]
    fn snapshot_optional_fields_default_to_unknown() {
        let snap = minimal_snapshot();
        assert_eq!(snap.symbol, "AAPL");
        assert!(snap.high_52w.is_none());
        assert!(snap.low_52w.is_none());
        assert!(snap.rsi.is_none());
        assert!(snap.macd.is_none());
        assert!(snap.prices.is_empty());
        assert!(snap.volumes.is_empty());
    }

    #[test]
    fn snapshot_52w_field_names_roundtrip() {
        let json = r#"{
            "symbol": "MSFT", "price": 300.0, "change": -1.2, "volume": 5000,
            "52w_high": 360.0, "52w_low": 240.0
        }"#;
        let snap: InstrumentSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snap.high_52w, Some(360.0));
        assert_eq!(snap.low_52w, Some(240.0));

        let out = serde_json::to_value(&snap).unwrap();
        assert_eq!(out["52w_high"], 360.0);
        assert_eq!(out["52w_low"], 240.0);
    }

    #[test]
    fn well_formed_rejects_non_finite_fields() {
        let mut snap = minimal_snapshot();
        assert!(snap.is_well_formed());

        snap.price = f64::NAN;
        assert!(!snap.is_well_formed());

        let mut snap = minimal_snapshot();
        snap.rsi = Some(f64::INFINITY);
        assert!(!snap.is_well_formed());

        let mut snap = minimal_snapshot();
        snap.prices = vec![1.0, f64::NAN];
        assert!(!snap.is_well_formed());
    }

    #[test]
    fn strength_orders_weak_to_strong() {
        assert!(Strength::Weak < Strength::Moderate);
        assert!(Strength::Moderate < Strength::Strong);
        assert_eq!(Strength::Moderate.max(Strength::Strong), Strength::Strong);
    }

    #[test]
    fn recommendation_serialises_as_display_label() {
        let json = serde_json::to_string(&Recommendation::StrongBuy).unwrap();
        assert_eq!(json, "\"Strong Buy\"");
        assert_eq!(Recommendation::StrongSell.to_string(), "Strong Sell");
    }

    #[test]
    fn trend_serialises_snake_case() {
        assert_eq!(serde_json::to_string(&Trend::Uptrend).unwrap(), "\"uptrend\"");
        assert_eq!(
            serde_json::to_string(&ConvergenceSignal::StrongSell).unwrap(),
            "\"strong_sell\""
        );
    }
}
