// =============================================================================
// Market Classifier — qualitative state from the raw snapshot
// =============================================================================
//
// Works on snapshot scalars only; no price history required.
//
//   trend:      percent change  > 1 => uptrend,  < -1 => downtrend, else sideways
//   volatility: 52-week spread% > 50 => high,    > 25 => medium,    else low
//               where spread% = (high - low) / low * 100
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{Strength, Trend, Volatility};

/// 52-week support/resistance levels, passed through as-is. Either bound may
/// be unknown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

/// Trend from the percent change since the prior close.
pub fn trend(change: f64) -> Trend {
    if change > 1.0 {
        Trend::Uptrend
    } else if change < -1.0 {
        Trend::Downtrend
    } else {
        Trend::Sideways
    }
}

/// Volatility from the 52-week range spread.
///
/// Both bounds must be present with `high > low`; anything else defaults to
/// low. An absent bound is "unknown", which is not the same as zero.
pub fn volatility(high_52w: Option<f64>, low_52w: Option<f64>) -> Volatility {
    let (high, low) = match (high_52w, low_52w) {
        (Some(h), Some(l)) if h > l && l > 0.0 => (h, l),
        _ => return Volatility::Low,
    };

    let spread_pct = (high - low) / low * 100.0;
    if spread_pct > 50.0 {
        Volatility::High
    } else if spread_pct > 25.0 {
        Volatility::Medium
    } else {
        Volatility::Low
    }
}

/// Support = 52-week low, resistance = 52-week high.
pub fn support_resistance(high_52w: Option<f64>, low_52w: Option<f64>) -> SupportResistance {
    SupportResistance {
        support: low_52w,
        resistance: high_52w,
    }
}

/// Overall trend strength: the stronger of the momentum and convergence
/// readings.
pub fn combine_strength(momentum: Strength, convergence: Strength) -> Strength {
    momentum.max(convergence)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_thresholds_are_exclusive() {
        assert_eq!(trend(2.5), Trend::Uptrend);
        assert_eq!(trend(1.0), Trend::Sideways);
        assert_eq!(trend(1.01), Trend::Uptrend);
        assert_eq!(trend(-1.0), Trend::Sideways);
        assert_eq!(trend(-1.01), Trend::Downtrend);
        assert_eq!(trend(0.0), Trend::Sideways);
    }

    #[test]
    fn volatility_bands_from_spread() {
        // spread 60% / 30% / 10%
        assert_eq!(volatility(Some(160.0), Some(100.0)), Volatility::High);
        assert_eq!(volatility(Some(130.0), Some(100.0)), Volatility::Medium);
        assert_eq!(volatility(Some(110.0), Some(100.0)), Volatility::Low);
    }

    #[test]
    fn volatility_band_boundaries() {
        // Exactly 50% and 25% stay in the lower band.
        assert_eq!(volatility(Some(150.0), Some(100.0)), Volatility::Medium);
        assert_eq!(volatility(Some(125.0), Some(100.0)), Volatility::Low);
    }

    #[test]
    fn volatility_defaults_low_without_both_bounds() {
        assert_eq!(volatility(None, None), Volatility::Low);
        assert_eq!(volatility(Some(160.0), None), Volatility::Low);
        assert_eq!(volatility(None, Some(100.0)), Volatility::Low);
        // Inverted or degenerate ranges are unusable.
        assert_eq!(volatility(Some(100.0), Some(100.0)), Volatility::Low);
        assert_eq!(volatility(Some(90.0), Some(100.0)), Volatility::Low);
    }

    #[test]
    fn support_resistance_is_pass_through() {
        let sr = support_resistance(Some(160.0), Some(140.0));
        assert_eq!(sr.support, Some(140.0));
        assert_eq!(sr.resistance, Some(160.0));

        let sr = support_resistance(None, None);
        assert!(sr.support.is_none());
        assert!(sr.resistance.is_none());
    }

    #[test]
    fn combined_strength_takes_the_stronger() {
        assert_eq!(
            combine_strength(Strength::Weak, Strength::Strong),
            Strength::Strong
        );
        assert_eq!(
            combine_strength(Strength::Moderate, Strength::Weak),
            Strength::Moderate
        );
        assert_eq!(
            combine_strength(Strength::Weak, Strength::Weak),
            Strength::Weak
        );
    }
}
