// =============================================================================
// Risk Engine — entry, stop, target, and confidence synthesis
// =============================================================================
//
// Turns the classified market state into a bounded trade plan:
//
//   entry:   1% below price in an uptrend, 1% above in a downtrend,
//            at price when sideways
//   stop/target percentages keyed by volatility:
//            high (5%, 15%) | medium (3%, 9%) | low (2%, 6%)
//   win-rate: 50 base, +5 per momentum/convergence tag in the signal set,
//            +10 strong / +5 moderate strength, capped at 90
//
// Money values are rounded to 2 decimals, half away from zero. The win-rate
// is a heuristic confidence score, not a backtested probability.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::signals::SignalSet;
use crate::types::{Strength, Trend, Volatility};

/// Hard ceiling on the win-rate estimate.
const WIN_RATE_CAP: u32 = 90;
/// Starting point of the win-rate formula.
const WIN_RATE_BASE: u32 = 50;

/// The trade plan for one analysis. Derived per call; no lifecycle beyond it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub win_rate: u32,
    pub risk_percentage: f64,
}

impl RiskMetrics {
    /// The all-zero record returned when synthesis fails internally.
    pub fn zero() -> Self {
        Self {
            entry_price: 0.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            win_rate: 0,
            risk_percentage: 0.0,
        }
    }
}

/// Synthesize the trade plan from the classified state.
///
/// Never fails outward: a non-finite intermediate degrades to the zero
/// record with a warning.
pub fn plan(
    price: f64,
    trend: Trend,
    volatility: Volatility,
    signals: &SignalSet,
    strength: Strength,
) -> RiskMetrics {
    let entry_price = match trend {
        Trend::Uptrend => price * 0.99,
        Trend::Downtrend => price * 1.01,
        Trend::Sideways => price,
    };

    let (stop_loss_pct, take_profit_pct) = match volatility {
        Volatility::High => (0.05, 0.15),
        Volatility::Medium => (0.03, 0.09),
        Volatility::Low => (0.02, 0.06),
    };

    let stop_loss = entry_price * (1.0 - stop_loss_pct);
    let take_profit = entry_price * (1.0 + take_profit_pct);

    if !entry_price.is_finite() || !stop_loss.is_finite() || !take_profit.is_finite() {
        warn!(price, "risk synthesis produced non-finite levels; returning zero record");
        return RiskMetrics::zero();
    }

    let mut win_rate = WIN_RATE_BASE;
    for tag in signals.iter() {
        if tag.adjusts_win_rate() {
            win_rate += 5;
        }
    }
    win_rate += match strength {
        Strength::Strong => 10,
        Strength::Moderate => 5,
        Strength::Weak => 0,
    };
    let win_rate = win_rate.min(WIN_RATE_CAP);

    RiskMetrics {
        entry_price: round_money(entry_price),
        stop_loss: round_money(stop_loss),
        take_profit: round_money(take_profit),
        win_rate,
        risk_percentage: round_money(stop_loss_pct * 100.0),
    }
}

/// Round to 2 decimal places, ties away from zero.
pub(crate) fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
