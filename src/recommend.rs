// =============================================================================
// Recommendation Synthesis — final action label from the merged state
// =============================================================================
//
// Tally bullish and bearish votes from the signal set, add one synthetic
// vote for the prevailing trend, and let strength upgrade a clear majority
// to the "Strong" variant. A tie (including no votes at all) is a Hold.
// =============================================================================

use crate::signals::SignalSet;
use crate::types::{Recommendation, Strength, Trend};

/// Produce the final action label.
pub fn synthesize(signals: &SignalSet, trend: Trend, strength: Strength) -> Recommendation {
    let mut bullish = signals.iter().filter(|t| t.is_bullish()).count();
    let mut bearish = signals.iter().filter(|t| t.is_bearish()).count();

    match trend {
        Trend::Uptrend => bullish += 1,
        Trend::Downtrend => bearish += 1,
        Trend::Sideways => {}
    }

    if bullish > bearish {
        if strength == Strength::Strong {
            Recommendation::StrongBuy
        } else {
            Recommendation::Buy
        }
    } else if bearish > bullish {
        if strength == Strength::Strong {
            Recommendation::StrongSell
        } else {
            Recommendation::Sell
        }
    } else {
        Recommendation::Hold
    }
}
