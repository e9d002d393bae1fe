// =============================================================================
// Relative Strength Index (RSI) — Wilder's Smoothing
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an instrument is overbought or oversold.
//
// Step 1 — Compute price changes (deltas) from consecutive closes.
// Step 2 — Seed average gain / average loss with the SMA of the first `period`
//          gains / losses.
// Step 3 — Apply Wilder's exponential smoothing:
//            avg_gain = (prev_avg_gain * (period - 1) + current_gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + current_loss) / period
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => overbought,  RSI < 30 => oversold.
// =============================================================================

use tracing::debug;

use crate::types::{Divergence, MomentumSignal, Strength};

/// Default look-back window.
pub const DEFAULT_PERIOD: usize = 14;

/// Compute the full RSI series for the given `prices` and `period`.
///
/// Prices are ordered oldest-first. The returned vector holds one score per
/// delta starting at index `period` (the first `period` deltas are consumed
/// to seed the averages).
///
/// # Edge cases
/// - `period == 0` => empty vec
/// - fewer than `period` deltas (`prices.len() < period + 1`) => empty vec
/// - Average loss of exactly zero => score is exactly 100, never infinity.
///   This holds even when the average gain is also zero.
/// - Non-finite results stop the series; downstream consumers should not
///   trust a broken tail.
pub fn series(prices: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || prices.len() < period + 1 {
        return Vec::new();
    }

    // --- Price deltas --------------------------------------------------------
    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();

    // --- Seed averages with SMA of first `period` deltas ---------------------
    let (sum_gain, sum_loss) = deltas[..period].iter().fold((0.0_f64, 0.0_f64), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l + d.abs())
        }
    });

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    let mut result = Vec::with_capacity(deltas.len() - period + 1);
    match score_from_averages(avg_gain, avg_loss) {
        Some(score) => result.push(score),
        None => return Vec::new(),
    }

    // --- Wilder's smoothing for subsequent deltas ----------------------------
    for &delta in &deltas[period..] {
        let gain = if delta > 0.0 { delta } else { 0.0 };
        let loss = if delta < 0.0 { delta.abs() } else { 0.0 };

        avg_gain = (avg_gain * (period_f - 1.0) + gain) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss) / period_f;

        match score_from_averages(avg_gain, avg_loss) {
            Some(score) => result.push(score),
            None => break,
        }
    }

    result
}

/// Compute the current RSI score: the most recent value of [`series`].
///
/// Returns `None` — the "unknown" outcome, not a failure — when there is
/// insufficient data or the calculation produced nothing finite.
pub fn calculate(prices: &[f64], period: usize) -> Option<f64> {
    let series = series(prices, period);
    let score = series.last().copied();
    if score.is_none() {
        debug!(
            samples = prices.len(),
            period, "momentum score unavailable: insufficient data"
        );
    }
    score
}

/// Classify a score into its qualitative state.
pub fn classify(score: f64) -> MomentumSignal {
    if score > 70.0 {
        MomentumSignal::Overbought
    } else if score < 30.0 {
        MomentumSignal::Oversold
    } else {
        MomentumSignal::Neutral
    }
}

/// Trend strength implied by how far the score sits from the midline.
pub fn strength(score: f64) -> Strength {
    if score > 80.0 || score < 20.0 {
        Strength::Strong
    } else if score > 60.0 || score < 40.0 {
        Strength::Moderate
    } else {
        Strength::Weak
    }
}

/// Compare the last two price points against the last two score points.
///
/// Bullish divergence: price falls while the score rises. Bearish: price
/// rises while the score falls. Both series need at least two points; their
/// lengths need not match (the score series is legitimately shorter than the
/// price series that produced it).
pub fn divergence(prices: &[f64], scores: &[f64]) -> Option<Divergence> {
    if prices.len() < 2 || scores.len() < 2 {
        return None;
    }

    let (p_prev, p_last) = (prices[prices.len() - 2], prices[prices.len() - 1]);
    let (s_prev, s_last) = (scores[scores.len() - 2], scores[scores.len() - 1]);

    if p_last < p_prev && s_last > s_prev {
        Some(Divergence::Bullish)
    } else if p_last > p_prev && s_last < s_prev {
        Some(Divergence::Bearish)
    } else {
        None
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into a score in [0, 100].
///
/// Zero average loss pins the score to exactly 100. Returns `None` when the
/// result is non-finite.
fn score_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let score = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if score.is_finite() {
        Some(score)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- calculate -------------------------------------------------------

    #[test]
    fn empty_input_is_unknown() {
        assert!(calculate(&[], 14).is_none());
    }

    #[test]
    fn period_zero_is_unknown() {
        assert!(calculate(&[1.0, 2.0, 3.0], 0).is_none());
    }

    #[test]
    fn insufficient_data_is_unknown() {
        // 14 closes give only 13 deltas — one short of the window.
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert!(calculate(&closes, 14).is_none());
        assert!(series(&closes, 14).is_empty());
    }

    #[test]
    fn minimum_data_produces_one_score() {
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        assert_eq!(series(&closes, 14).len(), 1);
        assert!(calculate(&closes, 14).is_some());
    }

    #[test]
    fn all_gains_score_100() {
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        for &v in &series(&closes, 14) {
            assert!((v - 100.0).abs() < 1e-10, "expected 100.0, got {v}");
        }
    }

    #[test]
    fn all_losses_score_0() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        for &v in &series(&closes, 14) {
            assert!(v.abs() < 1e-10, "expected 0.0, got {v}");
        }
    }

    #[test]
    fn flat_market_pins_to_100() {
        // No movement at all means average loss is exactly zero, and the
        // zero-loss rule is unconditional.
        let closes = vec![100.0; 30];
        let score = calculate(&closes, 14).unwrap();
        assert!((score - 100.0).abs() < 1e-10);
    }

    #[test]
    fn score_always_in_range() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        for &v in &series(&closes, 14) {
            assert!((0.0..=100.0).contains(&v), "score {v} out of range");
        }
    }

    // ---- classify --------------------------------------------------------

    #[test]
    fn classify_thresholds_are_exclusive() {
        assert_eq!(classify(70.0), MomentumSignal::Neutral);
        assert_eq!(classify(70.1), MomentumSignal::Overbought);
        assert_eq!(classify(30.0), MomentumSignal::Neutral);
        assert_eq!(classify(29.9), MomentumSignal::Oversold);
        assert_eq!(classify(50.0), MomentumSignal::Neutral);
    }

    // ---- strength --------------------------------------------------------

    #[test]
    fn strength_bands() {
        assert_eq!(strength(85.0), Strength::Strong);
        assert_eq!(strength(15.0), Strength::Strong);
        assert_eq!(strength(65.0), Strength::Moderate);
        assert_eq!(strength(35.0), Strength::Moderate);
        assert_eq!(strength(50.0), Strength::Weak);
        assert_eq!(strength(60.0), Strength::Weak);
        assert_eq!(strength(40.0), Strength::Weak);
    }

    // ---- divergence ------------------------------------------------------

    #[test]
    fn bullish_divergence_price_down_score_up() {
        let prices = vec![10.0, 9.0];
        let scores = vec![25.0, 32.0];
        assert_eq!(divergence(&prices, &scores), Some(Divergence::Bullish));
    }

    #[test]
    fn bearish_divergence_price_up_score_down() {
        let prices = vec![10.0, 11.0];
        let scores = vec![75.0, 68.0];
        assert_eq!(divergence(&prices, &scores), Some(Divergence::Bearish));
    }

    #[test]
    fn aligned_movement_is_no_divergence() {
        assert_eq!(divergence(&[10.0, 11.0], &[60.0, 65.0]), None);
        assert_eq!(divergence(&[11.0, 10.0], &[65.0, 60.0]), None);
    }

    #[test]
    fn divergence_needs_two_points_each() {
        assert_eq!(divergence(&[10.0], &[60.0, 65.0]), None);
        assert_eq!(divergence(&[10.0, 11.0], &[60.0]), None);
        assert_eq!(divergence(&[], &[]), None);
    }

    #[test]
    fn divergence_tolerates_unequal_lengths() {
        let prices = vec![10.0, 10.5, 11.0, 10.2];
        let scores = vec![55.0, 58.0];
        assert_eq!(divergence(&prices, &scores), Some(Divergence::Bullish));
    }
}
