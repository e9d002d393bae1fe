// =============================================================================
// Moving Average Convergence Divergence (MACD)
// =============================================================================
//
// MACD is the difference of two exponential moving averages, read against a
// smoothed signal line:
//
//   line      = EMA(fast) - EMA(slow)        (a full series)
//   signal    = EMA(line, signal_period)
//   histogram = line[last] - signal[last]
//
// Each EMA is computed over the full input: the first `period` slots carry
// the seed SMA of the first `period` samples, then the recurrence
//
//   EMA_t = close_t * m + EMA_{t-1} * (1 - m),   m = 2 / (period + 1)
//
// runs forward. Keeping the arrays full-length keeps the fast and slow
// series index-aligned so the line can be formed elementwise.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{ConvergenceSignal, Divergence, MacdQuote, Strength};

/// Default fast EMA period.
pub const DEFAULT_FAST: usize = 12;
/// Default slow EMA period.
pub const DEFAULT_SLOW: usize = 26;
/// Default signal-line EMA period.
pub const DEFAULT_SIGNAL: usize = 9;

/// Final values of the oscillator: all three present together or not at all.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdTriple {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

impl MacdTriple {
    /// Complete a source-supplied pair into the full triple. The histogram
    /// is the line-signal difference by definition, so nothing is lost.
    pub fn from_quote(quote: MacdQuote) -> Self {
        Self {
            line: quote.macd,
            signal: quote.signal,
            histogram: quote.macd - quote.signal,
        }
    }
}

/// Compute the final (line, signal, histogram) triple.
///
/// Prices are ordered oldest-first. Requires at least `slow + signal_period`
/// samples; anything less returns `None` — the all-unknown outcome. Partial
/// triples are never produced.
pub fn calculate(
    prices: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Option<MacdTriple> {
    if prices.len() < slow + signal_period {
        debug!(
            samples = prices.len(),
            required = slow + signal_period,
            "convergence triple unavailable: insufficient data"
        );
        return None;
    }

    let line = line_series(prices, fast, slow)?;
    let signal = ema_series(&line, signal_period)?;

    let line_last = *line.last()?;
    let signal_last = *signal.last()?;
    let histogram = line_last - signal_last;

    if !histogram.is_finite() {
        return None;
    }

    Some(MacdTriple {
        line: line_last,
        signal: signal_last,
        histogram,
    })
}

/// The full oscillator-line series (fast EMA minus slow EMA, elementwise).
///
/// Exposed separately so divergence checks can compare the line's history
/// against the price history.
pub fn line_series(prices: &[f64], fast: usize, slow: usize) -> Option<Vec<f64>> {
    let fast_ema = ema_series(prices, fast)?;
    let slow_ema = ema_series(prices, slow)?;

    Some(
        fast_ema
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect(),
    )
}

/// Classify the triple, strongest reading first; the first match wins.
pub fn classify(triple: &MacdTriple) -> ConvergenceSignal {
    let MacdTriple {
        line,
        signal,
        histogram,
    } = *triple;

    if line > signal && histogram > 0.0 && line > 0.0 {
        ConvergenceSignal::StrongBuy
    } else if line < signal && histogram < 0.0 && line < 0.0 {
        ConvergenceSignal::StrongSell
    } else if line > signal && histogram > 0.0 {
        ConvergenceSignal::Buy
    } else if line < signal && histogram < 0.0 {
        ConvergenceSignal::Sell
    } else {
        ConvergenceSignal::Neutral
    }
}

/// Trend strength implied by the histogram's magnitude.
pub fn strength(histogram: f64) -> Strength {
    let h = histogram.abs();
    if h > 0.5 {
        Strength::Strong
    } else if h > 0.2 {
        Strength::Moderate
    } else {
        Strength::Weak
    }
}

/// Compare the last two price points against the last two line points.
/// Same shape as the momentum oscillator's divergence check.
pub fn divergence(prices: &[f64], line: &[f64]) -> Option<Divergence> {
    if prices.len() < 2 || line.len() < 2 {
        return None;
    }

    let (p_prev, p_last) = (prices[prices.len() - 2], prices[prices.len() - 1]);
    let (l_prev, l_last) = (line[line.len() - 2], line[line.len() - 1]);

    if p_last < p_prev && l_last > l_prev {
        Some(Divergence::Bullish)
    } else if p_last > p_prev && l_last < l_prev {
        Some(Divergence::Bearish)
    } else {
        None
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Full-length EMA: the first `period` slots hold the seed SMA, the rest
/// follow the recurrence.
///
/// Returns `None` when the input is too short, the period is zero, or a
/// non-finite value appears.
fn ema_series(values: &[f64], period: usize) -> Option<Vec<f64>> {
    if period == 0 || values.len() < period {
        return None;
    }

    let multiplier = 2.0 / (period + 1) as f64;
    let sma: f64 = values[..period].iter().sum::<f64>() / period as f64;
    if !sma.is_finite() {
        return None;
    }

    let mut ema = vec![sma; period];
    ema.reserve(values.len() - period);

    let mut prev = sma;
    for &value in &values[period..] {
        let next = value * multiplier + prev * (1.0 - multiplier);
        if !next.is_finite() {
            return None;
        }
        ema.push(next);
        prev = next;
    }

    Some(ema)
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    // ---- ema_series ------------------------------------------------------

    #[test]
    fn ema_seed_fills_first_period_slots() {
        let ema = ema_series(&[2.0, 4.0, 6.0], 3).unwrap();
        assert_eq!(ema, vec![4.0, 4.0, 4.0]);
    }

    #[test]
    fn ema_recurrence_after_seed() {
        // Seed SMA of [2,4,6] is 4, multiplier 2/4 = 0.5.
        // Next: 8 * 0.5 + 4 * 0.5 = 6.
        let ema = ema_series(&[2.0, 4.0, 6.0, 8.0], 3).unwrap();
        assert_eq!(ema.len(), 4);
        assert!((ema[3] - 6.0).abs() < 1e-10);
    }

    #[test]
    fn ema_rejects_short_input_and_zero_period() {
        assert!(ema_series(&[1.0, 2.0], 3).is_none());
        assert!(ema_series(&[1.0, 2.0, 3.0], 0).is_none());
    }

    #[test]
    fn ema_rejects_non_finite_input() {
        assert!(ema_series(&[1.0, 2.0, f64::NAN, 4.0], 2).is_none());
    }

    // ---- calculate -------------------------------------------------------

    #[test]
    fn insufficient_data_is_all_unknown() {
        // Requires slow + signal = 26 + 9 = 35 samples.
        let prices: Vec<f64> = (1..=34).map(|x| x as f64).collect();
        assert!(calculate(&prices, 12, 26, 9).is_none());
    }

    #[test]
    fn minimum_data_produces_full_triple() {
        let prices: Vec<f64> = (1..=35).map(|x| x as f64).collect();
        let triple = calculate(&prices, 12, 26, 9).unwrap();
        assert!(triple.line.is_finite());
        assert!(triple.signal.is_finite());
        assert!(triple.histogram.is_finite());
        assert!((triple.histogram - (triple.line - triple.signal)).abs() < 1e-10);
    }

    #[test]
    fn constant_series_is_flat_neutral() {
        let prices = vec![50.0; 40];
        let triple = calculate(&prices, 12, 26, 9).unwrap();
        assert!(triple.line.abs() < 1e-10);
        assert!(triple.signal.abs() < 1e-10);
        assert!(triple.histogram.abs() < 1e-10);
        assert_eq!(classify(&triple), ConvergenceSignal::Neutral);
    }

    #[test]
    fn rising_series_reads_bullish() {
        // A steady ramp keeps the fast EMA above the slow EMA.
        let prices: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        let triple = calculate(&prices, 12, 26, 9).unwrap();
        assert!(triple.line > 0.0);
        assert!(triple.histogram > 0.0);
        assert_eq!(classify(&triple), ConvergenceSignal::StrongBuy);
    }

    #[test]
    fn falling_series_reads_bearish() {
        let prices: Vec<f64> = (1..=60).rev().map(|x| x as f64).collect();
        let triple = calculate(&prices, 12, 26, 9).unwrap();
        assert!(triple.line < 0.0);
        assert!(triple.histogram < 0.0);
        assert_eq!(classify(&triple), ConvergenceSignal::StrongSell);
    }

    #[test]
    fn small_periods_match_hand_computation() {
        // fast=2, slow=3, signal=2 over [1..=6].
        // EMA2 = [1.5, 1.5, 2.5, 3.5, 4.5, 5.5]            (m = 2/3)
        //   seed SMA(1,2) = 1.5; 3*2/3 + 1.5/3 = 2.5; then 3.5, 4.5, 5.5.
        // EMA3 = [2, 2, 2, 3, 4, 5]                        (m = 1/2)
        //   seed SMA(1,2,3) = 2; 4*.5 + 2*.5 = 3; then 4, 5.
        // line = [-0.5, -0.5, 0.5, 0.5, 0.5, 0.5]
        // signal = EMA(line, 2): seed -0.5, then (2/3)*0.5 + (1/3)*(-0.5) = 1/6,
        //   then (2/3)*0.5 + (1/3)*(1/6) = 7/18, then (2/3)*0.5 + (1/3)*(7/18) = 25/54.
        let prices: Vec<f64> = (1..=6).map(|x| x as f64).collect();
        let triple = calculate(&prices, 2, 3, 2).unwrap();
        assert!((triple.line - 0.5).abs() < 1e-10);
        assert!((triple.signal - 25.0 / 54.0).abs() < 1e-10);
        assert!((triple.histogram - (0.5 - 25.0 / 54.0)).abs() < 1e-10);
    }

    // ---- from_quote ------------------------------------------------------

    #[test]
    fn quote_completion_derives_histogram() {
        let triple = MacdTriple::from_quote(MacdQuote {
            macd: 1.5,
            signal: 1.0,
        });
        assert!((triple.histogram - 0.5).abs() < 1e-10);
    }

    // ---- classify --------------------------------------------------------

    fn triple(line: f64, signal: f64) -> MacdTriple {
        MacdTriple {
            line,
            signal,
            histogram: line - signal,
        }
    }

    #[test]
    fn classify_strong_buy_requires_positive_line() {
        assert_eq!(classify(&triple(1.0, 0.5)), ConvergenceSignal::StrongBuy);
        assert_eq!(classify(&triple(-0.2, -0.5)), ConvergenceSignal::Buy);
    }

    #[test]
    fn classify_strong_sell_requires_negative_line() {
        assert_eq!(classify(&triple(-1.0, -0.5)), ConvergenceSignal::StrongSell);
        assert_eq!(classify(&triple(0.2, 0.5)), ConvergenceSignal::Sell);
    }

    #[test]
    fn classify_equal_lines_is_neutral() {
        assert_eq!(classify(&triple(1.0, 1.0)), ConvergenceSignal::Neutral);
    }

    // ---- strength --------------------------------------------------------

    #[test]
    fn strength_bands_on_histogram_magnitude() {
        assert_eq!(strength(0.6), Strength::Strong);
        assert_eq!(strength(-0.6), Strength::Strong);
        assert_eq!(strength(0.5), Strength::Moderate);
        assert_eq!(strength(0.3), Strength::Moderate);
        assert_eq!(strength(0.2), Strength::Weak);
        assert_eq!(strength(0.0), Strength::Weak);
    }

    // ---- divergence ------------------------------------------------------

    #[test]
    fn line_divergence_mirrors_momentum_rule() {
        assert_eq!(
            divergence(&[10.0, 9.5], &[-0.2, 0.1]),
            Some(Divergence::Bullish)
        );
        assert_eq!(
            divergence(&[10.0, 10.5], &[0.2, -0.1]),
            Some(Divergence::Bearish)
        );
        assert_eq!(divergence(&[10.0, 10.5], &[0.1, 0.2]), None);
        assert_eq!(divergence(&[10.0], &[0.1, 0.2]), None);
    }
}
