// =============================================================================
// Volume Profile Analysis
// =============================================================================
//
// Reads parallel price/volume history and produces a fixed-shape summary:
//
//   - trailing average volume (20-sample window)
//   - volume trend from the least-squares slope of the last 10 samples
//   - Pearson correlation between consecutive price and volume changes
//   - anomaly flag from the z-score of the latest volume against the
//     trailing window
//   - a prioritized qualitative signal
//
// The analysis never fails: missing, mismatched, or too-short inputs yield
// the default summary. A length mismatch is a caller contract violation and
// is logged, but still degrades instead of panicking.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Trend;

/// Window for the trailing average, correlation, and anomaly check.
const AVERAGE_WINDOW: usize = 20;
/// Window for the slope-based trend fit.
const TREND_WINDOW: usize = 10;
/// |z-score| above which the latest volume counts as anomalous.
const ANOMALY_THRESHOLD: f64 = 2.0;

/// Direction of the recent volume drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Neutral,
}

impl std::fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increasing => write!(f, "increasing"),
            Self::Decreasing => write!(f, "decreasing"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Qualitative volume signal, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSignal {
    StrongVolume,
    WeakVolume,
    UnusualVolume,
    NormalVolume,
}

impl std::fmt::Display for VolumeSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongVolume => write!(f, "strong_volume"),
            Self::WeakVolume => write!(f, "weak_volume"),
            Self::UnusualVolume => write!(f, "unusual_volume"),
            Self::NormalVolume => write!(f, "normal_volume"),
        }
    }
}

/// Fixed-shape result of the volume analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub average_volume: f64,
    pub volume_trend: VolumeTrend,
    pub price_volume_correlation: f64,
    pub unusual_volume: bool,
    pub volume_signal: VolumeSignal,
}

impl Default for VolumeSummary {
    fn default() -> Self {
        Self {
            average_volume: 0.0,
            volume_trend: VolumeTrend::Neutral,
            price_volume_correlation: 0.0,
            unusual_volume: false,
            volume_signal: VolumeSignal::NormalVolume,
        }
    }
}

/// Analyze paired price/volume history, oldest first.
pub fn analyze(prices: &[f64], volumes: &[u64]) -> VolumeSummary {
    if prices.len() != volumes.len() {
        warn!(
            prices = prices.len(),
            volumes = volumes.len(),
            "price/volume length mismatch; caller must align series first"
        );
        return VolumeSummary::default();
    }
    if prices.len() < 2 {
        return VolumeSummary::default();
    }

    let volumes_f: Vec<f64> = volumes.iter().map(|&v| v as f64).collect();

    let average_volume = trailing_average(&volumes_f, AVERAGE_WINDOW);
    let volume_trend = trend(&volumes_f, TREND_WINDOW);
    let price_volume_correlation = change_correlation(prices, &volumes_f, AVERAGE_WINDOW);
    let unusual_volume = is_unusual(&volumes_f, AVERAGE_WINDOW, ANOMALY_THRESHOLD);

    let current = volumes_f.last().copied().unwrap_or(0.0);
    let volume_signal = signal(current, average_volume, volume_trend, unusual_volume);

    VolumeSummary {
        average_volume,
        volume_trend,
        price_volume_correlation,
        unusual_volume,
        volume_signal,
    }
}

/// True when the volume drift agrees with the price trend: rising volume in
/// an uptrend or falling volume in a downtrend.
pub fn confirms_trend(price_trend: Trend, summary: &VolumeSummary) -> bool {
    matches!(
        (price_trend, summary.volume_trend),
        (Trend::Uptrend, VolumeTrend::Increasing) | (Trend::Downtrend, VolumeTrend::Decreasing)
    )
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Mean of the last `window` samples; 0 when fewer are available. No
/// partial-window estimate is made.
fn trailing_average(volumes: &[f64], window: usize) -> f64 {
    if volumes.len() < window {
        return 0.0;
    }
    let tail = &volumes[volumes.len() - window..];
    tail.iter().sum::<f64>() / window as f64
}

/// Sign of the least-squares slope over the last `window` samples.
fn trend(volumes: &[f64], window: usize) -> VolumeTrend {
    if volumes.len() < window {
        return VolumeTrend::Neutral;
    }
    let tail = &volumes[volumes.len() - window..];

    let n = tail.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = tail.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in tail.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }

    if den == 0.0 {
        return VolumeTrend::Neutral;
    }
    let slope = num / den;

    if slope > 0.0 {
        VolumeTrend::Increasing
    } else if slope < 0.0 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Neutral
    }
}

/// Pearson correlation between the consecutive-difference series of the last
/// `window` prices and volumes. 0 when fewer than `window` samples are
/// available or the correlation is undefined (zero variance on either side).
fn change_correlation(prices: &[f64], volumes: &[f64], window: usize) -> f64 {
    if prices.len() < window || volumes.len() < window {
        return 0.0;
    }

    let price_tail = &prices[prices.len() - window..];
    let volume_tail = &volumes[volumes.len() - window..];

    let price_changes: Vec<f64> = price_tail.windows(2).map(|w| w[1] - w[0]).collect();
    let volume_changes: Vec<f64> = volume_tail.windows(2).map(|w| w[1] - w[0]).collect();

    let correlation = pearson(&price_changes, &volume_changes);
    if correlation.is_finite() {
        correlation
    } else {
        0.0
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    if n == 0.0 {
        return f64::NAN;
    }

    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Z-score test for the most recent volume against the trailing window's
/// mean and population standard deviation. Zero variance is not anomalous.
fn is_unusual(volumes: &[f64], window: usize, threshold: f64) -> bool {
    if volumes.len() < window {
        return false;
    }
    let tail = &volumes[volumes.len() - window..];

    let n = tail.len() as f64;
    let mean = tail.iter().sum::<f64>() / n;
    let variance = tail.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    if std_dev == 0.0 {
        return false;
    }

    let current = tail[tail.len() - 1];
    let z = (current - mean) / std_dev;
    z.abs() > threshold
}

/// Priority order: strong, weak, unusual, normal.
fn signal(current: f64, average: f64, trend: VolumeTrend, unusual: bool) -> VolumeSignal {
    if current > average * 2.0 && trend == VolumeTrend::Increasing {
        VolumeSignal::StrongVolume
    } else if current < average * 0.5 && trend == VolumeTrend::Decreasing {
        VolumeSignal::WeakVolume
    } else if unusual {
        VolumeSignal::UnusualVolume
    } else {
        VolumeSignal::NormalVolume
    }
}
