// =============================================================================
// Analysis Pipeline — snapshot in, recommendation out
// =============================================================================
//
// Orchestrates one instrument's analysis:
//
//   1. Read indicators: source-supplied values win, otherwise derive from
//      the price/volume history
//   2. Classify trend, volatility, strength
//   3. Aggregate the qualitative readings into the signal set
//   4. Synthesize risk metrics and the recommendation label
//   5. Assemble the result record
//
// Every stage degrades to its documented default; `analyze` is total over a
// well-formed snapshot. The pipeline holds no state between calls.
// =============================================================================

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify;
use crate::config::{EngineConfig, IndicatorParams};
use crate::feed::SnapshotSource;
use crate::indicators::macd::{self, MacdTriple};
use crate::indicators::rsi;
use crate::indicators::volume::{self, VolumeSummary};
use crate::recommend;
use crate::risk::{self, RiskMetrics};
use crate::signals::{self, SignalSet};
use crate::types::{
    ConvergenceSignal, Divergence, InstrumentSnapshot, MomentumSignal, Recommendation, Strength,
    Trend, Volatility,
};

/// One analysis pass over the indicator layer. Computed once per call, never
/// cached or mutated.
#[derive(Debug, Clone)]
pub struct IndicatorReading {
    pub momentum: Option<f64>,
    pub momentum_signal: MomentumSignal,
    pub convergence: Option<MacdTriple>,
    pub convergence_signal: ConvergenceSignal,
    pub momentum_divergence: Option<Divergence>,
    pub convergence_divergence: Option<Divergence>,
    pub volume: VolumeSummary,
}

/// The full output record, owned by the caller after return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub volume: u64,

    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub convergence_signal: ConvergenceSignal,

    pub trend: Trend,
    pub trend_strength: Strength,
    pub volatility: Volatility,
    pub support: Option<f64>,
    pub resistance: Option<f64>,

    pub signals: SignalSet,
    pub volume_summary: VolumeSummary,
    pub volume_confirms_trend: bool,
    pub momentum_divergence: Option<Divergence>,
    pub convergence_divergence: Option<Divergence>,

    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub win_rate: u32,
    pub risk_percentage: f64,
    pub recommendation: Recommendation,
}

/// A ranked entry for the recommendation table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedRecommendation {
    pub symbol: String,
    pub action: Recommendation,
    pub win_rate: u32,
    pub risk: f64,
}

/// Stateless per-call orchestrator; cheap to clone into scan tasks.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: EngineConfig,
}

impl AnalysisPipeline {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Analyze one snapshot. Total: internal component failures degrade to
    /// their defaults rather than propagating.
    pub fn analyze(&self, snapshot: &InstrumentSnapshot) -> AnalysisResult {
        let reading = self.read_indicators(snapshot);

        // --- Classification --------------------------------------------------
        let trend = classify::trend(snapshot.change);
        let volatility = classify::volatility(snapshot.high_52w, snapshot.low_52w);
        let sr = classify::support_resistance(snapshot.high_52w, snapshot.low_52w);

        let momentum_strength = reading
            .momentum
            .map(rsi::strength)
            .unwrap_or(Strength::Weak);
        let convergence_strength = reading
            .convergence
            .map(|t| macd::strength(t.histogram))
            .unwrap_or(Strength::Weak);
        let strength = classify::combine_strength(momentum_strength, convergence_strength);

        // --- Aggregation -----------------------------------------------------
        let signal_set = signals::aggregate(
            reading.momentum_signal,
            reading.convergence.as_ref(),
            trend,
            volatility,
        );

        // --- Synthesis -------------------------------------------------------
        let metrics = risk::plan(snapshot.price, trend, volatility, &signal_set, strength);
        let recommendation = recommend::synthesize(&signal_set, trend, strength);

        debug!(
            symbol = %snapshot.symbol,
            %trend,
            %volatility,
            %strength,
            signals = signal_set.len(),
            win_rate = metrics.win_rate,
            %recommendation,
            "analysis complete"
        );

        self.assemble(snapshot, reading, trend, volatility, strength, sr, signal_set, metrics, recommendation)
    }

    /// Analyze the symbol the source knows about; `None` exactly when the
    /// source has no snapshot for it.
    pub fn analyze_symbol(
        &self,
        source: &dyn SnapshotSource,
        symbol: &str,
    ) -> Option<AnalysisResult> {
        let snapshot = source.snapshot(symbol)?;
        Some(self.analyze(&snapshot))
    }

    /// Every analyzable candidate, unsorted, paired with its action,
    /// win-rate, and risk percentage.
    pub fn rank_all(&self, source: &dyn SnapshotSource) -> Vec<RankedRecommendation> {
        source
            .symbols()
            .iter()
            .filter_map(|symbol| self.analyze_symbol(source, symbol))
            .map(|result| rank_entry(&result))
            .collect()
    }

    /// The top candidates by win-rate, descending.
    pub fn top_recommendations(&self, source: &dyn SnapshotSource) -> Vec<RankedRecommendation> {
        let mut ranked = self.rank_all(source);
        rank_by_win_rate(&mut ranked);
        ranked.truncate(self.config.top_n);
        ranked
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Compute the indicator layer. Source-supplied values take precedence
    /// over derivation from history.
    fn read_indicators(&self, snapshot: &InstrumentSnapshot) -> IndicatorReading {
        let IndicatorParams {
            rsi_period,
            macd_fast,
            macd_slow,
            macd_signal,
        } = self.config.indicator_params;

        let prices = &snapshot.prices;

        // Momentum: the score series is also needed for the divergence check.
        let momentum_series = rsi::series(prices, rsi_period);
        let momentum = snapshot.rsi.or_else(|| momentum_series.last().copied());
        let momentum_signal = momentum.map(rsi::classify).unwrap_or(MomentumSignal::Neutral);
        let momentum_divergence = rsi::divergence(prices, &momentum_series);

        // Convergence: a source-supplied pair is completed into the triple.
        let convergence = snapshot
            .macd
            .map(MacdTriple::from_quote)
            .or_else(|| macd::calculate(prices, macd_fast, macd_slow, macd_signal));
        let convergence_signal = convergence
            .as_ref()
            .map(macd::classify)
            .unwrap_or(ConvergenceSignal::Neutral);
        let convergence_divergence = macd::line_series(prices, macd_fast, macd_slow)
            .and_then(|line| macd::divergence(prices, &line));

        let volume = volume::analyze(prices, &snapshot.volumes);

        IndicatorReading {
            momentum,
            momentum_signal,
            convergence,
            convergence_signal,
            momentum_divergence,
            convergence_divergence,
            volume,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        &self,
        snapshot: &InstrumentSnapshot,
        reading: IndicatorReading,
        trend: Trend,
        volatility: Volatility,
        strength: Strength,
        sr: classify::SupportResistance,
        signal_set: SignalSet,
        metrics: RiskMetrics,
        recommendation: Recommendation,
    ) -> AnalysisResult {
        let volume_confirms_trend = volume::confirms_trend(trend, &reading.volume);

        AnalysisResult {
            symbol: snapshot.symbol.clone(),
            price: snapshot.price,
            change: snapshot.change,
            volume: snapshot.volume,

            rsi: reading.momentum,
            macd: reading.convergence.map(|t| t.line),
            macd_signal: reading.convergence.map(|t| t.signal),
            macd_histogram: reading.convergence.map(|t| t.histogram),
            convergence_signal: reading.convergence_signal,

            trend,
            trend_strength: strength,
            volatility,
            support: sr.support,
            resistance: sr.resistance,

            signals: signal_set,
            volume_summary: reading.volume,
            volume_confirms_trend,
            momentum_divergence: reading.momentum_divergence,
            convergence_divergence: reading.convergence_divergence,

            entry_price: metrics.entry_price,
            stop_loss: metrics.stop_loss,
            take_profit: metrics.take_profit,
            win_rate: metrics.win_rate,
            risk_percentage: metrics.risk_percentage,
            recommendation,
        }
    }
}

/// Project a result onto its ranking entry.
pub fn rank_entry(result: &AnalysisResult) -> RankedRecommendation {
    RankedRecommendation {
        symbol: result.symbol.clone(),
        action: result.recommendation,
        win_rate: result.win_rate,
        risk: result.risk_percentage,
    }
}

/// Stable sort by win-rate, highest first.
pub fn rank_by_win_rate(ranked: &mut [RankedRecommendation]) {
    ranked.sort_by(|a, b| b.win_rate.cmp(&a.win_rate));
}
