// =============================================================================
// Scan Runner — batch analysis across independent tasks
// =============================================================================
//
// Each instrument's analysis is an independent unit of work: the runner
// fans the watchlist out one tokio task per symbol and joins the results.
// There is no ordering guarantee between instruments and nothing to
// synchronize inside the engine; the only shared state is the bounded
// history of completed scan records kept for diagnostics.
// =============================================================================

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::feed::SnapshotSource;
use crate::pipeline::{rank_by_win_rate, rank_entry, AnalysisPipeline, AnalysisResult, RankedRecommendation};

/// Maximum number of completed scans to retain.
const MAX_RECENT_SCANS: usize = 20;

/// Everything one scan produced, stamped for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    /// Unique identifier for this scan (UUID v4).
    pub id: String,
    /// ISO 8601 timestamp of when the scan started.
    pub started_at: String,
    /// Wall-clock duration of the scan.
    pub duration_ms: u64,
    /// Full analysis record per instrument, in completion order.
    pub results: Vec<AnalysisResult>,
    /// Ranked recommendation table (win-rate descending, truncated).
    pub top: Vec<RankedRecommendation>,
}

/// Runs scans and remembers the recent ones.
pub struct Scanner {
    pipeline: AnalysisPipeline,
    recent: RwLock<Vec<ScanRecord>>,
}

impl Scanner {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            pipeline: AnalysisPipeline::new(config),
            recent: RwLock::new(Vec::new()),
        }
    }

    /// Run one scan over every symbol the source knows about.
    ///
    /// Analyses run concurrently; a task that fails to join is dropped from
    /// the batch with a warning rather than failing the scan.
    pub async fn run(&self, source: Arc<dyn SnapshotSource + Send + Sync>) -> ScanRecord {
        let started = Instant::now();
        let started_at = Utc::now().to_rfc3339();
        let symbols = source.symbols();

        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let pipeline = self.pipeline.clone();
                let source = source.clone();
                let symbol = symbol.clone();
                tokio::spawn(async move { pipeline.analyze_symbol(source.as_ref(), &symbol) })
            })
            .collect();

        let mut results = Vec::with_capacity(symbols.len());
        for outcome in join_all(handles).await {
            match outcome {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "analysis task failed to join"),
            }
        }

        let mut top: Vec<RankedRecommendation> = results.iter().map(rank_entry).collect();
        rank_by_win_rate(&mut top);
        top.truncate(self.pipeline.config().top_n);

        let record = ScanRecord {
            id: uuid::Uuid::new_v4().to_string(),
            started_at,
            duration_ms: started.elapsed().as_millis() as u64,
            results,
            top,
        };

        info!(
            scan_id = %record.id,
            analyzed = record.results.len(),
            of = symbols.len(),
            duration_ms = record.duration_ms,
            "scan complete"
        );

        self.remember(record.clone());
        record
    }

    /// Recent scan records, oldest first.
    pub fn recent(&self) -> Vec<ScanRecord> {
        self.recent.read().clone()
    }

    fn remember(&self, record: ScanRecord) {
        let mut recent = self.recent.write();
        recent.push(record);
        while recent.len() > MAX_RECENT_SCANS {
            recent.remove(0);
        }
    }
}

/// Write a scan record as pretty JSON using an atomic tmp + rename write.
pub fn write_report(record: &ScanRecord, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();

    let content =
        serde_json::to_string_pretty(record).context("failed to serialise scan report")?;

    let tmp_path = path.with_extension("json.tmp");

    std::fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write tmp report to {}", tmp_path.display()))?;

    std::fs::rename(&tmp_path, path)
        .with_context(|| format!("failed to rename tmp report to {}", path.display()))?;

    info!(path = %path.display(), "scan report written");
    Ok(())
}
