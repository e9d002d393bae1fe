// =============================================================================
// Snapshot Feed — the data-acquisition boundary
// =============================================================================
//
// The engine is a pure function of the snapshots handed to it; everything
// that produces snapshots (scrapers, vendor APIs, fixtures) sits behind the
// `SnapshotSource` trait.
//
// Series-ordering adapters live here and nowhere else. The engine's
// canonical ordering is oldest-first (most recent sample last); a watchlist
// that carries newest-first series declares it in its header and is
// reversed on load. Downstream code never guesses.
// =============================================================================

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::types::InstrumentSnapshot;

/// Anything that can hand the engine instrument snapshots.
pub trait SnapshotSource {
    /// Symbols this source currently knows about, in source order.
    fn symbols(&self) -> Vec<String>;

    /// The snapshot for `symbol`, or `None` when the source has nothing.
    fn snapshot(&self, symbol: &str) -> Option<InstrumentSnapshot>;
}

/// Declared ordering of the `prices` / `volumes` series in a watchlist file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesOrder {
    /// Oldest sample first — the engine's canonical ordering.
    #[default]
    OldestFirst,
    /// Most recent sample first; reversed on load.
    NewestFirst,
}

/// On-disk watchlist shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WatchlistFile {
    #[serde(default)]
    series_order: SeriesOrder,
    snapshots: Vec<InstrumentSnapshot>,
}

/// A watchlist file loaded into memory. Snapshots are canonicalized and
/// shape-checked once, on load.
pub struct FileSource {
    order: Vec<String>,
    snapshots: HashMap<String, InstrumentSnapshot>,
}

impl FileSource {
    /// Load a watchlist from a JSON file at `path`.
    ///
    /// Snapshots with non-finite numeric fields are rejected here, with a
    /// warning, so the engine never sees them — an absent symbol and an
    /// unusable one look the same to callers.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read watchlist from {}", path.display()))?;

        let file: WatchlistFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse watchlist from {}", path.display()))?;

        let mut order = Vec::with_capacity(file.snapshots.len());
        let mut snapshots = HashMap::with_capacity(file.snapshots.len());

        for mut snapshot in file.snapshots {
            canonicalize(&mut snapshot, file.series_order);

            if !snapshot.is_well_formed() {
                warn!(symbol = %snapshot.symbol, "rejecting malformed snapshot (non-finite field)");
                continue;
            }

            if snapshots.contains_key(&snapshot.symbol) {
                warn!(symbol = %snapshot.symbol, "duplicate symbol in watchlist; keeping the first");
                continue;
            }

            order.push(snapshot.symbol.clone());
            snapshots.insert(snapshot.symbol.clone(), snapshot);
        }

        info!(
            path = %path.display(),
            symbols = order.len(),
            order = ?file.series_order,
            "watchlist loaded"
        );

        Ok(Self { order, snapshots })
    }
}

impl SnapshotSource for FileSource {
    fn symbols(&self) -> Vec<String> {
        self.order.clone()
    }

    fn snapshot(&self, symbol: &str) -> Option<InstrumentSnapshot> {
        self.snapshots.get(symbol).cloned()
    }
}

/// Rewrite a snapshot's series into the canonical oldest-first ordering.
pub fn canonicalize(snapshot: &mut InstrumentSnapshot, order: SeriesOrder) {
    if order == SeriesOrder::NewestFirst {
        snapshot.prices.reverse();
        snapshot.volumes.reverse();
    }
}
