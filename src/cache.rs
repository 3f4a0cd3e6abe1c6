//! TTL'd in-memory cache for edition distribution statistics.
//!
//! Recomputing the aggregates means scanning every pack and sticker of an
//! edition, so the validator's numbers are kept around for an hour. Entries
//! are keyed by edition id, overwritten on revalidation (single writer
//! wins), and invalidated when the edition is deleted.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::STATS_TTL_SECS;
use crate::engine::validate::DistributionStats;

/// Caches [`DistributionStats`] per edition with a time-to-live.
pub struct StatsCache {
    ttl: Duration,
    entries: HashMap<i64, (Instant, DistributionStats)>,
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(STATS_TTL_SECS))
    }
}

impl StatsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Return the cached stats for an edition if still fresh.
    pub fn get(&self, edition_id: i64) -> Option<DistributionStats> {
        let (stored_at, stats) = self.entries.get(&edition_id)?;
        if stored_at.elapsed() < self.ttl {
            Some(stats.clone())
        } else {
            None
        }
    }

    /// Store (or overwrite) the stats for an edition.
    pub fn put(&mut self, edition_id: i64, stats: DistributionStats) {
        self.entries.insert(edition_id, (Instant::now(), stats));
    }

    /// Drop the entry for an edition, if any.
    pub fn invalidate(&mut self, edition_id: i64) {
        self.entries.remove(&edition_id);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
