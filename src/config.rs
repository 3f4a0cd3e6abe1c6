//! Album layout configuration.
//!
//! A [`LayoutConfig`] is the immutable design record an edition build runs
//! against: page/slot geometry, pack and box capacities, the rarity table,
//! and the tuning knobs of the distribution engine. It is stored as JSON on
//! the template row and validated before any build touches the store.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Default chunk size for bulk inserts and updates.
pub const DEFAULT_BATCH_SIZE: usize = 5_000;

/// Default minimum distance between the two prize-pack positions of a box.
pub const DEFAULT_MIN_PRIZE_GAP: u32 = 10;

/// Seconds a cached distribution-statistics entry stays fresh.
pub const STATS_TTL_SECS: u64 = 3_600;

/// Layout and tuning configuration for one album template.
///
/// Rarity resolution: every slot except the last takes its factor from
/// `slot_rarities`. When `page_rarities` is non-empty, the last slot of each
/// page takes a per-page factor instead, so the scarcest stickers come one
/// per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub pages: u32,
    pub slots_per_page: u32,
    pub stickers_per_pack: u32,
    pub packs_per_box: u32,
    /// Sentinel page/slot value marking the surprise-prize coordinate.
    pub prize_sticker_marker: u32,
    pub surprise_prize_count: u32,
    /// Slot position within a page -> rarity factor.
    pub slot_rarities: BTreeMap<u32, Decimal>,
    /// Page -> rarity factor for that page's last slot (the scarce tier).
    pub page_rarities: BTreeMap<u32, Decimal>,
    /// Rarity factor of the prize coordinate; its count is ceiling-rounded.
    pub prize_rarity: Decimal,
    pub min_prize_gap: u32,
    pub batch_size: usize,
}

impl Default for LayoutConfig {
    /// The classic 4-page album: slots 1-2 common, 3-4 uncommon, 5 rare,
    /// slot 6 scarce with one tier per page.
    fn default() -> Self {
        Self {
            pages: 4,
            slots_per_page: 6,
            stickers_per_pack: 3,
            packs_per_box: 100,
            prize_sticker_marker: 99,
            surprise_prize_count: 4,
            slot_rarities: BTreeMap::from([
                (1, Decimal::from(3)),
                (2, Decimal::from(3)),
                (3, Decimal::from(2)),
                (4, Decimal::from(2)),
                (5, Decimal::from(1)),
            ]),
            page_rarities: BTreeMap::from([
                (1, Decimal::new(20, 3)),
                (2, Decimal::new(10, 3)),
                (3, Decimal::new(6, 3)),
                (4, Decimal::new(4, 3)),
            ]),
            prize_rarity: Decimal::new(301, 3),
            min_prize_gap: DEFAULT_MIN_PRIZE_GAP,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl LayoutConfig {
    /// Check the layout is internally consistent.
    ///
    /// Fails with [`EngineError::InvalidLayout`] when a dimension is zero,
    /// the rarity table leaves a slot uncovered, the prize marker collides
    /// with a real page, or the box geometry cannot satisfy the prize-gap
    /// sampling of the box filler.
    pub fn validate(&self) -> Result<()> {
        if self.pages == 0 || self.slots_per_page == 0 {
            return Err(EngineError::InvalidLayout(
                "pages and slots_per_page must be positive".into(),
            ));
        }
        if self.stickers_per_pack == 0 || self.packs_per_box == 0 {
            return Err(EngineError::InvalidLayout(
                "stickers_per_pack and packs_per_box must be positive".into(),
            ));
        }
        if self.prize_sticker_marker <= self.pages
            || self.prize_sticker_marker <= self.slots_per_page
        {
            return Err(EngineError::InvalidLayout(
                "prize_sticker_marker must lie outside the page/slot range".into(),
            ));
        }
        if self.surprise_prize_count == 0 {
            return Err(EngineError::InvalidLayout(
                "surprise_prize_count must be positive".into(),
            ));
        }
        if self.prize_rarity <= Decimal::ZERO {
            return Err(EngineError::InvalidLayout(
                "prize_rarity must be positive".into(),
            ));
        }
        // Two positions in [1, packs_per_box - 1] more than min_prize_gap
        // apart must exist, or the rejection sampling never terminates.
        if u64::from(self.packs_per_box) <= u64::from(self.min_prize_gap) + 2 {
            return Err(EngineError::InvalidLayout(
                "packs_per_box must exceed min_prize_gap + 2".into(),
            ));
        }
        for page in 1..=self.pages {
            for slot in 1..=self.slots_per_page {
                let factor = self.rarity_for(page, slot).ok_or_else(|| {
                    EngineError::InvalidLayout(format!(
                        "rarity table has no entry for page {} slot {}",
                        page, slot
                    ))
                })?;
                if factor < Decimal::ZERO {
                    return Err(EngineError::InvalidLayout(format!(
                        "negative rarity factor for page {} slot {}",
                        page, slot
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rarity factor for a collectible coordinate, or `None` if the table
    /// does not cover it.
    pub fn rarity_for(&self, page: u32, slot: u32) -> Option<Decimal> {
        if slot == self.slots_per_page && !self.page_rarities.is_empty() {
            self.page_rarities.get(&page).copied()
        } else {
            self.slot_rarities.get(&slot).copied()
        }
    }

    /// Number of collectible coordinates (the prize coordinate excluded).
    pub fn collectible_count(&self) -> u32 {
        self.pages * self.slots_per_page
    }
}

/// Copies of a coordinate to print for a circulation.
///
/// Collectible coordinates floor so scarce slots stay scarce; the prize
/// coordinate ceils because the trimmer removes any excess later.
pub fn sticker_count(factor: Decimal, circulation: u64, is_prize: bool) -> u64 {
    let exact = factor * Decimal::from(circulation);
    let rounded = if is_prize { exact.ceil() } else { exact.floor() };
    rounded.to_u64().unwrap_or(0)
}

/// Platform default location of the engine database file.
pub fn default_db_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("album-engine").join("album.duckdb")
    } else {
        PathBuf::from(".album-engine.duckdb")
    }
}
