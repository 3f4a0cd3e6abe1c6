//! Post-build validator: certifies the structure of a finished edition.
//!
//! Four rules, each reported individually, plus the aggregate statistics
//! the query layer caches. A box with fewer than `packs_per_box` packs is
//! the terminal box; at most one may exist and the per-box rules skip it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::store::Store;

// ---------------------------------------------------------------------------
// DistributionStats
// ---------------------------------------------------------------------------

/// Aggregate figures of one edition's tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub total_boxes: u64,
    pub total_packs: u64,
    pub prize_packs: u64,
    pub standard_packs: u64,
    pub total_stickers: u64,
}

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

/// Pass/fail per certification rule, with the measured statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Every non-terminal box holds exactly two prize packs, more than
    /// `min_prize_gap` positions apart.
    pub prize_distribution: bool,
    /// Every non-terminal box holds exactly `packs_per_box` packs.
    pub pack_counts: bool,
    /// Within each box, pack ordinals are unique; every pack is boxed and
    /// holds at least one sticker.
    pub box_integrity: bool,
    /// Every sticker sits in exactly one pack; packs stay within
    /// `stickers_per_pack` stickers and at most one prize sticker.
    pub sticker_integrity: bool,
    pub stats: DistributionStats,
}

impl ValidationReport {
    /// Whether every rule holds.
    pub fn passed(&self) -> bool {
        self.prize_distribution && self.pack_counts && self.box_integrity && self.sticker_integrity
    }

    /// Rule name -> outcome, for reporting.
    pub fn rules(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("prize_distribution", self.prize_distribution),
            ("pack_counts", self.pack_counts),
            ("box_integrity", self.box_integrity),
            ("sticker_integrity", self.sticker_integrity),
        ])
    }

    /// Names of the rules that failed.
    pub fn failed_rules(&self) -> Vec<&'static str> {
        self.rules()
            .into_iter()
            .filter_map(|(name, ok)| (!ok).then_some(name))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Check every certification rule for an edition and measure its stats.
pub fn validate(store: &Store, edition_id: i64, layout: &LayoutConfig) -> Result<ValidationReport> {
    let per_box = i64::from(layout.packs_per_box);
    let marker = layout.prize_sticker_marker;

    // Pack count per box; a missing group means an empty box.
    let box_rows = store.execute(
        &format!(
            "SELECT b.id, COUNT(p.id) AS packs \
             FROM boxes b \
             LEFT JOIN packs p ON p.box_id = b.id \
             WHERE b.edition_id = {} \
             GROUP BY b.id",
            edition_id
        ),
        &[],
    )?;

    let box_sizes: Vec<(i64, i64)> = box_rows
        .iter()
        .filter_map(|r| {
            let id = r.get("id").and_then(|v| v.as_i64())?;
            let packs = r.get("packs").and_then(|v| v.as_i64())?;
            Some((id, packs))
        })
        .collect();

    let oversized = box_sizes.iter().filter(|(_, n)| *n > per_box).count();
    let short_boxes = box_sizes.iter().filter(|(_, n)| *n < per_box).count();
    let pack_counts = oversized == 0 && short_boxes <= 1;

    // Prize-pack positions per box.
    let prize_rows = store.execute(
        &format!(
            "SELECT p.box_id, p.ordinal \
             FROM packs p \
             WHERE p.edition_id = {edition} AND p.box_id IS NOT NULL \
               AND EXISTS ( \
                   SELECT 1 FROM stickers s \
                   JOIN coordinates c ON s.coordinate_id = c.id \
                   WHERE s.pack_id = p.id AND c.page = {marker}) \
             ORDER BY p.box_id, p.ordinal",
            edition = edition_id,
            marker = marker
        ),
        &[],
    )?;

    let mut prize_positions: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    for row in &prize_rows {
        if let (Some(box_id), Some(ordinal)) = (
            row.get("box_id").and_then(|v| v.as_i64()),
            row.get("ordinal").and_then(|v| v.as_i64()),
        ) {
            prize_positions.entry(box_id).or_default().push(ordinal);
        }
    }

    // The terminal box is the short one, so filtering to full boxes
    // already skips it.
    let min_gap = i64::from(layout.min_prize_gap);
    let mut prize_distribution = true;
    for (box_id, _) in box_sizes.iter().filter(|(_, n)| *n == per_box) {
        match prize_positions.get(box_id).map(Vec::as_slice) {
            Some([first, second]) => {
                if (first - second).abs() <= min_gap {
                    prize_distribution = false;
                }
            }
            _ => prize_distribution = false,
        }
    }

    // Box integrity: unique ordinals per box, no unboxed packs, no empty packs.
    let duplicate_ordinals = store.count(
        &format!(
            "SELECT COUNT(*) FROM ( \
                 SELECT box_id, ordinal FROM packs \
                 WHERE edition_id = {} AND box_id IS NOT NULL \
                 GROUP BY box_id, ordinal HAVING COUNT(*) > 1)",
            edition_id
        ),
        &[],
    )?;
    let unboxed_packs = store.count(
        &format!(
            "SELECT COUNT(*) FROM packs WHERE edition_id = {} AND box_id IS NULL",
            edition_id
        ),
        &[],
    )?;
    let empty_packs = store.count(
        &format!(
            "SELECT COUNT(*) FROM packs p \
             WHERE p.edition_id = {} \
               AND NOT EXISTS (SELECT 1 FROM stickers s WHERE s.pack_id = p.id)",
            edition_id
        ),
        &[],
    )?;
    let box_integrity = duplicate_ordinals == 0 && unboxed_packs == 0 && empty_packs == 0;

    // Sticker integrity: everything packed, packs within capacity, at most
    // one prize sticker per pack.
    let unpacked_stickers = store.count(
        &format!(
            "SELECT COUNT(*) FROM stickers WHERE edition_id = {} AND pack_id IS NULL",
            edition_id
        ),
        &[],
    )?;
    let largest_pack = store.count(
        &format!(
            "SELECT COALESCE(MAX(n), 0) FROM ( \
                 SELECT COUNT(*) AS n FROM stickers \
                 WHERE edition_id = {} GROUP BY pack_id)",
            edition_id
        ),
        &[],
    )?;
    let most_prizes_in_pack = store.count(
        &format!(
            "SELECT COALESCE(MAX(n), 0) FROM ( \
                 SELECT COUNT(*) AS n FROM stickers s \
                 JOIN coordinates c ON s.coordinate_id = c.id \
                 WHERE s.edition_id = {} AND c.page = {} AND s.pack_id IS NOT NULL \
                 GROUP BY s.pack_id)",
            edition_id, marker
        ),
        &[],
    )?;
    let sticker_integrity = unpacked_stickers == 0
        && largest_pack <= i64::from(layout.stickers_per_pack)
        && most_prizes_in_pack <= 1;

    let stats = measure(store, edition_id, marker)?;

    Ok(ValidationReport {
        prize_distribution,
        pack_counts,
        box_integrity,
        sticker_integrity,
        stats,
    })
}

/// Measure the aggregate statistics of an edition.
pub fn measure(store: &Store, edition_id: i64, marker: u32) -> Result<DistributionStats> {
    let total_boxes = store.count(
        &format!("SELECT COUNT(*) FROM boxes WHERE edition_id = {}", edition_id),
        &[],
    )? as u64;
    let total_packs = store.count(
        &format!("SELECT COUNT(*) FROM packs WHERE edition_id = {}", edition_id),
        &[],
    )? as u64;
    let prize_packs = store.count(
        &format!(
            "SELECT COUNT(*) FROM packs p \
             WHERE p.edition_id = {edition} \
               AND EXISTS ( \
                   SELECT 1 FROM stickers s \
                   JOIN coordinates c ON s.coordinate_id = c.id \
                   WHERE s.pack_id = p.id AND c.page = {marker})",
            edition = edition_id,
            marker = marker
        ),
        &[],
    )? as u64;
    let total_stickers = store.count(
        &format!(
            "SELECT COUNT(*) FROM stickers WHERE edition_id = {}",
            edition_id
        ),
        &[],
    )? as u64;

    Ok(DistributionStats {
        total_boxes,
        total_packs,
        prize_packs,
        standard_packs: total_packs - prize_packs,
        total_stickers,
    })
}
