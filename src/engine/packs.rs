//! Pack packer and prize-sticker trimmer.
//!
//! The packer walks the shuffled sticker order as a FIFO queue and fills
//! fixed-size packs, deferring any second prize sticker a pack would
//! receive to a holding queue that is served once the main queue drains.
//! The trimmer later caps the prize-sticker population at two per box.

use std::collections::VecDeque;

use serde::Deserialize;

use crate::config::LayoutConfig;
use crate::error::{EngineError, Result};
use crate::store::Store;

#[derive(Deserialize)]
struct StickerRow {
    id: i64,
    is_prize: bool,
}

/// Assign every sticker of the edition to a pack.
///
/// Packs hold at most `stickers_per_pack` stickers and at most one prize
/// sticker each; only the final pack may be short. Deterministic given the
/// sticker ordinal order, so a seeded build reproduces the same layout.
/// Returns the number of packs created.
pub fn pack_stickers(store: &Store, edition_id: i64, layout: &LayoutConfig) -> Result<u64> {
    let total = store.count(
        &format!("SELECT COUNT(*) FROM stickers WHERE edition_id = {}", edition_id),
        &[],
    )?;
    if total == 0 {
        return Ok(0);
    }

    let per_pack = i64::from(layout.stickers_per_pack);
    let planned = (total + per_pack - 1) / per_pack;

    let pack_rows: Vec<String> = (1..=planned)
        .map(|ordinal| format!("({}, {})", edition_id, ordinal))
        .collect();
    store.insert_rows("packs", "(edition_id, ordinal)", &pack_rows, layout.batch_size)?;

    let pack_ids: Vec<i64> = pack_id_range(store, edition_id, 1, planned)?;

    // Shuffled sticker order is the FIFO queue driving placement.
    let mut queue: VecDeque<(i64, bool)> = store
        .execute_into::<StickerRow>(
            &format!(
                "SELECT s.id, (c.page = {marker}) AS is_prize \
                 FROM stickers s \
                 JOIN coordinates c ON s.coordinate_id = c.id \
                 WHERE s.edition_id = {edition} \
                 ORDER BY s.ordinal",
                marker = layout.prize_sticker_marker,
                edition = edition_id
            ),
            &[],
        )?
        .into_iter()
        .map(|row| (row.id, row.is_prize))
        .collect();

    let mut deferred: VecDeque<(i64, bool)> = VecDeque::new();
    let mut assignments: Vec<(i64, String)> = Vec::with_capacity(total as usize);

    for pack_id in &pack_ids {
        let mut prize_in_pack = false;
        let mut filled = 0i64;

        while filled < per_pack && !(queue.is_empty() && deferred.is_empty()) {
            // Prefer the main queue; deferred prize stickers wait their
            // turn until it drains.
            let from_deferred = queue.is_empty();
            let (sticker_id, is_prize) = if from_deferred {
                deferred.pop_front().unwrap()
            } else {
                queue.pop_front().unwrap()
            };

            if is_prize && prize_in_pack {
                if from_deferred {
                    // The holding queue only ever contains prize stickers,
                    // so nothing left can enter this pack: it stays short.
                    deferred.push_front((sticker_id, is_prize));
                    break;
                }
                deferred.push_back((sticker_id, is_prize));
                continue;
            }

            assignments.push((sticker_id, pack_id.to_string()));
            if is_prize {
                prize_in_pack = true;
            }
            filled += 1;
        }
    }

    // A prize share of one-per-pack or more can leave prize stickers
    // without a seat; they spill into extra single-sticker packs so every
    // sticker ends up assigned.
    let mut created = planned;
    if !deferred.is_empty() {
        let extra_rows: Vec<String> = (1..=deferred.len() as i64)
            .map(|i| format!("({}, {})", edition_id, planned + i))
            .collect();
        store.insert_rows("packs", "(edition_id, ordinal)", &extra_rows, layout.batch_size)?;

        let extra_ids = pack_id_range(store, edition_id, planned + 1, planned + deferred.len() as i64)?;
        for ((sticker_id, _), pack_id) in deferred.into_iter().zip(extra_ids) {
            assignments.push((sticker_id, pack_id.to_string()));
        }
        created += extra_rows.len() as i64;
    }

    store.update_column_by_id("stickers", "pack_id", "BIGINT", &assignments, layout.batch_size)?;

    Ok(created as u64)
}

/// Cap the edition's prize stickers at the boxes' prize seats.
///
/// `seats` is two per full box plus up to two in the terminal box;
/// `demand` is the two every full box must receive. Excess above `seats`
/// is deleted lowest ordinal first (ties by id); the affected packs simply
/// become one sticker short. A population below `demand` aborts the
/// build — the rarity table or circulation is mis-specified. Returns the
/// number of stickers removed.
pub fn trim_prize_stickers(
    store: &Store,
    edition_id: i64,
    marker: u32,
    seats: u64,
    demand: u64,
) -> Result<u64> {
    let have = store.count(
        &format!(
            "SELECT COUNT(*) FROM stickers s \
             JOIN coordinates c ON s.coordinate_id = c.id \
             WHERE s.edition_id = {} AND c.page = {} AND s.pack_id IS NOT NULL",
            edition_id, marker
        ),
        &[],
    )? as u64;

    if have < demand {
        return Err(EngineError::InsufficientPrizeStickers { have, need: demand });
    }

    if have <= seats {
        return Ok(0);
    }

    // Never empty a pack: a short final pack may hold nothing but its
    // prize sticker.
    let excess = have - seats;
    store.execute_batch(&format!(
        "DELETE FROM stickers WHERE id IN ( \
             SELECT s.id FROM stickers s \
             JOIN coordinates c ON s.coordinate_id = c.id \
             WHERE s.edition_id = {} AND c.page = {} \
               AND (SELECT COUNT(*) FROM stickers s2 WHERE s2.pack_id = s.pack_id) > 1 \
             ORDER BY s.ordinal, s.id \
             LIMIT {})",
        edition_id, marker, excess
    ))?;

    let left = store.count(
        &format!(
            "SELECT COUNT(*) FROM stickers s \
             JOIN coordinates c ON s.coordinate_id = c.id \
             WHERE s.edition_id = {} AND c.page = {}",
            edition_id, marker
        ),
        &[],
    )? as u64;

    Ok(have - left)
}

fn pack_id_range(store: &Store, edition_id: i64, from: i64, to: i64) -> Result<Vec<i64>> {
    let rows = store.execute(
        &format!(
            "SELECT id FROM packs \
             WHERE edition_id = {} AND ordinal BETWEEN {} AND {} \
             ORDER BY ordinal",
            edition_id, from, to
        ),
        &[],
    )?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_i64()))
        .collect())
}
