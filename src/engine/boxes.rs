//! Box filler: lays the edition's packs into boxes.
//!
//! Every full box receives exactly two prize packs at two random positions
//! more than `min_prize_gap` apart; the rest are standard packs. The
//! terminal box takes whatever remains. Prize stickers are trimmed to two
//! per box before classification so the prize-pack supply matches demand.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::LayoutConfig;
use crate::engine::packs::trim_prize_stickers;
use crate::error::Result;
use crate::store::Store;

/// Create the edition's boxes and place every pack into one.
///
/// Returns the number of boxes filled.
pub fn fill_boxes(
    store: &Store,
    rng: &mut StdRng,
    edition_id: i64,
    layout: &LayoutConfig,
) -> Result<u64> {
    let total_packs = store.count(
        &format!("SELECT COUNT(*) FROM packs WHERE edition_id = {}", edition_id),
        &[],
    )?;
    if total_packs == 0 {
        return Ok(0);
    }

    let per_box = i64::from(layout.packs_per_box);
    let box_count = (total_packs + per_box - 1) / per_box;

    let box_rows: Vec<String> = (1..=box_count)
        .map(|ordinal| format!("({}, {})", edition_id, ordinal))
        .collect();
    store.insert_rows("boxes", "(edition_id, ordinal)", &box_rows, layout.batch_size)?;

    let box_ids: Vec<i64> = store
        .execute(
            &format!(
                "SELECT id FROM boxes WHERE edition_id = {} ORDER BY ordinal",
                edition_id
            ),
            &[],
        )?
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_i64()))
        .collect();

    // Two prize seats per full box; the terminal box seats at most two
    // and demands none.
    let remainder = total_packs % per_box;
    let full_boxes = if remainder == 0 { box_count } else { box_count - 1 };
    let seats = 2 * full_boxes + remainder.min(2);
    trim_prize_stickers(
        store,
        edition_id,
        layout.prize_sticker_marker,
        seats as u64,
        (2 * full_boxes) as u64,
    )?;

    // Classify after trimming: a pack that lost its prize sticker is a
    // standard pack now. Both queues keep the shuffled pack order.
    let mut standard = pack_queue(store, edition_id, layout.prize_sticker_marker, false)?;
    let mut prize = pack_queue(store, edition_id, layout.prize_sticker_marker, true)?;

    let mut placements: Vec<(i64, i64, i64)> = Vec::with_capacity(total_packs as usize);

    for box_id in box_ids {
        let remaining = standard.len() + prize.len();
        if remaining == 0 {
            break;
        }
        let fill = (remaining as i64).min(per_box);
        let (first, second) = prize_positions(rng, layout.packs_per_box, layout.min_prize_gap);

        for position in 1..=fill {
            let pack_id = if (position == first || position == second) && !prize.is_empty() {
                prize.pop_front()
            } else if !standard.is_empty() {
                standard.pop_front()
            } else {
                prize.pop_front()
            };

            match pack_id {
                Some(id) => placements.push((id, box_id, position)),
                None => break,
            }
        }
    }

    store.update_two_columns_by_id("packs", "box_id", "ordinal", &placements, layout.batch_size)?;

    Ok(box_count as u64)
}

/// Draw the two prize positions for one box: distinct values in
/// `[1, packs_per_box - 1]` more than `min_prize_gap` apart.
///
/// Rejection sampling; layout validation guarantees such a pair exists.
fn prize_positions(rng: &mut StdRng, packs_per_box: u32, min_gap: u32) -> (i64, i64) {
    loop {
        let first = rng.gen_range(1..packs_per_box);
        let second = rng.gen_range(1..packs_per_box);
        if first != second && first.abs_diff(second) > min_gap {
            return (i64::from(first), i64::from(second));
        }
    }
}

/// Unboxed packs of the edition in ordinal order, split by whether the
/// pack holds a prize sticker.
fn pack_queue(
    store: &Store,
    edition_id: i64,
    marker: u32,
    prize: bool,
) -> Result<VecDeque<i64>> {
    let operator = if prize { "EXISTS" } else { "NOT EXISTS" };
    let rows = store.execute(
        &format!(
            "SELECT p.id FROM packs p \
             WHERE p.edition_id = {edition} AND p.box_id IS NULL \
               AND {op} ( \
                   SELECT 1 FROM stickers s \
                   JOIN coordinates c ON s.coordinate_id = c.id \
                   WHERE s.pack_id = p.id AND c.page = {marker}) \
             ORDER BY p.ordinal",
            edition = edition_id,
            op = operator,
            marker = marker
        ),
        &[],
    )?;
    Ok(rows
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_i64()))
        .collect())
}
