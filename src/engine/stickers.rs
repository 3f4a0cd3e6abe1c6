//! Sticker materializer: the per-coordinate census of an edition.
//!
//! For every coordinate of the edition's template, prints
//! `rarity_factor x circulation` copies — floored for collectibles so
//! scarce slots stay scarce, ceiled for the prize coordinate because the
//! trimmer removes any excess later. Rows are flushed in batches; no
//! sticker is in a pack yet.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::{sticker_count, LayoutConfig};
use crate::error::Result;
use crate::store::Store;

#[derive(Deserialize)]
struct CoordinateRow {
    id: i64,
    page: i64,
    rarity_factor: Decimal,
}

/// Create every sticker of the edition, with sequential ordinals.
///
/// Returns the number of stickers written. The caller shuffles the
/// ordinals afterwards; ordinals are never reused across editions because
/// each edition numbers its own range.
pub fn materialize_stickers(
    store: &Store,
    edition_id: i64,
    layout: &LayoutConfig,
    circulation: u64,
) -> Result<u64> {
    let coordinates: Vec<CoordinateRow> = store.execute_into(
        &format!(
            "SELECT c.id, c.page, c.rarity_factor \
             FROM coordinates c \
             JOIN editions e ON c.template_id = e.template_id \
             WHERE e.id = {} \
             ORDER BY c.page, c.slot_number",
            edition_id
        ),
        &[],
    )?;

    let marker = i64::from(layout.prize_sticker_marker);
    let mut rows: Vec<String> = Vec::with_capacity(layout.batch_size);
    let mut ordinal = 1u64;
    let mut total = 0u64;

    for coordinate in &coordinates {
        let is_prize = coordinate.page == marker;
        let copies = sticker_count(coordinate.rarity_factor, circulation, is_prize);

        for _ in 0..copies {
            rows.push(format!("({}, {}, {})", edition_id, coordinate.id, ordinal));
            ordinal += 1;

            if rows.len() >= layout.batch_size {
                store.insert_rows(
                    "stickers",
                    "(edition_id, coordinate_id, ordinal)",
                    &rows,
                    layout.batch_size,
                )?;
                rows.clear();
            }
        }
        total += copies;
    }

    if !rows.is_empty() {
        store.insert_rows(
            "stickers",
            "(edition_id, coordinate_id, ordinal)",
            &rows,
            layout.batch_size,
        )?;
    }

    Ok(total)
}
