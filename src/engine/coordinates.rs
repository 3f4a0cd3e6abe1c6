//! Coordinate builder: the ordered catalog of sticker positions.
//!
//! Runs once when a template is created. Emits one coordinate per
//! (page, slot) plus the sentinel prize coordinate, shuffles the
//! within-page display order, and assigns rarity factors from the
//! layout's table. Three store round-trips: one bulk insert, one bulk
//! ordinal update, one bulk rarity update.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::store::Store;

/// Build the coordinate catalog for a freshly inserted template.
///
/// Fails with [`crate::error::EngineError::InvalidLayout`] when the rarity
/// table does not cover every slot. Returns the number of coordinates
/// created (collectibles plus the prize coordinate).
pub fn build_coordinates(
    store: &Store,
    rng: &mut StdRng,
    template_id: i64,
    layout: &LayoutConfig,
) -> Result<u64> {
    layout.validate()?;

    let mut rows: Vec<String> = Vec::with_capacity(layout.collectible_count() as usize + 1);
    let mut absolute = 1u32;
    for page in 1..=layout.pages {
        for slot in 1..=layout.slots_per_page {
            // Display ordinal starts as the slot itself; the shuffle below
            // replaces it. Rarity starts as a placeholder zero.
            rows.push(format!(
                "({}, {}, {}, {}, {}, 0)",
                template_id, page, slot, slot, absolute
            ));
            absolute += 1;
        }
    }
    // The prize coordinate: sentinel page/slot, no album position.
    rows.push(format!(
        "({id}, {m}, {m}, 0, 0, {r})",
        id = template_id,
        m = layout.prize_sticker_marker,
        r = layout.prize_rarity
    ));

    let created = store.insert_rows(
        "coordinates",
        "(template_id, page, slot_number, ordinal, absolute_number, rarity_factor)",
        &rows,
        layout.batch_size,
    )?;

    shuffle_display_order(store, rng, template_id, layout)?;
    distribute_rarity(store, template_id, layout)?;

    Ok(created)
}

/// Give each page an independent random display order over its slots.
///
/// The prize coordinate is excluded; its ordinal stays 0.
fn shuffle_display_order(
    store: &Store,
    rng: &mut StdRng,
    template_id: i64,
    layout: &LayoutConfig,
) -> Result<()> {
    let mut updates: Vec<(i64, String)> = Vec::with_capacity(layout.collectible_count() as usize);

    for page in 1..=layout.pages {
        let rows = store.execute(
            &format!(
                "SELECT id FROM coordinates \
                 WHERE template_id = {} AND page = {} \
                 ORDER BY slot_number",
                template_id, page
            ),
            &[],
        )?;

        let mut ordinals: Vec<i64> = (1..=rows.len() as i64).collect();
        ordinals.shuffle(rng);

        for (row, ordinal) in rows.iter().zip(ordinals) {
            if let Some(id) = row.get("id").and_then(|v| v.as_i64()) {
                updates.push((id, ordinal.to_string()));
            }
        }
    }

    store.update_column_by_id("coordinates", "ordinal", "BIGINT", &updates, layout.batch_size)
}

#[derive(Deserialize)]
struct SlotRow {
    id: i64,
    page: i64,
    slot_number: i64,
}

/// Assign the layout's rarity factor to every collectible coordinate.
fn distribute_rarity(store: &Store, template_id: i64, layout: &LayoutConfig) -> Result<()> {
    let slots: Vec<SlotRow> = store.execute_into(
        &format!(
            "SELECT id, page, slot_number FROM coordinates \
             WHERE template_id = {} AND page != {} \
             ORDER BY page, slot_number",
            template_id, layout.prize_sticker_marker
        ),
        &[],
    )?;

    let mut updates: Vec<(i64, String)> = Vec::with_capacity(slots.len());
    for row in slots {
        // validate() above guarantees coverage.
        if let Some(factor) = layout.rarity_for(row.page as u32, row.slot_number as u32) {
            updates.push((row.id, factor.to_string()));
        }
    }

    store.update_column_by_id(
        "coordinates",
        "rarity_factor",
        "DECIMAL(9, 3)",
        &updates,
        layout.batch_size,
    )
}
