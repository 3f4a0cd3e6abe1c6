//! The edition materialization pipeline.
//!
//! Given a template layout and a circulation, the pipeline produces the
//! complete tree of an edition — stickers, packs, boxes — statistically
//! correct, shuffled, and certified by a validation pass:
//!
//! 1. [`stickers::materialize_stickers`] — the per-coordinate census.
//! 2. [`shuffle::shuffle_ordinals`] over stickers.
//! 3. [`packs::pack_stickers`] — fixed-size packs, at most one prize
//!    sticker each.
//! 4. [`shuffle::shuffle_ordinals`] over packs.
//! 5. [`boxes::fill_boxes`] — trims excess prize stickers, then lays packs
//!    into boxes with two well-spaced prize packs per full box.
//! 6. [`shuffle::shuffle_ordinals`] over boxes.
//! 7. [`validate::validate`] — structural certification.
//!
//! The caller wraps the whole run in one store transaction; any error
//! leaves no trace of the edition behind.

pub mod boxes;
pub mod coordinates;
pub mod packs;
pub mod shuffle;
pub mod stickers;
pub mod validate;

use rand::rngs::StdRng;

use crate::config::LayoutConfig;
use crate::error::{EngineError, Result};
use crate::store::Store;

/// Run the full C3..C8 pipeline for an existing edition row.
///
/// Returns the validation report of the finished build. Fails with
/// [`EngineError::ValidationFailed`] if any certification rule does not
/// hold, which aborts the enclosing transaction.
pub fn materialize_edition(
    store: &Store,
    rng: &mut StdRng,
    edition_id: i64,
    layout: &LayoutConfig,
    circulation: u64,
) -> Result<validate::ValidationReport> {
    let batch = layout.batch_size;

    let sticker_total = stickers::materialize_stickers(store, edition_id, layout, circulation)?;
    shuffle::shuffle_ordinals(store, rng, "stickers", edition_id, batch)?;

    let pack_total = packs::pack_stickers(store, edition_id, layout)?;
    shuffle::shuffle_ordinals(store, rng, "packs", edition_id, batch)?;

    let box_total = boxes::fill_boxes(store, rng, edition_id, layout)?;

    // Trimming inside the box filler leaves holes in the sticker
    // sequence; renumber so ordinals stay a contiguous permutation.
    let surviving = store.count(
        &format!("SELECT COUNT(*) FROM stickers WHERE edition_id = {}", edition_id),
        &[],
    )? as u64;
    if surviving < sticker_total {
        shuffle::shuffle_ordinals(store, rng, "stickers", edition_id, batch)?;
    }

    shuffle::shuffle_ordinals(store, rng, "boxes", edition_id, batch)?;

    let report = validate::validate(store, edition_id, layout)?;
    if !report.passed() {
        return Err(EngineError::ValidationFailed {
            edition_id,
            failed: report.failed_rules().join(", "),
        });
    }

    eprintln!(
        "Materialized edition {}: {} stickers, {} packs, {} boxes",
        edition_id, surviving, pack_total, box_total
    );

    Ok(report)
}
