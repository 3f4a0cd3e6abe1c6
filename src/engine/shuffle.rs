//! Ordinal shuffler.
//!
//! Replaces the `ordinal` column of every row of an entity set with a
//! uniform random permutation of `1..=N`, written back as one batched
//! bulk update rather than a row-at-a-time loop.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::Result;
use crate::store::Store;

/// Shuffle the ordinals of the edition's rows in `table`.
///
/// `table` is one of the engine's entity tables (`stickers`, `packs`,
/// `boxes`), all of which carry an `edition_id` scope column. Returns the
/// number of rows permuted.
pub fn shuffle_ordinals(
    store: &Store,
    rng: &mut StdRng,
    table: &str,
    edition_id: i64,
    batch: usize,
) -> Result<u64> {
    let rows = store.execute(
        &format!(
            "SELECT id FROM {} WHERE edition_id = {} ORDER BY id",
            table, edition_id
        ),
        &[],
    )?;

    let ids: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.get("id").and_then(|v| v.as_i64()))
        .collect();

    let mut ordinals: Vec<i64> = (1..=ids.len() as i64).collect();
    ordinals.shuffle(rng);

    let updates: Vec<(i64, String)> = ids
        .iter()
        .zip(ordinals)
        .map(|(id, ordinal)| (*id, ordinal.to_string()))
        .collect();

    store.update_column_by_id(table, "ordinal", "BIGINT", &updates, batch)?;

    Ok(updates.len() as u64)
}
