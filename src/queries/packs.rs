//! Pack operations: inbox assignment and the open-pack protocol.
//!
//! Opening a pack hands every contained sticker to the collector and
//! recomputes the duplicate flags: a collectible sticker lands on the
//! board only if the collector does not already hold its coordinate in
//! the same edition. A pack opens exactly once.

use serde::Deserialize;

use crate::error::{EngineError, Result};
use crate::models::{Pack, Sticker};
use crate::sql_builder::SqlBuilder;
use crate::store::Store;

const PACK_COLUMNS: &str = "id, edition_id, box_id, ordinal, is_open, holder_id";

#[derive(Deserialize)]
struct OpenedStickerRow {
    id: i64,
    coordinate_id: i64,
    edition_id: i64,
    absolute_number: i64,
}

/// Query interface for packs.
pub struct PackQuery<'a> {
    store: &'a Store,
}

impl<'a> PackQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Fetch a pack by id.
    pub fn get(&self, pack_id: i64) -> Result<Pack> {
        let packs: Vec<Pack> = self.store.execute_into(
            &format!("SELECT {} FROM packs WHERE id = ?", PACK_COLUMNS),
            &[pack_id.to_string()],
        )?;
        packs
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(format!("Pack {}", pack_id)))
    }

    /// The packs of a box in position order.
    pub fn list_for_box(&self, box_id: i64) -> Result<Vec<Pack>> {
        let (sql, params) = SqlBuilder::new("packs")
            .select(&[PACK_COLUMNS])
            .where_eq("box_id", &box_id.to_string())
            .order_by(&["ordinal ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    /// The stickers inside a pack.
    pub fn stickers(&self, pack_id: i64) -> Result<Vec<Sticker>> {
        let (sql, params) = SqlBuilder::new("stickers")
            .where_eq("pack_id", &pack_id.to_string())
            .order_by(&["id ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    /// Put a sealed pack into a collector's inbox.
    pub fn assign(&self, pack_id: i64, user_id: i64) -> Result<()> {
        let pack = self.get(pack_id)?;
        if pack.is_open {
            return Err(EngineError::AlreadyOpen(pack_id));
        }
        self.store.execute(
            "UPDATE packs SET holder_id = ? WHERE id = ?",
            &[user_id.to_string(), pack_id.to_string()],
        )?;
        Ok(())
    }

    /// Open a pack for its holder.
    ///
    /// Marks the pack open, hands every sticker to the collector, and for
    /// each collectible sticker recomputes `is_repeated` (the collector
    /// already holds that coordinate in this edition) and `on_the_board`
    /// (its negation). Stickers are processed in id order, so the first
    /// copy of a coordinate in the pack lands on the board and later
    /// copies count as repeats. Returns the stickers as updated.
    pub fn open(&self, pack_id: i64, user_id: i64) -> Result<Vec<Sticker>> {
        let pack = self.get(pack_id)?;
        if pack.is_open {
            return Err(EngineError::AlreadyOpen(pack_id));
        }
        if pack.holder_id != Some(user_id) {
            return Err(EngineError::WrongOwner(pack_id));
        }

        self.store.with_transaction(|| {
            self.store
                .execute_batch(&format!("UPDATE packs SET is_open = TRUE WHERE id = {}", pack_id))?;

            let contained: Vec<OpenedStickerRow> = self.store.execute_into(
                &format!(
                    "SELECT s.id, s.coordinate_id, s.edition_id, c.absolute_number \
                     FROM stickers s \
                     JOIN coordinates c ON s.coordinate_id = c.id \
                     WHERE s.pack_id = {} \
                     ORDER BY s.id",
                    pack_id
                ),
                &[],
            )?;

            for sticker in &contained {
                self.store.execute_batch(&format!(
                    "UPDATE stickers SET holder_id = {} WHERE id = {}",
                    user_id, sticker.id
                ))?;

                // The prize sticker never occupies a board slot.
                if sticker.absolute_number == 0 {
                    continue;
                }

                let duplicates = self.store.count(
                    &format!(
                        "SELECT COUNT(*) FROM stickers \
                         WHERE holder_id = {user} AND coordinate_id = {coordinate} \
                           AND edition_id = {edition} AND id != {id}",
                        user = user_id,
                        coordinate = sticker.coordinate_id,
                        edition = sticker.edition_id,
                        id = sticker.id
                    ),
                    &[],
                )?;
                let is_repeated = duplicates > 0;

                self.store.execute_batch(&format!(
                    "UPDATE stickers SET is_repeated = {}, on_the_board = {} WHERE id = {}",
                    is_repeated, !is_repeated, sticker.id
                ))?;
            }

            Ok(())
        })?;

        self.stickers(pack_id)
    }
}
