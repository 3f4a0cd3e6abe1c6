use serde::{Deserialize, Serialize};

use rust_decimal::Decimal;

use crate::config::LayoutConfig;

// ---------------------------------------------------------------------------
// Template — immutable design of one album
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: i64,
    pub name: String,
    pub layout: LayoutConfig,
}

// ---------------------------------------------------------------------------
// Coordinate — one (page, slot) position of a template
// ---------------------------------------------------------------------------

/// A sticker position in the album.
///
/// Collectible coordinates carry `absolute_number` 1..pages*slots; the
/// prize coordinate uses the layout's sentinel marker as page and slot,
/// with `absolute_number` and `ordinal` both 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinate {
    pub id: i64,
    pub template_id: i64,
    pub page: i64,
    pub slot_number: i64,
    /// Display order within the page after the within-page shuffle.
    pub ordinal: i64,
    pub absolute_number: i64,
    pub rarity_factor: Decimal,
    pub image_ref: Option<String>,
}

impl Coordinate {
    /// Whether this is the surprise-prize coordinate of its template.
    pub fn is_prize(&self, marker: u32) -> bool {
        self.page == i64::from(marker)
    }
}
