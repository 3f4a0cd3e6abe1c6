use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Description a prize carries until an operator fills it in. An edition
/// cannot be created while any prize of its template still reads this.
pub const PLACEHOLDER_DESCRIPTION: &str = "undefined";

// ---------------------------------------------------------------------------
// Promotion — the period during which a collection can be played
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Promotion {
    pub id: i64,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub pack_cost: Decimal,
}

impl Promotion {
    /// Cost of a full box under this promotion.
    pub fn box_cost(&self, packs_per_box: u32) -> Decimal {
        self.pack_cost * Decimal::from(packs_per_box)
    }
}

// ---------------------------------------------------------------------------
// StandardPrize / SurprisePrize
// ---------------------------------------------------------------------------

/// Per-page prize, claimed when a collector completes that page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardPrize {
    pub id: i64,
    pub template_id: i64,
    pub page: i64,
    pub description: String,
}

/// One of the candidate prizes a prize sticker can reveal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurprisePrize {
    pub id: i64,
    pub template_id: i64,
    pub number: i64,
    pub description: String,
}

impl StandardPrize {
    pub fn is_described(&self) -> bool {
        self.description != PLACEHOLDER_DESCRIPTION
    }
}

impl SurprisePrize {
    pub fn is_described(&self) -> bool {
        self.description != PLACEHOLDER_DESCRIPTION
    }
}
