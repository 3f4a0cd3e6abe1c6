use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Edition — one materialised printing run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edition {
    pub id: i64,
    pub template_id: i64,
    pub promotion_id: i64,
    pub circulation: u64,
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Box / Pack / Sticker — the ownership tree below an edition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Box {
    pub id: i64,
    pub edition_id: i64,
    /// Position of the box within the edition, 1..N after the shuffle.
    pub ordinal: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pack {
    pub id: i64,
    pub edition_id: i64,
    /// Null while the build is in flight; set by the box filler.
    pub box_id: Option<i64>,
    /// Position of the pack within its box, 1..packs_per_box.
    pub ordinal: i64,
    pub is_open: bool,
    /// Collector holding this pack in their inbox, once sold.
    pub holder_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sticker {
    pub id: i64,
    pub edition_id: i64,
    /// Null while the build is in flight; immutable once assigned.
    pub pack_id: Option<i64>,
    pub coordinate_id: i64,
    /// Sequence number within the edition, 1..S after the shuffle.
    pub ordinal: i64,
    pub holder_id: Option<i64>,
    pub on_the_board: bool,
    pub is_repeated: bool,
    pub is_rescued: bool,
}

// ---------------------------------------------------------------------------
// DeletionCounts — what a cascade delete removed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionCounts {
    pub boxes: u64,
    pub packs: u64,
    pub stickers: u64,
}
