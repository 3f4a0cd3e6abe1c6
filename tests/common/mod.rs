//! Shared fixtures for the engine integration tests.
//!
//! Provides seeded in-memory engines plus a fully described collection
//! (promotion, template, prizes) ready for edition creation.

#![allow(dead_code)]

use album_engine::{AlbumEngine, LayoutConfig};
use rust_decimal_macros::dec;

/// Seed used by tests that only need reproducibility, not a specific draw.
pub const SEED: u64 = 7;

pub fn engine() -> AlbumEngine {
    engine_with_seed(SEED)
}

pub fn engine_with_seed(seed: u64) -> AlbumEngine {
    AlbumEngine::builder()
        .in_memory()
        .rng_seed(seed)
        .build()
        .unwrap()
}

/// Start a promotion that is running today.
pub fn start_promotion(engine: &AlbumEngine) -> i64 {
    engine
        .promotions()
        .create("Launch", "2020-01-01", "2099-12-31", dec!(0.50))
        .unwrap()
}

/// Fill in every placeholder prize description of a template.
pub fn describe_prizes(engine: &AlbumEngine, template_id: i64) {
    let layout = engine.templates().layout(template_id).unwrap();
    for page in 1..=layout.pages {
        engine
            .prizes()
            .describe_standard(template_id, page, "Bicycle")
            .unwrap();
    }
    for number in 1..=layout.surprise_prize_count {
        engine
            .prizes()
            .describe_surprise(template_id, number, "Team cap")
            .unwrap();
    }
}

/// Promotion + described template with the default layout; returns the
/// template id.
pub fn setup_collection(engine: &AlbumEngine) -> i64 {
    start_promotion(engine);
    let template_id = engine
        .templates()
        .create("Minecraft", &LayoutConfig::default())
        .unwrap();
    describe_prizes(engine, template_id);
    template_id
}

/// A deliberately small layout for tests that need quick builds: one page
/// of three always-printed slots, three stickers per pack, twenty packs
/// per box. The prize rarity is generous enough to feed two prize packs
/// to every full box at any circulation.
pub fn small_layout() -> LayoutConfig {
    LayoutConfig {
        pages: 1,
        slots_per_page: 3,
        slot_rarities: [
            (1, dec!(1)),
            (2, dec!(1)),
            (3, dec!(1)),
        ]
        .into_iter()
        .collect(),
        page_rarities: Default::default(),
        packs_per_box: 20,
        prize_rarity: dec!(0.2),
        ..LayoutConfig::default()
    }
}

/// Promotion + described template with [`small_layout`].
pub fn setup_small_collection(engine: &AlbumEngine) -> i64 {
    start_promotion(engine);
    let template_id = engine
        .templates()
        .create("Pocket", &small_layout())
        .unwrap();
    describe_prizes(engine, template_id);
    template_id
}

/// Scalar helper over the raw SQL escape hatch.
pub fn scalar(engine: &AlbumEngine, sql: &str) -> i64 {
    engine.sql(sql, &[]).unwrap()[0]
        .values()
        .next()
        .and_then(|v| v.as_i64())
        .unwrap()
}
