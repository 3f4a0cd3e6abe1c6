//! Sticker census tests: the per-coordinate count rule over whole builds.

mod common;

use album_engine::LayoutConfig;
use rust_decimal_macros::dec;

/// Stickers of an edition grouped by rarity factor.
fn census_by_rarity(engine: &album_engine::AlbumEngine, edition_id: i64, rarity: &str) -> i64 {
    common::scalar(
        engine,
        &format!(
            "SELECT COUNT(*) FROM stickers s \
             JOIN coordinates c ON s.coordinate_id = c.id \
             WHERE s.edition_id = {} AND c.rarity_factor = {} AND c.page != 99",
            edition_id, rarity
        ),
    )
}

// ---------------------------------------------------------------------------
// nominal edition (circulation 250)
// ---------------------------------------------------------------------------

#[test]
fn nominal_edition_census_matches_the_rarity_table() {
    let engine = common::engine();
    let template = common::setup_collection(&engine);
    let edition = engine.editions().create(template, 250).unwrap();

    // Shared tiers: 8 coordinates at factor 3, 8 at 2, 4 at 1.
    assert_eq!(census_by_rarity(&engine, edition, "3"), 6000);
    assert_eq!(census_by_rarity(&engine, edition, "2"), 4000);
    assert_eq!(census_by_rarity(&engine, edition, "1"), 1000);

    // Scarce per-page tiers floor to almost nothing.
    assert_eq!(census_by_rarity(&engine, edition, "0.020"), 5);
    assert_eq!(census_by_rarity(&engine, edition, "0.010"), 2);
    assert_eq!(census_by_rarity(&engine, edition, "0.006"), 1);
    assert_eq!(census_by_rarity(&engine, edition, "0.004"), 1);

    // Prize stickers: ceil(0.301 * 250) = 76 printed, trimmed to 2 * 37.
    let prize = common::scalar(
        &engine,
        &format!(
            "SELECT COUNT(*) FROM stickers s \
             JOIN coordinates c ON s.coordinate_id = c.id \
             WHERE s.edition_id = {} AND c.page = 99",
            edition
        ),
    );
    assert_eq!(prize, 74);

    let total = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM stickers WHERE edition_id = {}", edition),
    );
    assert_eq!(total, 11083);
}

#[test]
fn sticker_ordinals_form_a_contiguous_permutation() {
    let engine = common::engine();
    let template = common::setup_small_collection(&engine);
    let edition = engine.editions().create(template, 50).unwrap();

    let total = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM stickers WHERE edition_id = {}", edition),
    );
    let distinct = common::scalar(
        &engine,
        &format!(
            "SELECT COUNT(DISTINCT ordinal) FROM stickers WHERE edition_id = {}",
            edition
        ),
    );
    let span = common::scalar(
        &engine,
        &format!(
            "SELECT MAX(ordinal) - MIN(ordinal) + 1 FROM stickers WHERE edition_id = {}",
            edition
        ),
    );
    assert_eq!(distinct, total);
    assert_eq!(span, total);
    assert_eq!(
        common::scalar(
            &engine,
            &format!("SELECT MIN(ordinal) FROM stickers WHERE edition_id = {}", edition)
        ),
        1
    );
}

// ---------------------------------------------------------------------------
// minimal edition (circulation 1)
// ---------------------------------------------------------------------------

#[test]
fn minimal_edition_floors_scarce_slots_to_zero() {
    let engine = common::engine();
    let template = common::setup_collection(&engine);
    let edition = engine.editions().create(template, 1).unwrap();

    // Rarities below one print nothing; the prize coordinate ceils to one.
    assert_eq!(census_by_rarity(&engine, edition, "0.020"), 0);
    assert_eq!(census_by_rarity(&engine, edition, "0.010"), 0);
    assert_eq!(census_by_rarity(&engine, edition, "0.006"), 0);
    assert_eq!(census_by_rarity(&engine, edition, "0.004"), 0);

    let total = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM stickers WHERE edition_id = {}", edition),
    );
    // 8 * 3 + 8 * 2 + 4 * 1 collectibles plus the single prize sticker.
    assert_eq!(total, 45);

    let packs = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM packs WHERE edition_id = {}", edition),
    );
    assert_eq!(packs, 15);

    let boxes = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM boxes WHERE edition_id = {}", edition),
    );
    assert_eq!(boxes, 1);

    let (passed, _report) = engine.editions().validate(edition).unwrap();
    assert!(passed);
}

// ---------------------------------------------------------------------------
// degenerate layout (one page, one slot)
// ---------------------------------------------------------------------------

#[test]
fn single_slot_template_still_builds() {
    let engine = common::engine();
    common::start_promotion(&engine);

    let layout = LayoutConfig {
        pages: 1,
        slots_per_page: 1,
        stickers_per_pack: 1,
        slot_rarities: [(1, dec!(2))].into_iter().collect(),
        page_rarities: Default::default(),
        prize_rarity: dec!(0.5),
        ..LayoutConfig::default()
    };
    let template = engine.templates().create("Mono", &layout).unwrap();
    common::describe_prizes(&engine, template);

    let edition = engine.editions().create(template, 5).unwrap();

    // 10 collectibles + ceil(2.5) = 3 prize stickers, one sticker per pack.
    let total = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM stickers WHERE edition_id = {}", edition),
    );
    assert_eq!(total, 13);
    let packs = common::scalar(
        &engine,
        &format!("SELECT COUNT(*) FROM packs WHERE edition_id = {}", edition),
    );
    assert_eq!(packs, 13);
    let biggest = common::scalar(
        &engine,
        &format!(
            "SELECT MAX(n) FROM (SELECT COUNT(*) AS n FROM stickers \
             WHERE edition_id = {} GROUP BY pack_id)",
            edition
        ),
    );
    assert_eq!(biggest, 1);

    let (passed, _report) = engine.editions().validate(edition).unwrap();
    assert!(passed);
}
