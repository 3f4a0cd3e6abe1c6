//! Box filler tests: capacities, prize-pack placement, and ordinal
//! permutations, against the nominal 250-copy edition.

mod common;

use std::collections::HashMap;

fn nominal_edition(engine: &album_engine::AlbumEngine) -> i64 {
    let template = common::setup_collection(engine);
    engine.editions().create(template, 250).unwrap()
}

#[test]
fn nominal_edition_fills_thirty_seven_boxes() {
    let engine = common::engine();
    let edition = nominal_edition(&engine);

    assert_eq!(
        common::scalar(
            &engine,
            &format!("SELECT COUNT(*) FROM boxes WHERE edition_id = {}", edition)
        ),
        37
    );

    // 36 full boxes of 100 packs and one terminal box with the remainder.
    let rows = engine
        .sql(
            &format!(
                "SELECT COUNT(*) AS n FROM packs WHERE edition_id = {} \
                 GROUP BY box_id ORDER BY n",
                edition
            ),
            &[],
        )
        .unwrap();
    let sizes: Vec<i64> = rows.iter().map(|r| r["n"].as_i64().unwrap()).collect();
    assert_eq!(sizes.len(), 37);
    assert_eq!(sizes[0], 95);
    assert!(sizes[1..].iter().all(|&n| n == 100));
}

#[test]
fn every_full_box_has_two_well_spaced_prize_packs() {
    let engine = common::engine();
    let edition = nominal_edition(&engine);

    let rows = engine
        .sql(
            &format!(
                "SELECT p.box_id, p.ordinal FROM packs p \
                 WHERE p.edition_id = {} AND EXISTS ( \
                     SELECT 1 FROM stickers s \
                     JOIN coordinates c ON s.coordinate_id = c.id \
                     WHERE s.pack_id = p.id AND c.page = 99)",
                edition
            ),
            &[],
        )
        .unwrap();

    let mut positions: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in &rows {
        positions
            .entry(row["box_id"].as_i64().unwrap())
            .or_default()
            .push(row["ordinal"].as_i64().unwrap());
    }

    let terminal_box = common::scalar(
        &engine,
        &format!(
            "SELECT box_id FROM packs WHERE edition_id = {} \
             GROUP BY box_id HAVING COUNT(*) < 100",
            edition
        ),
    );

    // 74 prize packs over 37 boxes: two per box. The gap rule binds the
    // 36 full boxes; the terminal box takes the leftovers wherever they
    // land.
    assert_eq!(positions.len(), 37);
    for (box_id, ordinals) in &positions {
        assert_eq!(ordinals.len(), 2, "box {}", box_id);
        if *box_id == terminal_box {
            continue;
        }
        let gap = (ordinals[0] - ordinals[1]).abs();
        assert!(gap > 10, "box {} gap {}", box_id, gap);
        assert!(ordinals.iter().all(|&o| (1..=99).contains(&o)));
    }
}

#[test]
fn pack_ordinals_are_positions_within_their_box() {
    let engine = common::engine();
    let edition = nominal_edition(&engine);

    let clashes = common::scalar(
        &engine,
        &format!(
            "SELECT COUNT(*) FROM (SELECT box_id, ordinal FROM packs \
             WHERE edition_id = {} GROUP BY box_id, ordinal \
             HAVING COUNT(*) > 1)",
            edition
        ),
    );
    assert_eq!(clashes, 0);

    // Positions run 1..size in every box.
    let offenders = common::scalar(
        &engine,
        &format!(
            "SELECT COUNT(*) FROM ( \
                 SELECT box_id, MAX(ordinal) AS top, MIN(ordinal) AS bottom, \
                        COUNT(*) AS n \
                 FROM packs WHERE edition_id = {} GROUP BY box_id) \
             WHERE bottom != 1 OR top != n",
            edition
        ),
    );
    assert_eq!(offenders, 0);
}

#[test]
fn box_ordinals_form_a_permutation() {
    let engine = common::engine();
    let edition = nominal_edition(&engine);

    let boxes = engine.editions().boxes(edition).unwrap();
    assert_eq!(boxes.len(), 37);
    assert!(boxes.iter().all(|b| b.edition_id == edition));
    let ordinals: Vec<i64> = boxes.iter().map(|b| b.ordinal).collect();
    assert_eq!(ordinals, (1..=37).collect::<Vec<i64>>());
}

#[test]
fn no_pack_is_left_unboxed() {
    let engine = common::engine();
    let edition = nominal_edition(&engine);

    assert_eq!(
        common::scalar(
            &engine,
            &format!(
                "SELECT COUNT(*) FROM packs WHERE edition_id = {} AND box_id IS NULL",
                edition
            )
        ),
        0
    );
}
