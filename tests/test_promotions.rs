//! Promotion lookup tests.

mod common;

use album_engine::EngineError;
use rust_decimal_macros::dec;

#[test]
fn current_is_none_without_promotions() {
    let engine = common::engine();
    assert!(engine.promotions().current().unwrap().is_none());
}

#[test]
fn current_picks_the_latest_running_promotion() {
    let engine = common::engine();
    engine
        .promotions()
        .create("Spring", "2020-01-01", "2098-06-30", dec!(0.25))
        .unwrap();
    let autumn = engine
        .promotions()
        .create("Autumn", "2020-01-01", "2099-12-31", dec!(0.40))
        .unwrap();

    let current = engine.promotions().current().unwrap().unwrap();
    assert_eq!(current.id, autumn);
    assert_eq!(current.name, "Autumn");
    assert_eq!(current.pack_cost, dec!(0.40));
    assert_eq!(current.end_date, "2099-12-31");
}

#[test]
fn finished_promotions_are_not_current() {
    let engine = common::engine();
    engine
        .promotions()
        .create("Bygone", "2019-01-01", "2019-12-31", dec!(0.25))
        .unwrap();
    assert!(engine.promotions().current().unwrap().is_none());
}

#[test]
fn box_cost_scales_the_pack_cost() {
    let engine = common::engine();
    let id = engine
        .promotions()
        .create("Launch", "2020-01-01", "2099-12-31", dec!(0.50))
        .unwrap();

    let promotion = engine.promotions().get(id).unwrap();
    assert_eq!(promotion.box_cost(100), dec!(50.00));
}

#[test]
fn backwards_dates_are_rejected() {
    let engine = common::engine();
    assert!(matches!(
        engine
            .promotions()
            .create("Twisted", "2030-01-01", "2029-01-01", dec!(0.25)),
        Err(EngineError::InvalidArgument(_))
    ));
}

#[test]
fn unknown_promotion_is_not_found() {
    let engine = common::engine();
    assert!(matches!(
        engine.promotions().get(12),
        Err(EngineError::NotFound(_))
    ));
}
