//! Record types mirroring the persistent layout.
//!
//! Rows come out of the store as JSON maps and are hydrated into these
//! structs via serde (`Store::execute_into`).

pub mod edition;
pub mod prize;
pub mod template;

pub use edition::{Box, DeletionCounts, Edition, Pack, Sticker};
pub use prize::{Promotion, StandardPrize, SurprisePrize, PLACEHOLDER_DESCRIPTION};
pub use template::{Coordinate, Template};
