//! Promotion lookups: the minimal lifecycle the edition gates need.
//!
//! A promotion is the period during which a collection can be played.
//! Editions can only be created while one is running.

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::models::Promotion;
use crate::store::Store;

const PROMOTION_COLUMNS: &str = "id, name, \
    CAST(start_date AS VARCHAR) AS start_date, \
    CAST(end_date AS VARCHAR) AS end_date, \
    pack_cost";

/// Query interface for promotions.
pub struct PromotionQuery<'a> {
    store: &'a Store,
}

impl<'a> PromotionQuery<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create a promotion. Dates are `YYYY-MM-DD` strings.
    pub fn create(
        &self,
        name: &str,
        start_date: &str,
        end_date: &str,
        pack_cost: Decimal,
    ) -> Result<i64> {
        if end_date < start_date {
            return Err(EngineError::InvalidArgument(
                "promotion ends before it starts".into(),
            ));
        }
        let rows = self.store.execute(
            "INSERT INTO promotions (name, start_date, end_date, pack_cost) \
             VALUES (?, CAST(? AS DATE), CAST(? AS DATE), CAST(? AS DECIMAL(6, 2))) \
             RETURNING id",
            &[
                name.to_string(),
                start_date.to_string(),
                end_date.to_string(),
                pack_cost.to_string(),
            ],
        )?;
        rows.first()
            .and_then(|r| r.get("id"))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| EngineError::NotFound("promotion id after insert".into()))
    }

    /// The promotion currently running, if any: the latest-ending
    /// promotion whose end date has not passed.
    pub fn current(&self) -> Result<Option<Promotion>> {
        let promotions: Vec<Promotion> = self.store.execute_into(
            &format!(
                "SELECT {} FROM promotions \
                 WHERE end_date >= current_date \
                 ORDER BY end_date DESC LIMIT 1",
                PROMOTION_COLUMNS
            ),
            &[],
        )?;
        Ok(promotions.into_iter().next())
    }

    /// Fetch a promotion by id.
    pub fn get(&self, promotion_id: i64) -> Result<Promotion> {
        let promotions: Vec<Promotion> = self.store.execute_into(
            &format!(
                "SELECT {} FROM promotions WHERE id = ?",
                PROMOTION_COLUMNS
            ),
            &[promotion_id.to_string()],
        )?;
        promotions
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(format!("Promotion {}", promotion_id)))
    }
}
