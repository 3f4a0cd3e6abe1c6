//! Prize management: operators fill in the placeholder descriptions a
//! template is born with, and prize stickers discover a random surprise
//! prize once opened.

use rand::seq::SliceRandom;

use crate::error::{EngineError, Result};
use crate::models::{StandardPrize, SurprisePrize, PLACEHOLDER_DESCRIPTION};
use crate::seeded_rng;
use crate::sql_builder::SqlBuilder;
use crate::store::Store;

/// Query interface for standard and surprise prizes.
pub struct PrizeQuery<'a> {
    store: &'a Store,
    seed: Option<u64>,
}

impl<'a> PrizeQuery<'a> {
    pub fn new(store: &'a Store, seed: Option<u64>) -> Self {
        Self { store, seed }
    }

    /// Standard (per-page) prizes of a template.
    pub fn standard_for(&self, template_id: i64) -> Result<Vec<StandardPrize>> {
        let (sql, params) = SqlBuilder::new("standard_prizes")
            .where_eq("template_id", &template_id.to_string())
            .order_by(&["page ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    /// Surprise (per-sticker) prizes of a template.
    pub fn surprise_for(&self, template_id: i64) -> Result<Vec<SurprisePrize>> {
        let (sql, params) = SqlBuilder::new("surprise_prizes")
            .where_eq("template_id", &template_id.to_string())
            .order_by(&["number ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    /// Describe the standard prize of one page.
    pub fn describe_standard(&self, template_id: i64, page: u32, description: &str) -> Result<()> {
        let found = self.store.count(
            "SELECT COUNT(*) FROM standard_prizes WHERE template_id = ? AND page = ?",
            &[template_id.to_string(), page.to_string()],
        )?;
        if found == 0 {
            return Err(EngineError::NotFound(format!(
                "Standard prize for template {} page {}",
                template_id, page
            )));
        }
        self.store.execute(
            "UPDATE standard_prizes SET description = ? WHERE template_id = ? AND page = ?",
            &[
                description.to_string(),
                template_id.to_string(),
                page.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Describe one of the surprise prizes.
    pub fn describe_surprise(
        &self,
        template_id: i64,
        number: u32,
        description: &str,
    ) -> Result<()> {
        let found = self.store.count(
            "SELECT COUNT(*) FROM surprise_prizes WHERE template_id = ? AND number = ?",
            &[template_id.to_string(), number.to_string()],
        )?;
        if found == 0 {
            return Err(EngineError::NotFound(format!(
                "Surprise prize for template {} number {}",
                template_id, number
            )));
        }
        self.store.execute(
            "UPDATE surprise_prizes SET description = ? WHERE template_id = ? AND number = ?",
            &[
                description.to_string(),
                template_id.to_string(),
                number.to_string(),
            ],
        )?;
        Ok(())
    }

    /// How many prizes of the template still carry the placeholder text.
    pub fn undescribed_count(&self, template_id: i64) -> Result<i64> {
        self.store.count(
            "SELECT \
                 (SELECT COUNT(*) FROM standard_prizes \
                  WHERE template_id = ? AND description = ?) + \
                 (SELECT COUNT(*) FROM surprise_prizes \
                  WHERE template_id = ? AND description = ?)",
            &[
                template_id.to_string(),
                PLACEHOLDER_DESCRIPTION.to_string(),
                template_id.to_string(),
                PLACEHOLDER_DESCRIPTION.to_string(),
            ],
        )
    }

    /// Reveal a surprise prize for a prize sticker, chosen uniformly among
    /// the template's surprise prizes. Each prize sticker discovers at
    /// most once.
    pub fn discover(&self, sticker_id: i64) -> Result<SurprisePrize> {
        let rows = self.store.execute(
            "SELECT c.absolute_number, e.template_id \
             FROM stickers s \
             JOIN coordinates c ON s.coordinate_id = c.id \
             JOIN editions e ON s.edition_id = e.id \
             WHERE s.id = ?",
            &[sticker_id.to_string()],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| EngineError::NotFound(format!("Sticker {}", sticker_id)))?;

        let absolute = row
            .get("absolute_number")
            .and_then(|v| v.as_i64())
            .unwrap_or(-1);
        if absolute != 0 {
            return Err(EngineError::InvalidArgument(
                "only prize stickers can discover a surprise prize".into(),
            ));
        }

        let already = self.store.count(
            "SELECT COUNT(*) FROM sticker_prizes WHERE sticker_id = ?",
            &[sticker_id.to_string()],
        )?;
        if already > 0 {
            return Err(EngineError::InvalidArgument(format!(
                "sticker {} already discovered a prize",
                sticker_id
            )));
        }

        let template_id = row
            .get("template_id")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| EngineError::NotFound(format!("Template of sticker {}", sticker_id)))?;

        let options = self.surprise_for(template_id)?;
        let mut rng = seeded_rng(self.seed);
        let prize = options
            .choose(&mut rng)
            .ok_or_else(|| EngineError::NotFound(format!("Surprise prizes of template {}", template_id)))?
            .clone();

        self.store.execute(
            "INSERT INTO sticker_prizes (sticker_id, prize_id) VALUES (?, ?)",
            &[sticker_id.to_string(), prize.id.to_string()],
        )?;

        Ok(prize)
    }
}
