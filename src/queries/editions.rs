//! Edition lifecycle: creation (the full materialization pipeline inside
//! one transaction), cascade deletion, re-validation, and the cached
//! distribution statistics.

use crate::config::LayoutConfig;
use crate::engine::validate::{DistributionStats, ValidationReport};
use crate::engine::{materialize_edition, validate};
use crate::error::{EngineError, Result};
use crate::models::{Box, DeletionCounts, Edition};
use crate::queries::prizes::PrizeQuery;
use crate::queries::promotions::PromotionQuery;
use crate::queries::templates::TemplateQuery;
use crate::seeded_rng;
use crate::sql_builder::SqlBuilder;
use crate::store::Store;

const EDITION_COLUMNS: &str = "id, template_id, promotion_id, circulation, \
    CAST(created_at AS VARCHAR) AS created_at";

/// Query interface for editions.
pub struct EditionQuery<'a> {
    store: &'a Store,
    seed: Option<u64>,
}

impl<'a> EditionQuery<'a> {
    pub fn new(store: &'a Store, seed: Option<u64>) -> Self {
        Self { store, seed }
    }

    /// Materialize a full edition of a template.
    ///
    /// Gates first: a promotion must be running, the template must not
    /// already have an edition in it, and every prize description must be
    /// filled in. The C3..C8 pipeline then runs inside one transaction;
    /// any failure rolls the whole edition back. Returns the edition id.
    pub fn create(&self, template_id: i64, circulation: u64) -> Result<i64> {
        if circulation == 0 {
            return Err(EngineError::InvalidArgument(
                "circulation must be positive".into(),
            ));
        }

        let template = TemplateQuery::new(self.store, self.seed).get(template_id)?;
        template.layout.validate()?;

        let promotion = PromotionQuery::new(self.store)
            .current()?
            .ok_or(EngineError::NoActivePromotion)?;

        let duplicates = self.store.count(
            "SELECT COUNT(*) FROM editions WHERE template_id = ? AND promotion_id = ?",
            &[template_id.to_string(), promotion.id.to_string()],
        )?;
        if duplicates > 0 {
            return Err(EngineError::DuplicateEdition {
                template_id,
                promotion_id: promotion.id,
            });
        }

        let undescribed = PrizeQuery::new(self.store, self.seed).undescribed_count(template_id)?;
        if undescribed > 0 {
            return Err(EngineError::PrizesNotDescribed(template_id));
        }

        let mut rng = seeded_rng(self.seed);
        let layout = &template.layout;

        let (edition_id, report) = self.store.with_transaction(|| {
            let rows = self.store.execute(
                &format!(
                    "INSERT INTO editions (template_id, promotion_id, circulation) \
                     VALUES ({}, {}, {}) RETURNING id",
                    template_id, promotion.id, circulation
                ),
                &[],
            )?;
            let edition_id = rows
                .first()
                .and_then(|r| r.get("id"))
                .and_then(|v| v.as_i64())
                .ok_or_else(|| EngineError::NotFound("edition id after insert".into()))?;

            let report =
                materialize_edition(self.store, &mut rng, edition_id, layout, circulation)?;
            Ok((edition_id, report))
        })?;

        self.store.stats.borrow_mut().put(edition_id, report.stats);

        Ok(edition_id)
    }

    /// Delete an edition and everything it owns, children first.
    ///
    /// Returns how many boxes, packs, and stickers were removed.
    pub fn delete(&self, edition_id: i64) -> Result<DeletionCounts> {
        self.ensure_exists(edition_id)?;

        let counts = DeletionCounts {
            boxes: self.table_count("boxes", edition_id)?,
            packs: self.table_count("packs", edition_id)?,
            stickers: self.table_count("stickers", edition_id)?,
        };

        self.store.with_transaction(|| {
            self.store.execute_batch(&format!(
                "DELETE FROM sticker_prizes WHERE sticker_id IN \
                     (SELECT id FROM stickers WHERE edition_id = {e}); \
                 DELETE FROM stickers WHERE edition_id = {e}; \
                 DELETE FROM packs WHERE edition_id = {e}; \
                 DELETE FROM boxes WHERE edition_id = {e}; \
                 DELETE FROM editions WHERE id = {e}",
                e = edition_id
            ))
        })?;

        self.store.stats.borrow_mut().invalidate(edition_id);

        Ok(counts)
    }

    /// Re-run the validator against a stored edition and refresh the
    /// statistics cache.
    pub fn validate(&self, edition_id: i64) -> Result<(bool, ValidationReport)> {
        let layout = self.layout_for(edition_id)?;
        let report = validate::validate(self.store, edition_id, &layout)?;
        self.store
            .stats
            .borrow_mut()
            .put(edition_id, report.stats.clone());
        Ok((report.passed(), report))
    }

    /// Aggregate statistics of an edition, served from the TTL cache when
    /// fresh.
    pub fn distribution_stats(&self, edition_id: i64) -> Result<DistributionStats> {
        if let Some(stats) = self.store.stats.borrow().get(edition_id) {
            return Ok(stats);
        }

        let layout = self.layout_for(edition_id)?;
        let stats = validate::measure(self.store, edition_id, layout.prize_sticker_marker)?;
        self.store
            .stats
            .borrow_mut()
            .put(edition_id, stats.clone());
        Ok(stats)
    }

    /// Fetch an edition by id.
    pub fn get(&self, edition_id: i64) -> Result<Edition> {
        let editions: Vec<Edition> = self.store.execute_into(
            &format!("SELECT {} FROM editions WHERE id = ?", EDITION_COLUMNS),
            &[edition_id.to_string()],
        )?;
        editions
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NotFound(format!("Edition {}", edition_id)))
    }

    /// The boxes of an edition in ordinal order.
    pub fn boxes(&self, edition_id: i64) -> Result<Vec<Box>> {
        let (sql, params) = SqlBuilder::new("boxes")
            .where_eq("edition_id", &edition_id.to_string())
            .order_by(&["ordinal ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    /// The editions of the currently running promotion, oldest first.
    pub fn list_current(&self) -> Result<Vec<Edition>> {
        let promotion = match PromotionQuery::new(self.store).current()? {
            Some(p) => p,
            None => return Ok(Vec::new()),
        };
        let (sql, params) = SqlBuilder::new("editions")
            .select(&[EDITION_COLUMNS])
            .where_eq("promotion_id", &promotion.id.to_string())
            .order_by(&["id ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    fn ensure_exists(&self, edition_id: i64) -> Result<()> {
        let found = self.store.count(
            "SELECT COUNT(*) FROM editions WHERE id = ?",
            &[edition_id.to_string()],
        )?;
        if found == 0 {
            return Err(EngineError::NotFound(format!("Edition {}", edition_id)));
        }
        Ok(())
    }

    fn table_count(&self, table: &str, edition_id: i64) -> Result<u64> {
        Ok(self.store.count(
            &format!("SELECT COUNT(*) FROM {} WHERE edition_id = {}", table, edition_id),
            &[],
        )? as u64)
    }

    fn layout_for(&self, edition_id: i64) -> Result<LayoutConfig> {
        let rows = self.store.execute(
            "SELECT t.layout FROM templates t \
             JOIN editions e ON e.template_id = t.id \
             WHERE e.id = ?",
            &[edition_id.to_string()],
        )?;
        let layout_json = rows
            .first()
            .and_then(|r| r.get("layout"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::NotFound(format!("Edition {}", edition_id)))?;
        Ok(serde_json::from_str(layout_json)?)
    }
}
