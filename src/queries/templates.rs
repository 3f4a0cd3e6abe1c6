//! Template management: creating an album design materializes its
//! coordinate catalog (the C2 pass) and seeds placeholder prizes, all in
//! one transaction.

use crate::config::LayoutConfig;
use crate::engine::coordinates::build_coordinates;
use crate::error::{EngineError, Result};
use crate::models::{Coordinate, Template};
use crate::seeded_rng;
use crate::sql_builder::SqlBuilder;
use crate::store::Store;

/// Query interface for album templates and their coordinates.
pub struct TemplateQuery<'a> {
    store: &'a Store,
    seed: Option<u64>,
}

impl<'a> TemplateQuery<'a> {
    pub fn new(store: &'a Store, seed: Option<u64>) -> Self {
        Self { store, seed }
    }

    /// Create a template and its coordinate catalog.
    ///
    /// Validates the layout, bulk-creates one coordinate per (page, slot)
    /// plus the prize coordinate, shuffles the within-page display order,
    /// assigns rarities, and seeds one placeholder standard prize per page
    /// and `surprise_prize_count` placeholder surprise prizes. Everything
    /// rolls back on failure.
    pub fn create(&self, name: &str, layout: &LayoutConfig) -> Result<i64> {
        layout.validate()?;
        let layout_json = serde_json::to_string(layout)?;
        let mut rng = seeded_rng(self.seed);

        self.store.with_transaction(|| {
            let rows = self.store.execute(
                "INSERT INTO templates (name, layout) VALUES (?, ?) RETURNING id",
                &[name.to_string(), layout_json.clone()],
            )?;
            let template_id = rows
                .first()
                .and_then(|r| r.get("id"))
                .and_then(|v| v.as_i64())
                .ok_or_else(|| EngineError::NotFound("template id after insert".into()))?;

            build_coordinates(self.store, &mut rng, template_id, layout)?;

            let standard: Vec<String> = (1..=layout.pages)
                .map(|page| format!("({}, {})", template_id, page))
                .collect();
            self.store.insert_rows(
                "standard_prizes",
                "(template_id, page)",
                &standard,
                layout.batch_size,
            )?;

            let surprise: Vec<String> = (1..=layout.surprise_prize_count)
                .map(|number| format!("({}, {})", template_id, number))
                .collect();
            self.store.insert_rows(
                "surprise_prizes",
                "(template_id, number)",
                &surprise,
                layout.batch_size,
            )?;

            Ok(template_id)
        })
    }

    /// Fetch a template with its parsed layout.
    pub fn get(&self, template_id: i64) -> Result<Template> {
        let rows = self.store.execute(
            "SELECT id, name, layout FROM templates WHERE id = ?",
            &[template_id.to_string()],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| EngineError::NotFound(format!("Template {}", template_id)))?;

        let layout_json = row
            .get("layout")
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::NotFound(format!("Template {} layout", template_id)))?;
        let layout: LayoutConfig = serde_json::from_str(layout_json)?;

        Ok(Template {
            id: template_id,
            name: row
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string(),
            layout,
        })
    }

    /// Fetch just the parsed layout of a template.
    pub fn layout(&self, template_id: i64) -> Result<LayoutConfig> {
        Ok(self.get(template_id)?.layout)
    }

    /// The coordinate catalog of a template, in album order (the prize
    /// coordinate first, since its page is the sentinel).
    pub fn coordinates(&self, template_id: i64) -> Result<Vec<Coordinate>> {
        let (sql, params) = SqlBuilder::new("coordinates")
            .where_eq("template_id", &template_id.to_string())
            .order_by(&["absolute_number ASC"])
            .build();
        self.store.execute_into(&sql, &params)
    }

    /// Attach an image reference to a coordinate.
    pub fn set_coordinate_image(&self, coordinate_id: i64, image_ref: &str) -> Result<()> {
        let found = self.store.count(
            "SELECT COUNT(*) FROM coordinates WHERE id = ?",
            &[coordinate_id.to_string()],
        )?;
        if found == 0 {
            return Err(EngineError::NotFound(format!(
                "Coordinate {}",
                coordinate_id
            )));
        }
        self.store.execute(
            "UPDATE coordinates SET image_ref = ? WHERE id = ?",
            &[image_ref.to_string(), coordinate_id.to_string()],
        )?;
        Ok(())
    }
}
