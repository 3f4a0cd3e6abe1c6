//! Edition generation and distribution engine for a promotional
//! sticker-album game.
//!
//! An operator designs an album template (pages, slots, rarity table) and
//! materializes *editions* of it: complete, statistically correct,
//! shuffled trees of stickers, packs, and boxes, built in one durable
//! transaction against an in-process DuckDB store and certified by a
//! validation pass before they become visible.
//!
//! # Quick start
//!
//! ```no_run
//! use album_engine::{AlbumEngine, LayoutConfig};
//!
//! let engine = AlbumEngine::builder().in_memory().build().unwrap();
//!
//! engine
//!     .promotions()
//!     .create("Launch", "2026-01-01", "2026-12-31", "0.50".parse().unwrap())
//!     .unwrap();
//!
//! let template = engine
//!     .templates()
//!     .create("Dinosaurs", &LayoutConfig::default())
//!     .unwrap();
//!
//! for page in 1..=4 {
//!     engine.prizes().describe_standard(template, page, "Poster").unwrap();
//! }
//! for number in 1..=4 {
//!     engine.prizes().describe_surprise(template, number, "Cap").unwrap();
//! }
//!
//! let edition = engine.editions().create(template, 250).unwrap();
//! let stats = engine.editions().distribution_stats(edition).unwrap();
//! println!("{} boxes, {} packs", stats.total_boxes, stats.total_packs);
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod queries;
pub mod sql_builder;
pub mod store;

pub use cache::StatsCache;
pub use config::LayoutConfig;
pub use engine::validate::{DistributionStats, ValidationReport};
pub use error::{EngineError, Result};
pub use sql_builder::SqlBuilder;
pub use store::Store;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// RNG for one engine operation: seeded when the builder was given a
/// seed (deterministic builds for tests), from entropy otherwise.
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ---------------------------------------------------------------------------
// AlbumEngineBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`AlbumEngine`].
pub struct AlbumEngineBuilder {
    db_path: Option<PathBuf>,
    in_memory: bool,
    rng_seed: Option<u64>,
}

impl Default for AlbumEngineBuilder {
    fn default() -> Self {
        Self {
            db_path: None,
            in_memory: false,
            rng_seed: None,
        }
    }
}

impl AlbumEngineBuilder {
    /// Store the database at a custom path.
    ///
    /// If neither this nor [`in_memory`](Self::in_memory) is set, the
    /// platform default data directory is used.
    pub fn db_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.db_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Keep the database in memory; nothing survives the engine.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    /// Seed every shuffle deterministically. With the same seed, two
    /// builds of the same edition produce identical tables (modulo ids).
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Open the store (creating the schema if needed) and build the engine.
    pub fn build(self) -> Result<AlbumEngine> {
        let store = if self.in_memory {
            Store::open_in_memory()?
        } else {
            let path = self.db_path.unwrap_or_else(config::default_db_path);
            Store::open(path)?
        };
        Ok(AlbumEngine {
            store,
            rng_seed: self.rng_seed,
        })
    }
}

// ---------------------------------------------------------------------------
// AlbumEngine
// ---------------------------------------------------------------------------

/// The main entry point of the engine.
///
/// Owns the [`Store`] and exposes the domain operations as lightweight
/// borrowing query interfaces. Created via [`AlbumEngine::builder()`].
pub struct AlbumEngine {
    store: Store,
    rng_seed: Option<u64>,
}

impl AlbumEngine {
    /// Create a new builder for configuring the engine.
    pub fn builder() -> AlbumEngineBuilder {
        AlbumEngineBuilder::default()
    }

    // -- Query accessors ---------------------------------------------------

    /// Album templates and their coordinate catalogs.
    pub fn templates(&self) -> queries::templates::TemplateQuery<'_> {
        queries::templates::TemplateQuery::new(&self.store, self.rng_seed)
    }

    /// Promotions (the periods during which editions can be created).
    pub fn promotions(&self) -> queries::promotions::PromotionQuery<'_> {
        queries::promotions::PromotionQuery::new(&self.store)
    }

    /// Standard and surprise prizes.
    pub fn prizes(&self) -> queries::prizes::PrizeQuery<'_> {
        queries::prizes::PrizeQuery::new(&self.store, self.rng_seed)
    }

    /// Edition materialization, deletion, validation, and statistics.
    pub fn editions(&self) -> queries::editions::EditionQuery<'_> {
        queries::editions::EditionQuery::new(&self.store, self.rng_seed)
    }

    /// Pack assignment and the open-pack protocol.
    pub fn packs(&self) -> queries::packs::PackQuery<'_> {
        queries::packs::PackQuery::new(&self.store)
    }

    // -- Utility methods ---------------------------------------------------

    /// Execute a raw SQL query against the store.
    ///
    /// Escape-hatch access for queries not covered by the domain
    /// interfaces.
    pub fn sql(
        &self,
        query: &str,
        params: &[String],
    ) -> Result<Vec<HashMap<String, serde_json::Value>>> {
        self.store.execute(query, params)
    }

    /// Return a reference to the underlying [`Store`] for advanced usage.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Consume the engine and release the store.
    pub fn close(self) {
        drop(self);
    }
}

impl fmt::Display for AlbumEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AlbumEngine(seeded={})",
            self.rng_seed.map(|s| s.to_string()).unwrap_or_else(|| "no".into())
        )
    }
}
