#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("No promotion is currently running")]
    NoActivePromotion,

    #[error("Template {template_id} already has an edition in promotion {promotion_id}; consider a re-edition")]
    DuplicateEdition { template_id: i64, promotion_id: i64 },

    #[error("Template {0} still has placeholder prize descriptions")]
    PrizesNotDescribed(i64),

    #[error("Edition has {have} prize stickers but needs at least {need}; raise the circulation or the prize rarity")]
    InsufficientPrizeStickers { have: u64, need: u64 },

    #[error("Edition {edition_id} failed validation: {failed}")]
    ValidationFailed { edition_id: i64, failed: String },

    #[error("Pack {0} is held by another collector")]
    WrongOwner(i64),

    #[error("Pack {0} has already been opened")]
    AlreadyOpen(i64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
