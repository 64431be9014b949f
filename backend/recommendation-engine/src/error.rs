use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommendationError>;

/// Errors surfaced by the crate's outer edges (configuration and corpus
/// loading). Ranking itself never fails: embedding problems degrade to the
/// tag-based path instead of propagating.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Configuration error: {0}")]
    Config(#[from] envy::Error),

    #[error("Corpus I/O error: {0}")]
    CorpusIo(#[from] std::io::Error),

    #[error("Corpus parse error: {0}")]
    CorpusParse(#[from] serde_json::Error),

    #[error("Post not found: {0}")]
    PostNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),
}
