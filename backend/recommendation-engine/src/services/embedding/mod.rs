// ============================================
// Embedding Provider
// ============================================
//
// Text -> vector collaborator used by the semantic scoring path.
//
// The provider is injected once at startup as an explicit capability:
//   - Available(provider): profile and posts are embedded per request
//   - Unavailable: every request goes through tag-based scoring
//
// All candidate posts of a request are embedded with a single provider
// round trip (see `embed_posts`). Failures are recorded per post and
// never abort the request.

mod http;

pub use http::HttpEmbeddingProvider;

use crate::models::Post;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmbeddingError {
    #[error("Embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Invalid embedding vector: {0}")]
    InvalidVector(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Maps texts to fixed-length vectors.
///
/// Implementations must return exactly one vector per input text, in input
/// order. Callers never send empty strings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts in one round trip
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Whether an embedding provider is wired in for this process.
#[derive(Clone, Default)]
pub enum EmbeddingCapability {
    Available(Arc<dyn EmbeddingProvider>),
    #[default]
    Unavailable,
}

impl EmbeddingCapability {
    pub fn available(provider: Arc<dyn EmbeddingProvider>) -> Self {
        EmbeddingCapability::Available(provider)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, EmbeddingCapability::Available(_))
    }

    pub fn provider(&self) -> Option<&dyn EmbeddingProvider> {
        match self {
            EmbeddingCapability::Available(provider) => Some(provider.as_ref()),
            EmbeddingCapability::Unavailable => None,
        }
    }
}

impl fmt::Debug for EmbeddingCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingCapability::Available(provider) => {
                write!(f, "Available({})", provider.name())
            }
            EmbeddingCapability::Unavailable => write!(f, "Unavailable"),
        }
    }
}

/// Validated embedding vector. Never introspected beyond similarity.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Rejects empty vectors and vectors containing NaN or infinity.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(EmbeddingError::InvalidVector("empty vector".to_string()));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::InvalidVector(
                "non-finite component".to_string(),
            ));
        }
        Ok(Self(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity in [-1, 1].
    pub fn cosine(&self, other: &Embedding) -> Result<f64> {
        crate::utils::cosine_similarity(&self.0, &other.0).ok_or(
            EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            },
        )
    }
}

/// Per-post outcome of the batched embedding call.
#[derive(Debug, Clone, PartialEq)]
pub enum PostEmbedding {
    /// Post has no text; it was not sent to the provider
    EmptyText,
    Ready(Embedding),
    Failed(EmbeddingError),
}

/// Embed a single text (the viewer profile, or a reference post).
pub async fn embed_one(provider: &dyn EmbeddingProvider, text: &str) -> Result<Embedding> {
    let vectors = provider.embed(&[text.to_string()]).await?;
    let vector = vectors.into_iter().next().ok_or_else(|| {
        EmbeddingError::MalformedResponse("empty embedding result".to_string())
    })?;
    Embedding::new(vector)
}

/// Embed every post's text with one provider call.
///
/// The returned vector is aligned with `posts`. A failed batch marks every
/// non-empty post as failed; a bad vector only marks its own post.
pub async fn embed_posts(provider: &dyn EmbeddingProvider, posts: &[&Post]) -> Vec<PostEmbedding> {
    let texts: Vec<String> = posts.iter().map(|post| post.embedding_text()).collect();
    let batch: Vec<String> = texts.iter().filter(|t| !t.is_empty()).cloned().collect();

    if batch.is_empty() {
        return vec![PostEmbedding::EmptyText; posts.len()];
    }

    debug!(
        provider = provider.name(),
        batch_size = batch.len(),
        "Embedding candidate posts"
    );

    let vectors = match provider.embed(&batch).await {
        Ok(vectors) if vectors.len() == batch.len() => vectors,
        Ok(vectors) => {
            let err = EmbeddingError::MalformedResponse(format!(
                "expected {} vectors, got {}",
                batch.len(),
                vectors.len()
            ));
            warn!(error = %err, "Batch embedding unusable, degrading posts to tag-based scoring");
            return fail_non_empty(&texts, err);
        }
        Err(err) => {
            warn!(error = %err, "Batch embedding failed, degrading posts to tag-based scoring");
            return fail_non_empty(&texts, err);
        }
    };

    let mut vectors = vectors.into_iter();
    texts
        .iter()
        .map(|text| {
            if text.is_empty() {
                return PostEmbedding::EmptyText;
            }
            match vectors.next().map(Embedding::new) {
                Some(Ok(embedding)) => PostEmbedding::Ready(embedding),
                Some(Err(err)) => PostEmbedding::Failed(err),
                None => PostEmbedding::Failed(EmbeddingError::MalformedResponse(
                    "missing vector".to_string(),
                )),
            }
        })
        .collect()
}

fn fail_non_empty(texts: &[String], err: EmbeddingError) -> Vec<PostEmbedding> {
    texts
        .iter()
        .map(|text| {
            if text.is_empty() {
                PostEmbedding::EmptyText
            } else {
                PostEmbedding::Failed(err.clone())
            }
        })
        .collect()
}
