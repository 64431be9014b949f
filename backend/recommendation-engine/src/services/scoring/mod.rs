/// Scoring Module
///
/// Computes a relevance score in [0, 1] for one (post, viewer) pair.
///
/// # Paths
/// - **Semantic**: profile/post cosine match blended with engagement and recency
/// - **Tag-based**: tag and category overlap with declared preferences
///
/// The path is chosen once per request from the profile representation.
/// A post whose embedding is missing or unusable degrades to the tag-based
/// path on its own; the request never fails because of it.
pub mod fallback;
pub mod semantic;

pub use fallback::tag_based_score;
pub use semantic::{engagement_score, recency_score, semantic_match};

use crate::models::{Post, ScoreSource, UserPreferences};
use crate::services::embedding::{Embedding, PostEmbedding};
use crate::services::profile::ProfileRepresentation;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Score assigned to posts with no text on the semantic path
pub const EMPTY_TEXT_SCORE: f64 = 0.1;

/// Request-level scoring strategy.
#[derive(Debug, Clone)]
pub enum ScoringPath {
    Semantic(Embedding),
    TagBased,
}

impl ScoringPath {
    pub fn from_profile(profile: ProfileRepresentation) -> Self {
        match profile {
            ProfileRepresentation::Embedding(embedding) => ScoringPath::Semantic(embedding),
            ProfileRepresentation::Text(_) => ScoringPath::TagBased,
        }
    }

    pub fn is_semantic(&self) -> bool {
        matches!(self, ScoringPath::Semantic(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostScore {
    pub value: f64,
    pub source: ScoreSource,
}

impl PostScore {
    fn new(value: f64, source: ScoreSource) -> Self {
        Self {
            value: value.clamp(0.0, 1.0),
            source,
        }
    }
}

/// Pure scorer; `now` is fixed for the whole request.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    now: DateTime<Utc>,
}

impl Scorer {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Score one post.
    ///
    /// `embedding` is the post's entry from the request's batched embedding
    /// call; it is ignored on the tag-based path.
    pub fn score(
        &self,
        post: &Post,
        preferences: &UserPreferences,
        path: &ScoringPath,
        embedding: Option<&PostEmbedding>,
    ) -> PostScore {
        let profile = match path {
            ScoringPath::TagBased => return self.fallback(post, preferences),
            ScoringPath::Semantic(profile) => profile,
        };

        match embedding {
            Some(PostEmbedding::EmptyText) => PostScore::new(EMPTY_TEXT_SCORE, ScoreSource::EmptyText),
            Some(PostEmbedding::Ready(post_embedding)) => {
                match self.semantic(post, post_embedding, profile) {
                    Ok(value) => PostScore::new(value, ScoreSource::Semantic),
                    Err(e) => {
                        warn!(post_id = %post.id, error = %e, "Semantic scoring failed, falling back to tag-based");
                        self.fallback(post, preferences)
                    }
                }
            }
            Some(PostEmbedding::Failed(e)) => {
                warn!(post_id = %post.id, error = %e, "Post embedding unavailable, falling back to tag-based");
                self.fallback(post, preferences)
            }
            None => {
                warn!(post_id = %post.id, "No post embedding supplied, falling back to tag-based");
                self.fallback(post, preferences)
            }
        }
    }

    /// `0.70 * semantic + 0.20 * engagement + 0.10 * recency`
    pub fn semantic(
        &self,
        post: &Post,
        post_embedding: &Embedding,
        profile: &Embedding,
    ) -> Result<f64, crate::services::embedding::EmbeddingError> {
        let semantic = semantic_match(profile, post_embedding)?;
        let engagement = engagement_score(post.like_count, post.comment_count);
        let recency = recency_score(post.created_at, self.now);

        Ok(semantic::SEMANTIC_WEIGHT * semantic
            + semantic::ENGAGEMENT_WEIGHT * engagement
            + semantic::RECENCY_WEIGHT * recency)
    }

    fn fallback(&self, post: &Post, preferences: &UserPreferences) -> PostScore {
        PostScore::new(tag_based_score(post, preferences), ScoreSource::TagBased)
    }
}
