/// Semantic scoring components
///
/// Final blend: `0.70 * semantic + 0.20 * engagement + 0.10 * recency`.
use crate::services::embedding::{Embedding, EmbeddingError};
use crate::utils::remap_similarity;
use chrono::{DateTime, Utc};

pub const SEMANTIC_WEIGHT: f64 = 0.70;
pub const ENGAGEMENT_WEIGHT: f64 = 0.20;
pub const RECENCY_WEIGHT: f64 = 0.10;

/// Concave power applied to the remapped similarity; lifts strong matches
const SIMILARITY_BOOST_EXPONENT: f64 = 0.7;

pub const LIKE_WEIGHT: f64 = 0.7;
pub const COMMENT_WEIGHT: f64 = 0.3;

/// Weighted engagement points at which the engagement signal saturates
const ENGAGEMENT_SATURATION: f64 = 100.0;

/// Linear recency decay window
const RECENCY_WINDOW_DAYS: f64 = 30.0;

/// Recency for posts without a creation timestamp
const NEUTRAL_RECENCY: f64 = 0.5;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// `likes * 0.7 + comments * 0.3`
pub fn weighted_engagement(likes: u64, comments: u64) -> f64 {
    likes as f64 * LIKE_WEIGHT + comments as f64 * COMMENT_WEIGHT
}

/// `((cos + 1) / 2) ^ 0.7`
pub fn semantic_match(profile: &Embedding, post: &Embedding) -> Result<f64, EmbeddingError> {
    let similarity = profile.cosine(post)?;
    Ok(remap_similarity(similarity).powf(SIMILARITY_BOOST_EXPONENT))
}

/// Log-compressed engagement: `log1p(e) / log1p(100)`, capped at 1.
pub fn engagement_score(likes: u64, comments: u64) -> f64 {
    let engagement = weighted_engagement(likes, comments);
    if engagement <= 0.0 {
        return 0.0;
    }
    (engagement.ln_1p() / ENGAGEMENT_SATURATION.ln_1p()).min(1.0)
}

/// Linear decay to 0 over 30 days; 0.5 when the timestamp is unknown.
pub fn recency_score(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(created_at) = created_at else {
        return NEUTRAL_RECENCY;
    };

    let age_days = (now - created_at).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY;
    (1.0 - age_days / RECENCY_WINDOW_DAYS).clamp(0.0, 1.0)
}
