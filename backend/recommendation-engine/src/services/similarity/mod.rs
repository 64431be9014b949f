// ============================================
// Similarity Finder
// ============================================
//
// "More like this" for a reference post.
//
// Embedding path:  remapped cosine of post texts, keep > 0.3
// Fallback path:   0.6 * Jaccard(tags) + 0.4 * Jaccard(categories), keep > 0
//
// The reference and every candidate are embedded in one provider call.

use crate::models::{Post, ScoreSource, ScoredCandidate};
use crate::services::diversity::DiversityLayer;
use crate::services::embedding::{
    embed_posts, EmbeddingCapability, EmbeddingProvider, PostEmbedding,
};
use crate::utils::{jaccard, remap_similarity};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Minimum remapped cosine for a candidate to count as similar
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

const TAG_SIMILARITY_WEIGHT: f64 = 0.6;
const CATEGORY_SIMILARITY_WEIGHT: f64 = 0.4;

/// `0.6 * Jaccard(tags) + 0.4 * Jaccard(categories)`
pub fn tag_similarity(a: &Post, b: &Post) -> f64 {
    let a_tags: HashSet<&str> = a.tags.iter().map(String::as_str).collect();
    let b_tags: HashSet<&str> = b.tags.iter().map(String::as_str).collect();
    let a_categories: HashSet<&str> = a.categories.iter().map(String::as_str).collect();
    let b_categories: HashSet<&str> = b.categories.iter().map(String::as_str).collect();

    jaccard(&a_tags, &b_tags) * TAG_SIMILARITY_WEIGHT
        + jaccard(&a_categories, &b_categories) * CATEGORY_SIMILARITY_WEIGHT
}

pub struct SimilarityFinder {
    embeddings: EmbeddingCapability,
}

impl SimilarityFinder {
    pub fn new(embeddings: EmbeddingCapability) -> Self {
        Self { embeddings }
    }

    /// Posts most similar to `reference`, best first, excluding the
    /// reference itself (matched by id).
    pub async fn similar<'a>(
        &self,
        reference: &Post,
        candidates: &[&'a Post],
        limit: usize,
    ) -> Vec<&'a Post> {
        let others: Vec<&'a Post> = candidates
            .iter()
            .copied()
            .filter(|candidate| candidate.id != reference.id)
            .collect();

        let scored = match self.embeddings.provider() {
            Some(provider) => match Self::score_by_embedding(provider, reference, &others).await {
                Some(scored) => scored,
                None => Self::score_by_tags(reference, &others),
            },
            None => Self::score_by_tags(reference, &others),
        };

        Self::top(scored, limit)
    }

    /// Fallback path on its own.
    pub fn similar_by_tags<'a>(
        reference: &Post,
        candidates: &[&'a Post],
        limit: usize,
    ) -> Vec<&'a Post> {
        let others: Vec<&'a Post> = candidates
            .iter()
            .copied()
            .filter(|candidate| candidate.id != reference.id)
            .collect();
        Self::top(Self::score_by_tags(reference, &others), limit)
    }

    fn score_by_tags<'a>(reference: &Post, others: &[&'a Post]) -> Vec<ScoredCandidate<'a>> {
        others
            .iter()
            .filter_map(|&candidate| {
                let score = tag_similarity(reference, candidate);
                (score > 0.0).then_some(ScoredCandidate {
                    post: candidate,
                    score,
                    source: ScoreSource::TagBased,
                })
            })
            .collect()
    }

    /// `None` means the whole call should use the fallback path.
    async fn score_by_embedding<'a>(
        provider: &dyn EmbeddingProvider,
        reference: &Post,
        others: &[&'a Post],
    ) -> Option<Vec<ScoredCandidate<'a>>> {
        let mut batch: Vec<&Post> = Vec::with_capacity(others.len() + 1);
        batch.push(reference);
        batch.extend(others.iter().copied());

        let mut embeddings = embed_posts(provider, &batch).await.into_iter();
        let reference_embedding = match embeddings.next() {
            Some(PostEmbedding::Ready(embedding)) => embedding,
            Some(PostEmbedding::EmptyText) => {
                debug!(post_id = %reference.id, "Reference post has no text");
                return Some(Vec::new());
            }
            Some(PostEmbedding::Failed(e)) => {
                warn!(post_id = %reference.id, error = %e, "Embedding-based similarity failed, falling back to tag-based");
                return None;
            }
            None => return None,
        };

        let scored = others
            .iter()
            .zip(embeddings)
            .filter_map(|(&candidate, embedding)| match embedding {
                PostEmbedding::EmptyText => None,
                PostEmbedding::Ready(vector) => match reference_embedding.cosine(&vector) {
                    Ok(similarity) => {
                        let score = remap_similarity(similarity);
                        (score > SIMILARITY_THRESHOLD).then_some(ScoredCandidate {
                            post: candidate,
                            score,
                            source: ScoreSource::Semantic,
                        })
                    }
                    Err(e) => Self::degrade(reference, candidate, &e),
                },
                PostEmbedding::Failed(e) => Self::degrade(reference, candidate, &e),
            })
            .collect();

        Some(scored)
    }

    fn degrade<'a>(
        reference: &Post,
        candidate: &'a Post,
        error: &dyn std::error::Error,
    ) -> Option<ScoredCandidate<'a>> {
        warn!(post_id = %candidate.id, error = %error, "Candidate embedding unusable, using tag similarity");
        let score = tag_similarity(reference, candidate);
        (score > 0.0).then_some(ScoredCandidate {
            post: candidate,
            score,
            source: ScoreSource::TagBased,
        })
    }

    fn top(mut scored: Vec<ScoredCandidate<'_>>, limit: usize) -> Vec<&Post> {
        DiversityLayer::sort_by_score(&mut scored);
        scored.into_iter().take(limit).map(|c| c.post).collect()
    }
}
