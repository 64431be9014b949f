/// Recommendation Service
///
/// Orchestrates one ranking request end to end:
///
/// 1. Synthesize the viewer profile (one embedding call at most)
/// 2. Pick the scoring path for the whole request
/// 3. Embed every candidate in one batch and score each post
/// 4. Explore/exploit selection and shuffle
///
/// No state is shared between requests apart from the embedding provider.
use crate::config::{EmbeddingConfig, MAX_PAGE_SIZE};
use crate::models::{FeedPage, Post, ScoreSource, ScoredCandidate, UserPreferences, Viewer};
use crate::services::diversity::{DiversityLayer, RandomSource};
use crate::services::embedding::{embed_posts, EmbeddingCapability, HttpEmbeddingProvider};
use crate::services::profile::ProfileSynthesizer;
use crate::services::scoring::{Scorer, ScoringPath};
use crate::services::similarity::SimilarityFinder;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Feed requests over-fetch this many pages worth of ranked posts
const FEED_OVERFETCH_PAGES: usize = 2;

pub struct RecommendationService {
    embeddings: EmbeddingCapability,
    profiles: ProfileSynthesizer,
    diversity: DiversityLayer,
    similarity: SimilarityFinder,
}

impl RecommendationService {
    pub fn new(embeddings: EmbeddingCapability) -> Self {
        Self {
            profiles: ProfileSynthesizer::new(embeddings.clone()),
            similarity: SimilarityFinder::new(embeddings.clone()),
            diversity: DiversityLayer::new(),
            embeddings,
        }
    }

    /// Wire the HTTP provider when an endpoint is configured.
    ///
    /// A missing or unbuildable provider routes every request through
    /// tag-based scoring for the lifetime of the process.
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        let embeddings = match HttpEmbeddingProvider::from_config(config) {
            Some(Ok(provider)) => {
                info!(
                    endpoint = provider.endpoint(),
                    model = %config.model,
                    "Embedding provider ready, using semantic recommendations"
                );
                EmbeddingCapability::available(Arc::new(provider))
            }
            Some(Err(e)) => {
                warn!(error = %e, "Failed to initialise embedding provider, falling back to tag-based recommendations");
                EmbeddingCapability::Unavailable
            }
            None => {
                warn!("No embedding endpoint configured, using tag-based recommendations");
                EmbeddingCapability::Unavailable
            }
        };

        Self::new(embeddings)
    }

    pub fn embeddings(&self) -> &EmbeddingCapability {
        &self.embeddings
    }

    /// Score every candidate against the viewer. Output keeps input order.
    pub async fn score_candidates<'a>(
        &self,
        candidates: &[&'a Post],
        preferences: &UserPreferences,
        liked_posts: &[&Post],
        now: DateTime<Utc>,
    ) -> Vec<ScoredCandidate<'a>> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let profile = self.profiles.synthesize(preferences, liked_posts).await;
        let path = ScoringPath::from_profile(profile);

        let embeddings = match (&path, self.embeddings.provider()) {
            (ScoringPath::Semantic(_), Some(provider)) => embed_posts(provider, candidates).await,
            _ => Vec::new(),
        };

        let scorer = Scorer::new(now);
        let scored: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .enumerate()
            .map(|(i, &post)| {
                let score = scorer.score(post, preferences, &path, embeddings.get(i));
                ScoredCandidate {
                    post,
                    score: score.value,
                    source: score.source,
                }
            })
            .collect();

        let degraded = if path.is_semantic() {
            scored
                .iter()
                .filter(|c| c.source == ScoreSource::TagBased)
                .count()
        } else {
            0
        };

        info!(
            candidate_count = scored.len(),
            liked_posts = liked_posts.len(),
            semantic = path.is_semantic(),
            degraded,
            "Candidates scored"
        );

        scored
    }

    /// Rank `candidates` for the viewer and return at most `limit` posts.
    pub async fn recommend<'a, R: RandomSource + ?Sized>(
        &self,
        candidates: &[&'a Post],
        preferences: &UserPreferences,
        liked_posts: &[&Post],
        limit: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<&'a Post> {
        let span = info_span!("recommend", request_id = %Uuid::new_v4(), limit);

        async move {
            if candidates.is_empty() {
                debug!("Empty candidate set");
                return Vec::new();
            }

            let scored = self
                .score_candidates(candidates, preferences, liked_posts, now)
                .await;
            self.diversity.rank(scored, limit, rng)
        }
        .instrument(span)
        .await
    }

    /// Personalised feed page for `viewer` over the full post corpus.
    ///
    /// Only approved posts are candidates, newest first so equal scores
    /// keep reverse-chronological order; posts without a timestamp go last.
    /// Liked posts are resolved from them by id. `page` is 1-based.
    pub async fn personalized_feed<'a, R: RandomSource + ?Sized>(
        &self,
        corpus: &'a [Post],
        viewer: &Viewer,
        page: usize,
        page_size: usize,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> FeedPage<'a> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);

        let mut approved: Vec<&'a Post> = corpus.iter().filter(|post| post.is_approved).collect();
        approved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let liked_ids: HashSet<&str> = viewer.liked_post_ids.iter().map(String::as_str).collect();
        let liked: Vec<&Post> = approved
            .iter()
            .copied()
            .filter(|post| liked_ids.contains(post.id.as_str()))
            .collect();

        debug!(
            viewer_id = %viewer.id,
            approved = approved.len(),
            liked = liked.len(),
            "Building personalised feed"
        );

        let ranked = self
            .recommend(
                &approved,
                &viewer.preferences,
                &liked,
                page_size * FEED_OVERFETCH_PAGES,
                now,
                rng,
            )
            .await;

        let total = ranked.len();
        let skip = (page - 1).saturating_mul(page_size);
        let posts: Vec<&'a Post> = ranked.into_iter().skip(skip).take(page_size).collect();

        FeedPage {
            posts,
            total,
            page,
            page_size,
            has_more: skip.saturating_add(page_size) < total,
        }
    }

    /// Posts similar to `reference`, best first.
    pub async fn similar_posts<'a>(
        &self,
        reference: &Post,
        candidates: &[&'a Post],
        limit: usize,
    ) -> Vec<&'a Post> {
        let span = info_span!("similar_posts", request_id = %Uuid::new_v4(), post_id = %reference.id);
        self.similarity
            .similar(reference, candidates, limit)
            .instrument(span)
            .await
    }
}
