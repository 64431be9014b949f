use crate::models::{Post, ScoredCandidate};
use rand::seq::SliceRandom;
use rand::Rng;
use std::ops::Range;
use tracing::debug;

/// Share of the page filled verbatim from the top of the ranking
const EXPLOIT_PERCENT: usize = 85;

/// Leading positions kept in score order by the final shuffle
const PINNED_HEAD: usize = 5;

/// Randomness used by the explore step and the final shuffle.
///
/// Every `rand::Rng` is a `RandomSource`, so a seeded `StdRng` gives
/// reproducible rankings.
pub trait RandomSource {
    /// `amount` distinct indices from `0..len`, in random order.
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize>;

    fn shuffle<T>(&mut self, items: &mut [T]);
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(self, len, amount.min(len)).into_vec()
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(self);
    }
}

/// Exploit and explore slices before the final shuffle.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub exploit: Vec<ScoredCandidate<'a>>,
    pub explore: Vec<ScoredCandidate<'a>>,
    /// Index window of the score-sorted list the explore slice was drawn from
    pub pool: Range<usize>,
}

impl<'a> Selection<'a> {
    pub fn into_posts(self) -> Vec<&'a Post> {
        self.exploit
            .into_iter()
            .chain(self.explore)
            .map(|candidate| candidate.post)
            .collect()
    }
}

/// Diversity Layer - explore/exploit selection
///
/// 1. Top 85% of the page comes straight from the score ranking (exploit)
/// 2. The rest is sampled from the 20th-60th percentile band (explore)
/// 3. Everything after the first 5 positions is shuffled
#[derive(Debug, Clone, Copy, Default)]
pub struct DiversityLayer;

impl DiversityLayer {
    pub fn new() -> Self {
        Self
    }

    /// Sort descending by score. Stable: equal scores keep input order.
    pub fn sort_by_score(candidates: &mut [ScoredCandidate<'_>]) {
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    }

    /// `(floor(limit * 0.85), limit - exploit)`
    pub fn split(limit: usize) -> (usize, usize) {
        let exploit = limit * EXPLOIT_PERCENT / 100;
        (exploit, limit - exploit)
    }

    /// Index window `[len/5, len*3/5)`, moved past the exploit slice so the
    /// two never overlap. Empty when there is nothing to explore.
    pub fn diversity_pool(len: usize, exploit_taken: usize, explore_count: usize) -> Range<usize> {
        if explore_count == 0 || len <= exploit_taken {
            return 0..0;
        }
        let start = (len / 5).max(exploit_taken);
        let end = len * 3 / 5;
        if start >= end {
            return 0..0;
        }
        start..end
    }

    /// Build the exploit and explore slices from a score-sorted list.
    pub fn select<'a, R: RandomSource + ?Sized>(
        &self,
        sorted: &[ScoredCandidate<'a>],
        limit: usize,
        rng: &mut R,
    ) -> Selection<'a> {
        let (exploit_count, explore_count) = Self::split(limit);

        let exploit: Vec<ScoredCandidate<'a>> =
            sorted.iter().take(exploit_count).cloned().collect();

        let pool = Self::diversity_pool(sorted.len(), exploit.len(), explore_count);
        let window = &sorted[pool.clone()];
        let explore: Vec<ScoredCandidate<'a>> = rng
            .sample_indices(window.len(), explore_count.min(window.len()))
            .into_iter()
            .map(|i| window[i].clone())
            .collect();

        debug!(
            candidates = sorted.len(),
            limit,
            exploit = exploit.len(),
            explore = explore.len(),
            pool_start = pool.start,
            pool_end = pool.end,
            "Explore/exploit selection"
        );

        Selection {
            exploit,
            explore,
            pool,
        }
    }

    /// Order scored candidates into the final page of at most `limit` posts.
    pub fn rank<'a, R: RandomSource + ?Sized>(
        &self,
        mut candidates: Vec<ScoredCandidate<'a>>,
        limit: usize,
        rng: &mut R,
    ) -> Vec<&'a Post> {
        if candidates.is_empty() {
            return Vec::new();
        }

        Self::sort_by_score(&mut candidates);
        let mut posts = self.select(&candidates, limit, rng).into_posts();

        if posts.len() > PINNED_HEAD {
            rng.shuffle(&mut posts[PINNED_HEAD..]);
        }

        posts.truncate(limit);
        posts
    }
}
