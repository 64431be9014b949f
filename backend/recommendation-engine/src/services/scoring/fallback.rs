/// Tag-based fallback scoring
///
/// Used when no profile embedding exists for the request, or when a single
/// post's embedding is unusable.
///
/// | Signal                        | Weight | Counted when            |
/// |-------------------------------|--------|-------------------------|
/// | tag overlap                   | 0.4    | viewer has favorite tags|
/// | category/interest overlap     | 0.4    | viewer has interests    |
/// | engagement (linear, capped)   | 0.2    | always                  |
///
/// The score is normalised by the weights that were counted.
use super::semantic::weighted_engagement;
use crate::models::{Post, UserPreferences};
use std::collections::{BTreeSet, HashSet};

const TAG_WEIGHT: f64 = 0.4;
const INTEREST_WEIGHT: f64 = 0.4;
const ENGAGEMENT_WEIGHT: f64 = 0.2;

/// Weighted engagement points mapped to 1.0
const ENGAGEMENT_CAP: f64 = 100.0;

/// Score for viewers who declared no preferences
pub const NEUTRAL_SCORE: f64 = 0.5;

/// `|post ∩ preferred| / max(|preferred|, |post|)`
///
/// The post side keeps its sequence length, duplicates included.
fn overlap_ratio(post_values: &[String], preferred: &BTreeSet<String>) -> f64 {
    let post_set: HashSet<&String> = post_values.iter().collect();
    let matching = post_set.iter().filter(|v| preferred.contains(v.as_str())).count();
    if matching == 0 {
        return 0.0;
    }
    matching as f64 / preferred.len().max(post_values.len()) as f64
}

pub fn tag_based_score(post: &Post, preferences: &UserPreferences) -> f64 {
    if preferences.is_empty() {
        return NEUTRAL_SCORE;
    }

    let mut score = 0.0;
    let mut max_score = 0.0;

    if !preferences.favorite_tags.is_empty() {
        max_score += TAG_WEIGHT;
        score += overlap_ratio(&post.tags, &preferences.favorite_tags) * TAG_WEIGHT;
    }

    if !preferences.interests.is_empty() {
        max_score += INTEREST_WEIGHT;
        score += overlap_ratio(&post.categories, &preferences.interests) * INTEREST_WEIGHT;
    }

    max_score += ENGAGEMENT_WEIGHT;
    let engagement =
        (weighted_engagement(post.like_count, post.comment_count) / ENGAGEMENT_CAP).min(1.0);
    score += engagement * ENGAGEMENT_WEIGHT;

    (score / max_score).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tech_prefs() -> UserPreferences {
        UserPreferences::new(["rust", "systems"], ["technology"])
    }

    #[test]
    fn test_partial_tag_full_interest_overlap() {
        let post = Post::new("p1", "")
            .with_tags(["rust", "programming"])
            .with_categories(["technology"]);

        // 1/2 * 0.4 + 1/1 * 0.4 + 0 = 0.6 over max 1.0
        assert!((tag_based_score(&post, &tech_prefs()) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_no_preferences_is_neutral() {
        let prefs = UserPreferences::default();
        let posts = [
            Post::new("a", "anything").with_tags(["x"]).with_engagement(500, 10),
            Post::new("b", ""),
        ];

        for post in &posts {
            assert_eq!(tag_based_score(post, &prefs), NEUTRAL_SCORE);
        }
    }

    #[test]
    fn test_only_tags_normalises_without_interest_weight() {
        let prefs = UserPreferences::new(["rust"], Vec::<String>::new());
        let post = Post::new("p1", "").with_tags(["rust"]);

        // 0.4 / (0.4 + 0.2)
        assert!((tag_based_score(&post, &prefs) - 0.4 / 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_capped() {
        let prefs = UserPreferences::new(Vec::<String>::new(), ["music"]);
        let post = Post::new("p1", "").with_engagement(1_000, 1_000);

        // no overlap, engagement saturates at 1.0: 0.2 / 0.6
        assert!((tag_based_score(&post, &prefs) - 0.2 / 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_engagement_linear_below_cap() {
        let prefs = UserPreferences::new(["rust"], Vec::<String>::new());
        let post = Post::new("p1", "").with_engagement(10, 10);

        // (10 * 0.7 + 10 * 0.3) / 100 = 0.1 -> 0.02 / 0.6
        assert!((tag_based_score(&post, &prefs) - 0.02 / 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_post_tags_dilute_ratio() {
        let prefs = UserPreferences::new(["rust"], Vec::<String>::new());
        let post = Post::new("p1", "").with_tags(["rust", "rust"]);

        // 1 match / max(1, 2)
        assert!((tag_based_score(&post, &prefs) - 0.2 / 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_empty_post_against_preferences() {
        let post = Post::new("p1", "");
        assert_eq!(tag_based_score(&post, &tech_prefs()), 0.0);
    }
}
