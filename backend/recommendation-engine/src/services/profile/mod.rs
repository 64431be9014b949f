// ============================================
// Profile Synthesizer
// ============================================
//
// Builds one representation of a viewer's taste from:
// 1. Declared preferences (favorite tags + interests)  -> manual block
// 2. Recently liked posts (tags, categories, content)  -> learned block
//
// The learned block is repeated so behaviour weighs roughly twice as much
// as declared preferences:
//
//   profile = manual + learned + learned
//
// With an embedding provider the text is embedded once per request.

use crate::models::{Post, UserPreferences};
use crate::services::embedding::{embed_one, Embedding, EmbeddingCapability};
use crate::utils::truncate_chars;
use tracing::{debug, warn};

/// Characters of liked-post content fed into the learned block
const LIKED_CONTENT_CHARS: usize = 200;

/// Synthesised viewer profile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileRepresentation {
    /// Profile text; used when no profile embedding could be produced
    Text(String),
    Embedding(Embedding),
}

impl ProfileRepresentation {
    pub fn embedding(&self) -> Option<&Embedding> {
        match self {
            ProfileRepresentation::Embedding(embedding) => Some(embedding),
            ProfileRepresentation::Text(_) => None,
        }
    }
}

pub struct ProfileSynthesizer {
    embeddings: EmbeddingCapability,
}

impl ProfileSynthesizer {
    pub fn new(embeddings: EmbeddingCapability) -> Self {
        Self { embeddings }
    }

    /// Build the viewer's profile representation.
    ///
    /// Falls back to the text form when the provider is unavailable, the
    /// profile text is empty, or embedding the profile fails.
    pub async fn synthesize(
        &self,
        preferences: &UserPreferences,
        liked_posts: &[&Post],
    ) -> ProfileRepresentation {
        let text = profile_text(preferences, liked_posts);

        let Some(provider) = self.embeddings.provider() else {
            return ProfileRepresentation::Text(text);
        };

        if text.is_empty() {
            debug!("Empty profile text, using tag-based scoring");
            return ProfileRepresentation::Text(text);
        }

        match embed_one(provider, &text).await {
            Ok(embedding) => {
                debug!(
                    liked_posts = liked_posts.len(),
                    dimension = embedding.dimension(),
                    "Profile embedded"
                );
                ProfileRepresentation::Embedding(embedding)
            }
            Err(e) => {
                warn!(error = %e, "Failed to embed profile, using tag-based scoring");
                ProfileRepresentation::Text(text)
            }
        }
    }
}

/// Space-joined favorite tags followed by interests.
pub fn manual_block(preferences: &UserPreferences) -> String {
    let tags: Vec<&str> = preferences.favorite_tags.iter().map(String::as_str).collect();
    let interests: Vec<&str> = preferences.interests.iter().map(String::as_str).collect();
    format!("{} {}", tags.join(" "), interests.join(" "))
        .trim()
        .to_string()
}

/// All liked tags, then all liked categories, then each liked post's
/// leading content.
pub fn learned_block(liked_posts: &[&Post]) -> String {
    let tags = liked_posts.iter().flat_map(|post| post.tags.iter());
    let categories = liked_posts.iter().flat_map(|post| post.categories.iter());
    let contents = liked_posts
        .iter()
        .filter(|post| !post.content.is_empty())
        .map(|post| truncate_chars(&post.content, LIKED_CONTENT_CHARS));

    tags.map(String::as_str)
        .chain(categories.map(String::as_str))
        .chain(contents)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full profile text: `manual + learned + learned`, or `manual` alone when
/// nothing was learned.
pub fn profile_text(preferences: &UserPreferences, liked_posts: &[&Post]) -> String {
    let manual = manual_block(preferences);
    let learned = learned_block(liked_posts);

    if learned.is_empty() {
        return manual;
    }

    format!("{} {} {}", manual, learned, learned)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::embedding::{EmbeddingError, MockEmbeddingProvider};
    use std::sync::Arc;

    fn prefs() -> UserPreferences {
        UserPreferences::new(["rust", "systems"], ["technology"])
    }

    #[test]
    fn test_manual_only_profile() {
        assert_eq!(profile_text(&prefs(), &[]), "rust systems technology");
    }

    #[test]
    fn test_learned_block_is_duplicated() {
        let liked = Post::new("p1", "Borrow checker tips")
            .with_tags(["ownership"])
            .with_categories(["programming"]);

        let text = profile_text(&prefs(), &[&liked]);

        assert_eq!(
            text,
            "rust systems technology \
             ownership programming Borrow checker tips \
             ownership programming Borrow checker tips"
        );
    }

    #[test]
    fn test_learned_block_groups_tags_categories_then_content() {
        let a = Post::new("a", "alpha").with_tags(["t1"]).with_categories(["c1"]);
        let b = Post::new("b", "beta").with_tags(["t2"]).with_categories(["c2"]);

        assert_eq!(learned_block(&[&a, &b]), "t1 t2 c1 c2 alpha beta");
    }

    #[test]
    fn test_liked_content_truncated() {
        let long = "x".repeat(500);
        let liked = Post::new("p1", long);

        let block = learned_block(&[&liked]);
        assert_eq!(block.chars().count(), LIKED_CONTENT_CHARS);
    }

    #[test]
    fn test_learned_only_profile_has_no_leading_space() {
        let liked = Post::new("p1", "").with_tags(["cats"]);
        assert_eq!(profile_text(&UserPreferences::default(), &[&liked]), "cats cats");
    }

    #[test]
    fn test_empty_liked_posts_contribute_nothing() {
        let liked = Post::new("p1", "");
        assert_eq!(profile_text(&prefs(), &[&liked]), "rust systems technology");
    }

    #[tokio::test]
    async fn test_synthesize_without_provider_returns_text() {
        let synthesizer = ProfileSynthesizer::new(EmbeddingCapability::Unavailable);

        let profile = synthesizer.synthesize(&prefs(), &[]).await;
        assert_eq!(
            profile,
            ProfileRepresentation::Text("rust systems technology".to_string())
        );
        assert!(profile.embedding().is_none());
    }

    #[tokio::test]
    async fn test_synthesize_embeds_profile_once() {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_embed()
            .times(1)
            .withf(|texts| texts.len() == 1 && texts[0] == "rust systems technology")
            .returning(|_| Ok(vec![vec![0.1, 0.2, 0.3]]));
        let synthesizer = ProfileSynthesizer::new(EmbeddingCapability::available(Arc::new(mock)));

        let profile = synthesizer.synthesize(&prefs(), &[]).await;
        assert_eq!(profile.embedding().map(|e| e.dimension()), Some(3));
    }

    #[tokio::test]
    async fn test_synthesize_empty_profile_skips_provider() {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_embed().times(0);
        let synthesizer = ProfileSynthesizer::new(EmbeddingCapability::available(Arc::new(mock)));

        let profile = synthesizer.synthesize(&UserPreferences::default(), &[]).await;
        assert_eq!(profile, ProfileRepresentation::Text(String::new()));
    }

    #[tokio::test]
    async fn test_synthesize_provider_failure_falls_back_to_text() {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_embed()
            .returning(|_| Err(EmbeddingError::RequestFailed("timeout".to_string())));
        let synthesizer = ProfileSynthesizer::new(EmbeddingCapability::available(Arc::new(mock)));

        let profile = synthesizer.synthesize(&prefs(), &[]).await;
        assert!(matches!(profile, ProfileRepresentation::Text(_)));
    }
}
