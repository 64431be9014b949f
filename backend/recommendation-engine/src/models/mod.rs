use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// A post as supplied by the persistence layer. Read-only for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, alias = "likes_count")]
    pub like_count: u64,
    #[serde(default, alias = "comments_count")]
    pub comment_count: u64,
    /// Unparseable or offset-less timestamps load as `None` (neutral recency)
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default = "default_approved")]
    pub is_approved: bool,
}

fn default_approved() -> bool {
    true
}

/// RFC 3339 strings only; any other value becomes `None` instead of
/// failing the whole document.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|ts| ts.with_timezone(&Utc)))
}

impl Post {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            author_id: None,
            content: content.into(),
            tags: Vec::new(),
            categories: Vec::new(),
            like_count: 0,
            comment_count: 0,
            created_at: None,
            is_approved: true,
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_engagement(mut self, likes: u64, comments: u64) -> Self {
        self.like_count = likes;
        self.comment_count = comments;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Text fed to the embedding provider: content, tags, then categories.
    /// Empty when the post carries none of them.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} {} {}",
            self.content,
            self.tags.join(" "),
            self.categories.join(" ")
        )
        .trim()
        .to_string()
    }
}

/// Declared viewer preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub favorite_tags: BTreeSet<String>,
    #[serde(default)]
    pub interests: BTreeSet<String>,
}

impl UserPreferences {
    pub fn new<I, J, S, T>(favorite_tags: I, interests: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            favorite_tags: favorite_tags.into_iter().map(Into::into).collect(),
            interests: interests.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.favorite_tags.is_empty() && self.interests.is_empty()
    }
}

/// How a candidate's score was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// Cosine match against the profile embedding, blended with engagement and recency
    Semantic,
    /// Post had no text; pinned to the floor score
    EmptyText,
    /// Tag/category overlap scoring
    TagBased,
}

/// A candidate paired with its per-request score in [0, 1].
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub post: &'a Post,
    pub score: f64,
    pub source: ScoreSource,
}

/// Everything the feed needs to know about the viewer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Viewer {
    pub id: String,
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub liked_post_ids: Vec<String>,
}

/// One page of the personalised feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage<'a> {
    pub posts: Vec<&'a Post>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
}
