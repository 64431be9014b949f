use crate::error::{RecommendationError, Result};
use crate::models::{Post, Viewer};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Posts and viewers loaded from a JSON document:
///
/// ```json
/// { "posts": [ { "id": "p1", "content": "...", "tags": ["rust"] } ],
///   "users": [ { "id": "u1", "preferences": { "favorite_tags": ["rust"] } } ] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Corpus {
    pub posts: Vec<Post>,
    #[serde(default)]
    pub users: Vec<Viewer>,
}

impl Corpus {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let corpus = Self::from_json(&raw)?;

        info!(
            path = %path.display(),
            posts = corpus.posts.len(),
            users = corpus.users.len(),
            "Corpus loaded"
        );

        Ok(corpus)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn post(&self, id: &str) -> Result<&Post> {
        self.posts
            .iter()
            .find(|post| post.id == id)
            .ok_or_else(|| RecommendationError::PostNotFound(id.to_string()))
    }

    pub fn viewer(&self, id: &str) -> Result<&Viewer> {
        self.users
            .iter()
            .find(|user| user.id == id)
            .ok_or_else(|| RecommendationError::UserNotFound(id.to_string()))
    }

    /// Approved posts, in corpus order.
    pub fn approved_posts(&self) -> Vec<&Post> {
        self.posts.iter().filter(|post| post.is_approved).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "posts": [
            {"id": "p1", "content": "rust ownership", "tags": ["rust"], "categories": ["technology"],
             "like_count": 12, "comment_count": 3, "created_at": "2024-05-01T12:00:00Z"},
            {"id": "p2", "content": "hidden draft", "is_approved": false}
        ],
        "users": [
            {"id": "u1", "preferences": {"favorite_tags": ["rust"], "interests": ["technology"]},
             "liked_post_ids": ["p1"]}
        ]
    }"#;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let corpus = Corpus::load(file.path()).unwrap();

        assert_eq!(corpus.posts.len(), 2);
        assert_eq!(corpus.posts[0].like_count, 12);
        assert!(corpus.posts[0].created_at.is_some());
        assert_eq!(corpus.viewer("u1").unwrap().liked_post_ids, vec!["p1"]);
    }

    #[test]
    fn test_approved_posts_filter() {
        let corpus = Corpus::from_json(SAMPLE).unwrap();
        let approved = corpus.approved_posts();

        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, "p1");
    }

    #[test]
    fn test_lookup_errors() {
        let corpus = Corpus::from_json(SAMPLE).unwrap();

        assert!(matches!(
            corpus.post("missing"),
            Err(RecommendationError::PostNotFound(id)) if id == "missing"
        ));
        assert!(matches!(
            corpus.viewer("nobody"),
            Err(RecommendationError::UserNotFound(_))
        ));
    }

    #[test]
    fn test_offset_less_timestamp_does_not_fail_load() {
        let corpus = Corpus::from_json(
            r#"{"posts": [
                {"id": "naive", "content": "x", "created_at": "2024-05-01T12:00:00"},
                {"id": "dated", "content": "y", "created_at": "2024-05-01T12:00:00Z"}
            ]}"#,
        )
        .unwrap();

        assert!(corpus.post("naive").unwrap().created_at.is_none());
        assert!(corpus.post("dated").unwrap().created_at.is_some());
    }

    #[test]
    fn test_users_optional() {
        let corpus = Corpus::from_json(r#"{"posts": []}"#).unwrap();
        assert!(corpus.users.is_empty());
    }

    #[test]
    fn test_missing_file_and_bad_json() {
        assert!(matches!(
            Corpus::load("/nonexistent/corpus.json"),
            Err(RecommendationError::CorpusIo(_))
        ));
        assert!(matches!(
            Corpus::from_json("{not json"),
            Err(RecommendationError::CorpusParse(_))
        ));
    }
}
