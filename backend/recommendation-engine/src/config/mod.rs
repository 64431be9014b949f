use crate::error::Result;
use serde::Deserialize;

const ENV_PREFIX: &str = "RECOMMENDER_";

/// Largest feed page a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub feed: FeedConfig,
    pub logging: LoggingConfig,
}

/// Embedding provider settings. No URL means the provider is unavailable
/// for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub url: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: None,
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub page_size: usize,
    pub similar_limit: usize,
    /// Fixed seed for sampling and shuffling; entropy when unset
    pub random_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            similar_limit: default_similar_limit(),
            random_seed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub log_format: LogFormat,
}

/// Flat view of the `RECOMMENDER_*` variables as envy sees them.
#[derive(Debug, Deserialize)]
struct EnvConfig {
    embedding_url: Option<String>,
    #[serde(default = "default_embedding_model")]
    embedding_model: String,
    embedding_api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    embedding_timeout_secs: u64,
    #[serde(default = "default_page_size")]
    feed_page_size: usize,
    #[serde(default = "default_similar_limit")]
    similar_limit: usize,
    random_seed: Option<u64>,
    #[serde(default)]
    log_format: LogFormat,
}

impl From<EnvConfig> for Config {
    fn from(env: EnvConfig) -> Self {
        Config {
            embedding: EmbeddingConfig {
                url: env.embedding_url.filter(|url| !url.trim().is_empty()),
                model: env.embedding_model,
                api_key: env.embedding_api_key,
                timeout_secs: env.embedding_timeout_secs,
            },
            feed: FeedConfig {
                page_size: env.feed_page_size.clamp(1, MAX_PAGE_SIZE),
                similar_limit: env.similar_limit,
                random_seed: env.random_seed,
            },
            logging: LoggingConfig {
                log_format: env.log_format,
            },
        }
    }
}

fn default_embedding_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    20
}

fn default_similar_limit() -> usize {
    5
}

impl Config {
    /// Load from `RECOMMENDER_*` environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load from an explicit set of key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        Ok(env.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecommendationError;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(Vec::new()).unwrap();

        assert!(config.embedding.url.is_none());
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.feed.page_size, 20);
        assert_eq!(config.feed.similar_limit, 5);
        assert!(config.feed.random_seed.is_none());
        assert_eq!(config.logging.log_format, LogFormat::Text);
    }

    #[test]
    fn test_prefixed_overrides() {
        let config = Config::from_vars(vars(&[
            ("RECOMMENDER_EMBEDDING_URL", "http://localhost:8080/v1"),
            ("RECOMMENDER_EMBEDDING_MODEL", "bge-small"),
            ("RECOMMENDER_FEED_PAGE_SIZE", "50"),
            ("RECOMMENDER_SIMILAR_LIMIT", "8"),
            ("RECOMMENDER_RANDOM_SEED", "42"),
            ("RECOMMENDER_LOG_FORMAT", "json"),
            ("UNRELATED", "ignored"),
        ]))
        .unwrap();

        assert_eq!(
            config.embedding.url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(config.embedding.model, "bge-small");
        assert_eq!(config.feed.page_size, 50);
        assert_eq!(config.feed.similar_limit, 8);
        assert_eq!(config.feed.random_seed, Some(42));
        assert_eq!(config.logging.log_format, LogFormat::Json);
    }

    #[test]
    fn test_page_size_clamped() {
        let config = Config::from_vars(vars(&[("RECOMMENDER_FEED_PAGE_SIZE", "500")])).unwrap();
        assert_eq!(config.feed.page_size, MAX_PAGE_SIZE);

        let config = Config::from_vars(vars(&[("RECOMMENDER_FEED_PAGE_SIZE", "0")])).unwrap();
        assert_eq!(config.feed.page_size, 1);
    }

    #[test]
    fn test_blank_embedding_url_is_unavailable() {
        let config = Config::from_vars(vars(&[("RECOMMENDER_EMBEDDING_URL", "  ")])).unwrap();
        assert!(config.embedding.url.is_none());
    }

    #[test]
    fn test_invalid_number_rejected() {
        assert!(matches!(
            Config::from_vars(vars(&[("RECOMMENDER_RANDOM_SEED", "abc")])),
            Err(RecommendationError::Config(_))
        ));
    }
}
