pub mod config;
pub mod corpus;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use corpus::Corpus;
pub use error::{RecommendationError, Result};
pub use models::{FeedPage, Post, ScoreSource, ScoredCandidate, UserPreferences, Viewer};
pub use services::{
    DiversityLayer, EmbeddingCapability, EmbeddingProvider, HttpEmbeddingProvider,
    ProfileSynthesizer, RandomSource, RecommendationService, Scorer, SimilarityFinder,
};
