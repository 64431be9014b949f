pub mod diversity;
pub mod embedding;
pub mod profile;
pub mod recommender;
pub mod scoring;
pub mod similarity;

pub use diversity::{DiversityLayer, RandomSource};
pub use embedding::{EmbeddingCapability, EmbeddingProvider, HttpEmbeddingProvider};
pub use profile::ProfileSynthesizer;
pub use recommender::RecommendationService;
pub use scoring::Scorer;
pub use similarity::SimilarityFinder;
