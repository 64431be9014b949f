use anyhow::{bail, Context};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use recommendation_engine::config::LogFormat;
use recommendation_engine::{Config, Corpus, RecommendationService};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage:
  recommendation-engine feed <corpus.json> <viewer-id> [page]
  recommendation-engine similar <corpus.json> <post-id> [limit]";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load config")?;
    init_tracing(config.logging.log_format);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (command, corpus_path, id) = match args.as_slice() {
        [command, corpus_path, id, ..] => (command.as_str(), corpus_path, id),
        _ => bail!("{}", USAGE),
    };
    let extra = args.get(3);

    let corpus = Corpus::load(corpus_path)
        .with_context(|| format!("Failed to load corpus from {}", corpus_path))?;
    let service = RecommendationService::from_config(&config.embedding);

    let mut rng = match config.feed.random_seed {
        Some(seed) => {
            info!(seed, "Using fixed random seed");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let output = match command {
        "feed" => {
            let page = parse_or(extra, 1).context("Invalid page number")?;
            let viewer = corpus.viewer(id)?;
            let feed = service
                .personalized_feed(
                    &corpus.posts,
                    viewer,
                    page,
                    config.feed.page_size,
                    Utc::now(),
                    &mut rng,
                )
                .await;
            serde_json::to_string_pretty(&feed)?
        }
        "similar" => {
            let limit = parse_or(extra, config.feed.similar_limit).context("Invalid limit")?;
            let reference = corpus.post(id)?;
            let similar = service
                .similar_posts(reference, &corpus.approved_posts(), limit)
                .await;
            serde_json::to_string_pretty(&similar)?
        }
        other => bail!("unknown command '{}'\n{}", other, USAGE),
    };

    println!("{}", output);
    Ok(())
}

/// Logs go to stderr; stdout carries the JSON result.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (text, json) = match format {
        LogFormat::Text => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}

fn parse_or(arg: Option<&String>, default: usize) -> anyhow::Result<usize> {
    match arg {
        Some(raw) => Ok(raw.parse()?),
        None => Ok(default),
    }
}
