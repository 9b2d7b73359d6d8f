//! Example: Talk extraction with validation feedback
//!
//! Extracts the title, speaker, links and technologies from a talk listing.
//! Links are checked structurally and technologies are judged by the model;
//! failed attempts are repaired with the collected errors until every check
//! passes or the attempt budget runs out.
//!
//! Run: `OPENAI_API_KEY=... cargo run -p rig-extract --example talk [path/to/listing.txt]`
//!
//! Set `RUST_LOG=rig_extract_core=debug` to watch each attempt.

use std::sync::Arc;

use rig::client::ProviderClient;
use rig_extract::prelude::*;
use rig_extract::talks;
use tracing_subscriber::EnvFilter;

const SAMPLE_LISTING: &str = r"
    Retrieval without the hype - Maria Santos

    Maria walks through building a RAG pipeline on top of Postgres and pgvector,
    what went wrong with the first LLM prototype, and how the team moved the
    embedding job onto k8s. Slides: https://example.org/slides/rag-without-hype
    Source code: https://github.com/example/rag-demo
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let document = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE_LISTING.to_string(),
    };

    // --- KEY CODE: Talk extraction ---
    let openai: rig::providers::openai::Client = rig::providers::openai::Client::from_env();
    let client = RigModelClient::with_config(
        openai,
        RigClientConfig::new()
            .with_preamble("You extract structured facts from talk listings.")
            .with_temperature(0.0),
    )?;

    let config = ExtractionConfig::default().with_max_retries(4);
    let controller = talks::talk_controller(Arc::new(client), config)?;
    let (talk, metrics) = talks::extract_talk(&controller, &document).await?;
    // --- END KEY CODE ---

    println!("Title:   {}", talk.title);
    println!("Speaker: {}", talk.speaker);
    for link in &talk.links {
        println!("Link:    {} ({})", link.url, link.description);
    }
    for tech in &talk.technologies {
        println!("Tech:    {tech}");
    }
    println!(
        "\n{} attempts, {:?}, ~{} input / ~{} output tokens",
        metrics.total_attempts,
        metrics.wall_time,
        metrics.estimated_input_tokens,
        metrics.estimated_output_tokens
    );

    Ok(())
}
