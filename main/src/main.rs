mod args;

use std::sync::Arc;

use anyhow::Context;
use answer_pipeline::AnswerPipeline;
use args::{Cli, Command};
use clap::Parser;
use common::{storage::corpus::load_documents, utils::config::get_config};
use retrieval_pipeline::{CorpusIndex, RetrievalConfig};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Set up tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let cli = Cli::parse();

    let mut config = get_config().context("failed to load configuration")?;
    if let Some(corpus) = cli.corpus.clone() {
        config.corpus_path = Some(corpus);
    }
    if config.openai_api_key.trim().is_empty() {
        warn!("OPENAI_API_KEY is not set; answers will come from the static fallback");
    }

    // Build the index once; it is shared read-only afterwards.
    let retrieval = RetrievalConfig::from_app_config(&config);
    let (documents, source) = load_documents(&config);
    let index = match CorpusIndex::build(documents, source, &retrieval.vectorizer) {
        Ok(index) => index,
        Err(err) => {
            warn!(error = %err, "Corpus index build failed; using built-in documents");
            CorpusIndex::build_fallback(&retrieval.vectorizer)
                .context("failed to build fallback corpus index")?
        }
    };
    info!(
        documents = index.len(),
        vocabulary = index.vocabulary_len(),
        source = %index.source(),
        "Corpus index ready"
    );

    let pipeline = AnswerPipeline::new(Arc::new(index), &config);

    match cli.command {
        Command::Ask { message, trace } => {
            let message = message.join(" ");
            if trace {
                let outcome = pipeline.answer_with_trace(&message).await;
                println!(
                    "{}",
                    serde_json::to_string_pretty(&outcome).context("failed to encode trace")?
                );
            } else {
                println!("{}", pipeline.answer(&message).await);
            }
        }
        Command::Debug { query, k } => {
            let diagnostics = pipeline.diagnose(&query.join(" "), k);
            println!(
                "{}",
                serde_json::to_string_pretty(&diagnostics)
                    .context("failed to encode retrieval diagnostics")?
            );
        }
        Command::Image { path, prompt } => {
            let reply = pipeline
                .analyze_image_file(&path, prompt.as_deref())
                .await;
            println!("{reply}");
        }
        Command::Health => {
            println!(
                "{}",
                serde_json::to_string_pretty(&pipeline.health())
                    .context("failed to encode health report")?
            );
        }
    }

    Ok(())
}
