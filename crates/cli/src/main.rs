mod cli;
mod report;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use deckseg_core::config::{self, Config};
use deckseg_llm::{CommandOcr, LlmPageSimilarity, LlmTopicSummarizer, NoOcr, OcrEngine};
use deckseg_pages::{PageProvider, PdfPageProvider};
use deckseg_segment::{
    CancellationToken, InheritTopic, ScopedTopic, SegmentationEngine, TopicRefiner,
};

use crate::cli::{CliArgs, SubtopicMode};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();

    config::load_dotenv();
    let mut config = Config::from_env();
    if let Some(max_pages) = args.max_pages {
        config.segmentation.max_pages_per_segment = max_pages;
    }
    if let Some(max_depth) = args.max_depth {
        config.segmentation.max_depth = max_depth;
    }
    if let Some(concurrency) = args.concurrency {
        config.segmentation.concurrency = concurrency.max(1);
    }
    config.log_summary();

    let provider = PdfPageProvider::open(&args.file, &config.pages)
        .with_context(|| format!("failed to open {}", args.file.display()))?;
    let page_count = provider.page_count();
    info!(file = %args.file.display(), pages = page_count, "deck opened");

    let ocr: Arc<dyn OcrEngine> = match CommandOcr::from_config(&config.ocr) {
        Some(ocr) if !args.no_ocr => Arc::new(ocr),
        _ => Arc::new(NoOcr),
    };

    let oracle = LlmPageSimilarity::from_config(&config, ocr)
        .context("failed to create LLM provider")?;

    let refiner: Arc<dyn TopicRefiner> = match args.subtopic {
        SubtopicMode::Inherit => Arc::new(InheritTopic),
        SubtopicMode::Scoped => Arc::new(ScopedTopic),
        SubtopicMode::Summarize => Arc::new(
            LlmTopicSummarizer::new(oracle.provider())
                .with_sampling(config.llm.temperature, config.llm.max_tokens),
        ),
    };

    let cancel = CancellationToken::new();
    let engine = SegmentationEngine::from_config(&config.segmentation)
        .with_topic_refiner(refiner)
        .with_cancellation(cancel.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            cancel.cancel();
        }
    });

    let result = engine
        .segment(
            page_count,
            &provider,
            &oracle,
            &args.theme_desc,
            config.segmentation.max_pages_per_segment,
        )
        .await
        .context("segmentation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        for line in report::render_lines(&result) {
            println!("{line}");
        }
    }

    Ok(())
}
