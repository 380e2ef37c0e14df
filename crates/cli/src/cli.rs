use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Split a slide-deck PDF into runs of pages on the same micro-topic.
///
/// Each adjacent page pair is judged by the configured LLM; segments longer
/// than `--max-pages` are re-scanned under a narrower topic.
#[derive(Parser, Debug)]
#[command(name = "deckseg", about = "Micro-topic segmentation of slide decks")]
pub struct CliArgs {
    /// PDF file to segment
    #[arg(short, long)]
    pub file: PathBuf,

    /// What the whole deck is about; given to the LLM as the main topic
    #[arg(short = 'd', long)]
    pub theme_desc: String,

    /// Largest acceptable segment, in pages (overrides SEG_MAX_PAGES)
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Refinement depth bound (overrides SEG_MAX_DEPTH)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Maximum in-flight LLM calls (overrides SEG_CONCURRENCY)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// How oversized segments get their narrower topic
    #[arg(long, value_enum, default_value_t = SubtopicMode::Inherit, env = "DECKSEG_SUBTOPIC")]
    pub subtopic: SubtopicMode,

    /// Skip OCR of page images even when OCR_COMMAND is set
    #[arg(long)]
    pub no_ocr: bool,

    /// Print the full result as JSON instead of one line per segment
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubtopicMode {
    /// Re-scan under the deck topic unchanged
    Inherit,
    /// Deck topic plus a focus line naming the page range
    Scoped,
    /// Ask the LLM to name the segment's sub-topic
    Summarize,
}
