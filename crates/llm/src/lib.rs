pub mod ocr;
pub mod prompts;
pub mod provider;
pub mod providers;
pub mod similarity;
pub mod summarize;

pub use ocr::{CommandOcr, NoOcr, OcrEngine, OcrError};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
pub use similarity::LlmPageSimilarity;
pub use summarize::LlmTopicSummarizer;
