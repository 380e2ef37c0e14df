use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

use deckseg_core::config::OcrConfig;
use deckseg_core::ImageRef;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to run OCR command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("OCR command failed: {0}")]
    Failed(String),
    #[error("OCR timed out after {0:?}")]
    Timeout(Duration),
}

/// Turns an image into text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize(&self, image: &ImageRef) -> Result<String, OcrError>;
}

/// OCR disabled: every image yields no text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOcr;

#[async_trait]
impl OcrEngine for NoOcr {
    async fn recognize(&self, _image: &ImageRef) -> Result<String, OcrError> {
        Ok(String::new())
    }
}

/// Runs an external OCR program with the image path appended; text is read from stdout.
pub struct CommandOcr {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandOcr {
    pub fn new(argv: Vec<String>, timeout: Duration) -> Option<Self> {
        let mut argv = argv.into_iter();
        let program = argv.next()?;
        Some(Self {
            program,
            args: argv.collect(),
            timeout,
        })
    }

    /// `None` when `OCR_COMMAND` is unset. Each image gets `OCR_TIMEOUT_SECS`.
    pub fn from_config(config: &OcrConfig) -> Option<Self> {
        Self::new(config.argv()?, config.timeout())
    }
}

#[async_trait]
impl OcrEngine for CommandOcr {
    async fn recognize(&self, image: &ImageRef) -> Result<String, OcrError> {
        debug!(program = %self.program, image = %image, "running OCR");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image.path())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| OcrError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Failed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// OCR every image and join the non-empty texts with blank lines.
///
/// Images that fail are logged and skipped.
pub async fn ocr_images(engine: &dyn OcrEngine, images: &[ImageRef]) -> String {
    let mut texts = Vec::new();
    for image in images {
        match engine.recognize(image).await {
            Ok(text) if !text.is_empty() => texts.push(text),
            Ok(_) => {}
            Err(e) => warn!(image = %image, error = %e, "OCR failed, skipping image"),
        }
    }
    texts.join("\n\n")
}
