use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Zero-based page index in physical document order.
pub type PageIndex = usize;

/// Opaque reference to an image extracted from a page.
///
/// The segmentation engine never looks inside; only the oracle (via OCR) does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(PathBuf);

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Content of one page: its plain text and the images found on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub index: PageIndex,
    pub text: String,
    pub images: Vec<ImageRef>,
}

impl Page {
    pub fn new(index: PageIndex, text: impl Into<String>, images: Vec<ImageRef>) -> Self {
        Self {
            index,
            text: text.into(),
            images,
        }
    }

    /// A page carrying only text.
    pub fn text_only(index: PageIndex, text: impl Into<String>) -> Self {
        Self::new(index, text, Vec::new())
    }

    pub fn has_images(&self) -> bool {
        !self.images.is_empty()
    }
}
