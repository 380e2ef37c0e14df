use thiserror::Error;

/// Failures reported by a page content provider.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("page {index} not found (document has {page_count} pages)")]
    PageNotFound { index: usize, page_count: usize },

    #[error("failed to extract page {index}: {reason}")]
    Extraction { index: usize, reason: String },
}

impl PageError {
    /// Page index the failure refers to.
    pub fn index(&self) -> usize {
        match self {
            PageError::PageNotFound { index, .. } | PageError::Extraction { index, .. } => *index,
        }
    }

    pub fn extraction(index: usize, reason: impl Into<String>) -> Self {
        PageError::Extraction {
            index,
            reason: reason.into(),
        }
    }
}
