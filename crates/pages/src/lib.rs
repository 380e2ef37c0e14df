//! Page content providers: where the segmentation engine gets page text and images from.

pub mod memory;
pub mod pdf;
pub mod provider;

pub use memory::InMemoryPages;
pub use pdf::{OpenError, PdfPageProvider};
pub use provider::PageProvider;
