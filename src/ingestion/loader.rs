//! Document loading: turning an uploaded file into text segments

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::TextSegment;

/// Trait for extracting text from an uploaded document.
///
/// Loading is synchronous and CPU bound; callers run it on a blocking
/// thread.
pub trait DocumentLoader: Send + Sync {
    /// Extract text segments from the file at `path`
    fn load(&self, path: &Path) -> Result<Vec<TextSegment>>;
}

/// PDF loader producing one segment per page
#[derive(Debug, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<TextSegment>> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let pages = pdf_extract::extract_text_by_pages(path).map_err(|e| Error::Extraction {
            filename: filename.clone(),
            message: format!("Failed to parse PDF: {e}"),
        })?;

        let segments: Vec<TextSegment> = pages
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| TextSegment::page(i as u32 + 1, &text))
            .collect();

        if segments.is_empty() {
            return Err(Error::Extraction {
                filename,
                message: "No extractable text found in PDF".to_string(),
            });
        }

        Ok(segments)
    }
}
