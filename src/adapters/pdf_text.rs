use crate::domain::ports::{PageText, PageTextSource};
use crate::utils::error::{BenchError, Result};
use lopdf::Document;
use std::path::Path;

/// Page text through `lopdf`. Loading failures fail the whole file; a page
/// whose content cannot be decoded only fails that page.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfTextSource;

impl PageTextSource for LopdfTextSource {
    fn page_texts(&self, pdf: &Path) -> Result<Vec<PageText>> {
        let document = Document::load(pdf)?;
        let pages = document.get_pages();
        tracing::debug!("Loaded {} ({} pages)", pdf.display(), pages.len());

        Ok(pages
            .keys()
            .map(|&number| PageText {
                number,
                text: document.extract_text(&[number]).map_err(BenchError::from),
            })
            .collect())
    }
}
