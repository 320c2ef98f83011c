use super::layout::{blocks, split_cells, to_raw};
use crate::adapters::pdf_text::LopdfTextSource;
use crate::domain::model::{DetectedTable, RawTable};
use crate::domain::ports::{PageTextSource, TableDetector};
use crate::utils::error::{BenchError, Result};
use std::path::Path;
use std::sync::Arc;

/// Page-by-page detection over extracted page text. A blank-line separated
/// block is a table when at least two of its lines hold two or more cells.
pub struct PageTextDetector {
    source: Arc<dyn PageTextSource>,
}

impl PageTextDetector {
    pub fn new(source: Arc<dyn PageTextSource>) -> Self {
        Self { source }
    }
}

impl Default for PageTextDetector {
    fn default() -> Self {
        Self::new(Arc::new(LopdfTextSource))
    }
}

impl TableDetector for PageTextDetector {
    fn name(&self) -> &str {
        "page_text"
    }

    fn page_oriented(&self) -> bool {
        true
    }

    fn detect(&self, pdf: &Path) -> Result<Vec<Result<DetectedTable>>> {
        let pages = self.source.page_texts(pdf)?;

        let mut found = Vec::new();
        for page in pages {
            match page.text {
                Ok(text) => {
                    let tables = page_tables(&text);
                    if tables.is_empty() {
                        continue;
                    }
                    tracing::trace!("Page {}: {} candidate tables", page.number, tables.len());
                    found.extend(tables.into_iter().enumerate().map(|(i, table)| {
                        Ok(DetectedTable {
                            page: Some(page.number),
                            index: i + 1,
                            table,
                        })
                    }));
                }
                Err(e) => found.push(Err(BenchError::DetectionError {
                    message: format!("page {}: {}", page.number, e),
                })),
            }
        }

        Ok(found)
    }
}

pub fn page_tables(text: &str) -> Vec<RawTable> {
    blocks(text)
        .into_iter()
        .filter_map(|block| {
            let rows: Vec<Vec<String>> = block.iter().map(|line| split_cells(line)).collect();
            let tabular = rows.iter().filter(|row| row.len() >= 2).count();
            (tabular >= 2).then(|| to_raw(rows))
        })
        .collect()
}
