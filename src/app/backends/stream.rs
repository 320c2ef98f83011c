use super::layout::{split_cells, to_raw};
use crate::adapters::pdf_text::LopdfTextSource;
use crate::domain::model::{DetectedTable, RawTable};
use crate::domain::ports::{PageTextSource, TableDetector};
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

/// Whitespace-stream detection: a table is a run of consecutive lines that
/// each split into at least two cells. Tables are numbered across the document.
pub struct StreamDetector {
    source: Arc<dyn PageTextSource>,
}

impl StreamDetector {
    pub fn new(source: Arc<dyn PageTextSource>) -> Self {
        Self { source }
    }
}

impl Default for StreamDetector {
    fn default() -> Self {
        Self::new(Arc::new(LopdfTextSource))
    }
}

impl TableDetector for StreamDetector {
    fn name(&self) -> &str {
        "stream"
    }

    fn detect(&self, pdf: &Path) -> Result<Vec<Result<DetectedTable>>> {
        let pages = self.source.page_texts(pdf)?;

        let mut found = Vec::new();
        let mut index = 0;
        for page in pages {
            match page.text {
                Ok(text) => {
                    for table in stream_tables(&text) {
                        index += 1;
                        found.push(Ok(DetectedTable {
                            page: Some(page.number),
                            index,
                            table,
                        }));
                    }
                }
                Err(e) => found.push(Err(e)),
            }
        }

        Ok(found)
    }
}

pub fn stream_tables(text: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            current.push(cells);
        } else if !current.is_empty() {
            tables.push(to_raw(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        tables.push(to_raw(current));
    }

    tables
}
