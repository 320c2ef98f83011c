use super::layout::{blocks, to_raw};
use crate::adapters::pdf_text::LopdfTextSource;
use crate::domain::model::{DetectedTable, RawTable};
use crate::domain::ports::{PageTextSource, TableDetector};
use crate::utils::error::Result;
use std::path::Path;
use std::sync::Arc;

const RULINGS: [char; 3] = ['|', '│', '¦'];
const RULE_FILL: [char; 9] = ['-', '=', '+', '_', '─', '━', '┼', '├', '┤'];

/// Lattice detection: ruled lines (`|` delimited) form tables. Pages without
/// any ruling fall back to column-gutter detection per text block.
pub struct LatticeDetector {
    source: Arc<dyn PageTextSource>,
}

impl LatticeDetector {
    pub fn new(source: Arc<dyn PageTextSource>) -> Self {
        Self { source }
    }
}

impl Default for LatticeDetector {
    fn default() -> Self {
        Self::new(Arc::new(LopdfTextSource))
    }
}

impl TableDetector for LatticeDetector {
    fn name(&self) -> &str {
        "lattice"
    }

    fn detect(&self, pdf: &Path) -> Result<Vec<Result<DetectedTable>>> {
        let pages = self.source.page_texts(pdf)?;

        let mut found = Vec::new();
        let mut index = 0;
        for page in pages {
            let text = match page.text {
                Ok(text) => text,
                Err(e) => {
                    found.push(Err(e));
                    continue;
                }
            };
            for table in lattice_tables(&text) {
                index += 1;
                found.push(Ok(DetectedTable {
                    page: Some(page.number),
                    index,
                    table,
                }));
            }
        }

        Ok(found)
    }
}

pub fn lattice_tables(text: &str) -> Vec<RawTable> {
    if text.lines().any(is_ruled) {
        ruled_tables(text)
    } else {
        gutter_tables(text)
    }
}

fn is_ruled(line: &str) -> bool {
    line.contains(RULINGS) && split_ruled(line).len() >= 2
}

/// Border-only lines such as `+----+----+` separate rows inside a table.
fn is_border(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| RULE_FILL.contains(&c) || RULINGS.contains(&c) || c == ' ')
}

fn split_ruled(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix(RULINGS).unwrap_or(trimmed);
    let inner = inner.strip_suffix(RULINGS).unwrap_or(inner);
    inner.split(RULINGS).map(|cell| cell.trim().to_string()).collect()
}

fn ruled_tables(text: &str) -> Vec<RawTable> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        if is_border(line) {
            continue;
        }
        if is_ruled(line) {
            current.push(split_ruled(line));
        } else if !current.is_empty() {
            tables.push(to_raw(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        tables.push(to_raw(current));
    }

    tables
}

/// Within each block, character columns that are blank on every line are
/// gutters; the runs between them are the table columns.
fn gutter_tables(text: &str) -> Vec<RawTable> {
    blocks(text)
        .into_iter()
        .filter(|block| block.len() >= 2)
        .filter_map(|block| {
            let lines: Vec<Vec<char>> = block.iter().map(|line| line.chars().collect()).collect();
            let spans = column_spans(&lines);
            if spans.len() < 2 {
                return None;
            }

            let rows = lines
                .iter()
                .map(|line| {
                    spans
                        .iter()
                        .map(|&(start, end)| {
                            let end = end.min(line.len());
                            let start = start.min(end);
                            line[start..end].iter().collect::<String>().trim().to_string()
                        })
                        .collect()
                })
                .collect();
            Some(to_raw(rows))
        })
        .collect()
}

fn column_spans(lines: &[Vec<char>]) -> Vec<(usize, usize)> {
    let width = lines.iter().map(Vec::len).max().unwrap_or(0);
    let is_gutter = |col: usize| {
        lines
            .iter()
            .all(|line| line.get(col).map_or(true, |c| c.is_whitespace()))
    };

    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for col in 0..width {
        match (is_gutter(col), start) {
            (false, None) => start = Some(col),
            (true, Some(begin)) => {
                spans.push((begin, col));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push((begin, width));
    }

    spans
}
