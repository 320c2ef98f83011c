//! Table normalization: raw cell grid in, typed table or nothing out.
//!
//! Stages run in a fixed order, each feeding the next:
//! sparsity filter, header standardization, merged-cell repair,
//! duplicate removal, type coercion. A dimension guard runs before the
//! first stage and after the last. The stages are then rerun on the typed
//! output until it no longer changes, since coercion can make distinct
//! strings equal.

use crate::domain::model::{Cell, CleanedTable, Column, ColumnData, RawTable};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const PLACEHOLDER_PREFIX: &str = "Unnamed:";
const CURRENCY_CHARS: [char; 4] = ['$', '€', '£', ','];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Discard thresholds of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Rows and columns with a smaller share of present cells are dropped.
    pub min_present_ratio: f64,
    /// Data rows a table needs to be kept.
    pub min_rows: usize,
    pub min_columns: usize,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_present_ratio: 0.1,
            min_rows: 2,
            min_columns: 2,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableCleaner {
    config: CleaningConfig,
}

impl TableCleaner {
    pub fn new(config: CleaningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Returns `None` when the table is degenerate before or after cleaning.
    pub fn clean(&self, raw: &RawTable) -> Option<CleanedTable> {
        let mut table = self.clean_once(raw)?;
        // 型別轉換後不同字串可能變成同一值（"$1,200" 與 "1200"），
        // 重跑直到輸出不再改變。每次有變化的重跑至少移除一列或一欄，
        // 或補上首列的一格，所以次數有上限
        let passes = 2 * (table.row_count() + table.column_count());
        for _ in 0..passes {
            let again = self.clean_once(&table.to_raw())?;
            if again == table {
                break;
            }
            table = again;
        }
        Some(table)
    }

    fn clean_once(&self, raw: &RawTable) -> Option<CleanedTable> {
        let frame = Frame::from_raw(raw);
        if !self.has_shape(frame.height(), frame.width()) {
            tracing::trace!(
                "Discarding raw table of {}x{} before cleaning",
                frame.height(),
                frame.width()
            );
            return None;
        }

        let frame = self.drop_sparse(frame);
        let frame = standardize_headers(frame);
        let frame = repair_merged_cells(frame);
        let frame = drop_duplicate_rows(frame);
        let table = coerce_types(frame);

        if self.has_shape(table.row_count(), table.column_count()) {
            Some(table)
        } else {
            tracing::trace!(
                "Discarding table that collapsed to {}x{}",
                table.row_count(),
                table.column_count()
            );
            None
        }
    }

    fn has_shape(&self, rows: usize, columns: usize) -> bool {
        rows >= self.config.min_rows && columns >= self.config.min_columns
    }

    /// Stage 1: sparse rows, then sparse columns, then single-valued columns.
    fn drop_sparse(&self, mut frame: Frame) -> Frame {
        let ratio = self.config.min_present_ratio;

        let width = frame.width() as f64;
        frame
            .rows
            .retain(|row| row.iter().flatten().count() as f64 >= width * ratio);

        let height = frame.height() as f64;
        let keep: Vec<bool> = (0..frame.width())
            .map(|col| {
                let present: Vec<&str> = frame
                    .rows
                    .iter()
                    .filter_map(|row| row[col].as_deref())
                    .collect();
                let distinct: HashSet<&str> = present.iter().map(|value| value.trim()).collect();
                present.len() as f64 >= height * ratio && distinct.len() > 1
            })
            .collect();

        frame.retain_columns(&keep);
        frame
    }
}

/// Row-major working copy: one header cell per column, every row padded to width.
#[derive(Debug, Clone)]
struct Frame {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    fn from_raw(raw: &RawTable) -> Self {
        let width = raw.columns();
        let mut grid = raw.cells.iter().map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(normalize_cell).collect();
            cells.resize(width, None);
            cells
        });

        let headers = grid
            .next()
            .map(|header| {
                header
                    .into_iter()
                    .enumerate()
                    .map(|(index, cell)| {
                        cell.unwrap_or_else(|| format!("{} {}", PLACEHOLDER_PREFIX, index))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            headers,
            rows: grid.collect(),
        }
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    fn width(&self) -> usize {
        self.headers.len()
    }

    fn retain_columns(&mut self, keep: &[bool]) {
        self.headers = retain_by_mask(std::mem::take(&mut self.headers), keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), keep);
        }
    }
}

fn retain_by_mask<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(value, &kept)| kept.then_some(value))
        .collect()
}

/// Blank cells count as missing; the text itself is left untrimmed.
fn normalize_cell(cell: &Cell) -> Cell {
    cell.as_ref()
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

/// Stage 2
fn standardize_headers(mut frame: Frame) -> Frame {
    let names = frame
        .headers
        .iter()
        .enumerate()
        .map(|(index, header)| {
            let name = normalize_header(header);
            if name.is_empty() {
                format!("column_{}", index)
            } else {
                name
            }
        })
        .collect();
    frame.headers = deduplicate_names(names);
    frame
}

/// Trim, lowercase, whitespace runs to `_`, then keep only `[a-z0-9_]`.
pub fn normalize_header(header: &str) -> String {
    static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_]").unwrap());

    let lowered = header.trim().to_lowercase();
    let underscored = WHITESPACE.replace_all(&lowered, "_");
    DISALLOWED.replace_all(&underscored, "").into_owned()
}

/// Repeated names get `_1`, `_2`, ... suffixes; a suffix already taken by
/// another column is skipped.
pub fn deduplicate_names(names: Vec<String>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::with_capacity(names.len());
    let mut counters: HashMap<String, usize> = HashMap::new();

    names
        .into_iter()
        .map(|name| {
            if used.insert(name.clone()) {
                return name;
            }
            let counter = counters.entry(name.clone()).or_insert(0);
            loop {
                *counter += 1;
                let candidate = format!("{}_{}", name, counter);
                if used.insert(candidate.clone()) {
                    return candidate;
                }
            }
        })
        .collect()
}

/// Stage 3: merged header continuation in the first data row, then
/// vertically merged cells down every column.
fn repair_merged_cells(mut frame: Frame) -> Frame {
    if let Some(first) = frame.rows.first_mut() {
        let continues_header = first
            .iter()
            .any(|cell| cell.as_deref().map_or(true, is_placeholder));
        if continues_header {
            let mut previous: Option<String> = None;
            for cell in first.iter_mut() {
                match cell.as_deref() {
                    Some(value) if !is_placeholder(value) => previous = Some(value.to_string()),
                    _ => {
                        if let Some(value) = &previous {
                            *cell = Some(value.clone());
                        }
                    }
                }
            }
        }
    }

    for col in 0..frame.width() {
        let mut previous: Option<String> = None;
        for row in &mut frame.rows {
            match &row[col] {
                Some(value) => previous = Some(value.clone()),
                None => row[col] = previous.clone(),
            }
        }
    }

    frame
}

fn is_placeholder(value: &str) -> bool {
    value.trim_start().starts_with(PLACEHOLDER_PREFIX)
}

/// Stage 4: exact duplicates, then duplicates that differ only in
/// surrounding whitespace. First occurrence wins.
fn drop_duplicate_rows(mut frame: Frame) -> Frame {
    frame.rows = unique_rows(frame.rows);

    for row in &mut frame.rows {
        for cell in row.iter_mut() {
            if let Some(value) = cell {
                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_string();
                }
            }
        }
    }

    frame.rows = unique_rows(frame.rows);
    frame
}

fn unique_rows(rows: Vec<Vec<Cell>>) -> Vec<Vec<Cell>> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect()
}

/// Stage 5: numeric first, then `YYYY-MM-DD` dates, otherwise text.
fn coerce_types(frame: Frame) -> CleanedTable {
    let Frame { headers, rows } = frame;

    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(col, name)| {
            let values: Vec<Cell> = rows.iter().map(|row| row[col].clone()).collect();
            Column {
                name,
                data: coerce_column(values),
            }
        })
        .collect();

    CleanedTable::new(columns)
}

pub fn coerce_column(values: Vec<Cell>) -> ColumnData {
    if let Some(numbers) = parse_all(&values, parse_number) {
        return ColumnData::Number(numbers);
    }
    if let Some(dates) = parse_all(&values, parse_date) {
        return ColumnData::Date(dates);
    }
    ColumnData::Text(values)
}

/// All present values must parse; a column with no present value never does.
fn parse_all<T>(values: &[Cell], parse: fn(&str) -> Option<T>) -> Option<Vec<Option<T>>> {
    if values.iter().all(Option::is_none) {
        return None;
    }
    values
        .iter()
        .map(|cell| match cell {
            Some(value) => parse(value).map(Some),
            None => Some(None),
        })
        .collect()
}

pub fn parse_number(value: &str) -> Option<f64> {
    let stripped: String = value
        .chars()
        .filter(|c| !CURRENCY_CHARS.contains(c))
        .collect();
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }
    stripped.parse::<f64>().ok().filter(|number| number.is_finite())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
