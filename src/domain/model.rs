use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub type Cell = Option<String>;

/// Cell grid as a backend reports it. The first row is the header candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub cells: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(cells: Vec<Vec<Cell>>) -> Self {
        Self { cells }
    }

    /// 每個字串都視為存在的儲存格，空白與否交給清理流程判斷
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = rows
            .into_iter()
            .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
            .collect();
        Self { cells }
    }

    /// Rows below the header row.
    pub fn data_rows(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }

    pub fn columns(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .flatten()
            .all(|cell| cell.as_deref().map_or(true, |value| value.trim().is_empty()))
    }
}

/// A raw table located by a detector. `page` is set only by page-oriented detectors;
/// `index` is 1-based within the page, or within the document otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedTable {
    pub page: Option<u32>,
    pub index: usize,
    pub table: RawTable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Number(Vec<Option<f64>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(values) => values.len(),
            ColumnData::Number(values) => values.len(),
            ColumnData::Date(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// CSV 輸出用的文字表示；缺值為 None
    pub fn render(&self, row: usize) -> Option<String> {
        match self {
            ColumnData::Text(values) => values.get(row).cloned().flatten(),
            ColumnData::Number(values) => values.get(row).copied().flatten().map(|n| n.to_string()),
            ColumnData::Date(values) => values
                .get(row)
                .copied()
                .flatten()
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Output of the cleaning pipeline. Only the cleaner builds these, so every
/// instance has unique column names and more than one row and column.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    columns: Vec<Column>,
}

impl CleanedTable {
    pub(crate) fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|column| column.data.len()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Rendered data rows, missing cells as empty strings.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        (0..self.row_count()).map(move |row| {
            self.columns
                .iter()
                .map(|column| column.data.render(row).unwrap_or_default())
                .collect()
        })
    }

    /// Header row followed by the rendered cells, ready to be cleaned again.
    pub fn to_raw(&self) -> RawTable {
        let header = self
            .columns
            .iter()
            .map(|column| Some(column.name.clone()))
            .collect();
        let mut cells = vec![header];
        for row in 0..self.row_count() {
            cells.push(self.columns.iter().map(|column| column.data.render(row)).collect());
        }
        RawTable { cells }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    pub pdf: PathBuf,
    pub backend: String,
}

impl ExtractionJob {
    pub fn new(pdf: impl Into<PathBuf>, backend: impl Into<String>) -> Self {
        Self {
            pdf: pdf.into(),
            backend: backend.into(),
        }
    }

    pub fn filename(&self) -> String {
        file_name(&self.pdf)
    }
}

impl fmt::Display for ExtractionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} × {}", self.filename(), self.backend)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Elapsed seconds, peak memory in MB and peak CPU percent of one job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub extraction_time: f64,
    pub memory_usage: f64,
    pub cpu_usage: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub filename: String,
    pub method: String,
    pub tables_extracted: usize,
    pub metrics: PerformanceMetrics,
}

impl PerformanceRecord {
    /// 失敗的工作：零表格、零指標
    pub fn failed(job: &ExtractionJob) -> Self {
        Self {
            filename: job.filename(),
            method: job.backend.clone(),
            tables_extracted: 0,
            metrics: PerformanceMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    records: Vec<PerformanceRecord>,
}

impl ResultSet {
    pub fn push(&mut self, record: PerformanceRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn find(&self, filename: &str, method: &str) -> Option<&PerformanceRecord> {
        self.records
            .iter()
            .find(|record| record.filename == filename && record.method == method)
    }

    pub fn total_tables(&self) -> usize {
        self.records.iter().map(|record| record.tables_extracted).sum()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a PerformanceRecord;
    type IntoIter = std::slice::Iter<'a, PerformanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
