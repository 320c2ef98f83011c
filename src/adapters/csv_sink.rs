use crate::core::stats::{summarize, MetricSummary};
use crate::domain::model::{CleanedTable, ResultSet};
use crate::domain::ports::ResultsSink;
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const METRICS_DIR: &str = "performance_metrics";
pub const PERFORMANCE_FILE: &str = "table_extraction_performance.csv";
pub const STATISTICS_FILE: &str = "performance_summary.csv";
pub const EXTRACTION_SUMMARY_FILE: &str = "extraction_summary.csv";

const PERFORMANCE_HEADER: [&str; 6] = [
    "Filename",
    "Extraction Method",
    "tables_extracted",
    "extraction_time",
    "memory_usage",
    "cpu_usage",
];

#[derive(Debug, Serialize)]
struct PerformanceRow<'a> {
    filename: &'a str,
    method: &'a str,
    tables_extracted: usize,
    extraction_time: f64,
    memory_usage: f64,
    cpu_usage: f64,
}

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "PDF_Filename")]
    filename: &'a str,
    #[serde(rename = "Tables_Extracted")]
    tables: usize,
}

/// Writes one cleaned table: header row of column names, then the rendered cells.
pub fn write_table(path: &Path, table: &CleanedTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Per-backend `PDF_Filename, Tables_Extracted` summary.
pub fn write_extraction_summary(path: &Path, counts: &BTreeMap<String, usize>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(["PDF_Filename", "Tables_Extracted"])?;
    for (filename, tables) in counts {
        writer.serialize(SummaryRow {
            filename,
            tables: *tables,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Aggregate performance CSV plus per-method statistics under
/// `<output>/performance_metrics/`.
#[derive(Debug, Clone)]
pub struct CsvResultsSink {
    metrics_dir: PathBuf,
}

impl CsvResultsSink {
    pub fn new(output_root: impl AsRef<Path>) -> Self {
        Self {
            metrics_dir: output_root.as_ref().join(METRICS_DIR),
        }
    }

    pub fn performance_file(&self) -> PathBuf {
        self.metrics_dir.join(PERFORMANCE_FILE)
    }

    pub fn statistics_file(&self) -> PathBuf {
        self.metrics_dir.join(STATISTICS_FILE)
    }

    fn write_performance(&self, results: &ResultSet) -> Result<PathBuf> {
        let path = self.performance_file();
        // 沒有任何紀錄時仍輸出表頭
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(PERFORMANCE_HEADER)?;
        for record in results {
            writer.serialize(PerformanceRow {
                filename: &record.filename,
                method: &record.method,
                tables_extracted: record.tables_extracted,
                extraction_time: record.metrics.extraction_time,
                memory_usage: record.metrics.memory_usage,
                cpu_usage: record.metrics.cpu_usage,
            })?;
        }
        writer.flush()?;
        Ok(path)
    }

    fn write_statistics(&self, summaries: &[MetricSummary]) -> Result<PathBuf> {
        let path = self.statistics_file();
        let mut writer = csv::Writer::from_path(&path)?;
        for summary in summaries {
            writer.serialize(summary)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

impl ResultsSink for CsvResultsSink {
    fn persist(&self, results: &ResultSet) -> Result<String> {
        fs::create_dir_all(&self.metrics_dir)?;

        let performance = self.write_performance(results)?;
        tracing::info!("💾 Performance metrics saved to {}", performance.display());

        let summaries = summarize(results);
        for summary in &summaries {
            tracing::debug!(
                "{} {}: mean={} min={} max={} std={}",
                summary.method,
                summary.metric,
                summary.mean,
                summary.min,
                summary.max,
                summary.std
            );
        }
        if !summaries.is_empty() {
            let statistics = self.write_statistics(&summaries)?;
            tracing::info!("📈 Method statistics saved to {}", statistics.display());
        }

        Ok(performance.display().to_string())
    }
}
