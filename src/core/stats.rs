use crate::domain::model::{PerformanceRecord, ResultSet};
use serde::Serialize;
use std::collections::BTreeMap;

type MetricFn = fn(&PerformanceRecord) -> f64;

const METRICS: [(&str, MetricFn); 4] = [
    ("tables_extracted", tables_extracted),
    ("extraction_time", extraction_time),
    ("memory_usage", memory_usage),
    ("cpu_usage", cpu_usage),
];

fn tables_extracted(record: &PerformanceRecord) -> f64 {
    record.tables_extracted as f64
}

fn extraction_time(record: &PerformanceRecord) -> f64 {
    record.metrics.extraction_time
}

fn memory_usage(record: &PerformanceRecord) -> f64 {
    record.metrics.memory_usage
}

fn cpu_usage(record: &PerformanceRecord) -> f64 {
    record.metrics.cpu_usage
}

/// Descriptive statistics of one metric for one extraction method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    #[serde(rename = "Extraction Method")]
    pub method: String,
    pub metric: String,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample standard deviation; 0 for a single observation.
    pub std: f64,
}

/// Groups records by method (sorted by name) and summarizes every metric,
/// rounded to four decimals.
pub fn summarize(results: &ResultSet) -> Vec<MetricSummary> {
    let mut by_method: BTreeMap<&str, Vec<&PerformanceRecord>> = BTreeMap::new();
    for record in results {
        by_method.entry(record.method.as_str()).or_default().push(record);
    }

    let mut summaries = Vec::with_capacity(by_method.len() * METRICS.len());
    for (method, records) in by_method {
        for (metric, value_of) in METRICS {
            let values: Vec<f64> = records.iter().map(|record| value_of(record)).collect();
            summaries.push(describe(method, metric, &values));
        }
    }
    summaries
}

fn describe(method: &str, metric: &str, values: &[f64]) -> MetricSummary {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std = if values.len() > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    MetricSummary {
        method: method.to_string(),
        metric: metric.to_string(),
        mean: round4(mean),
        min: round4(min),
        max: round4(max),
        std: round4(std),
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PerformanceMetrics;

    fn record(method: &str, tables: usize, time: f64) -> PerformanceRecord {
        PerformanceRecord {
            filename: format!("{}.pdf", tables),
            method: method.to_string(),
            tables_extracted: tables,
            metrics: PerformanceMetrics {
                extraction_time: time,
                memory_usage: 100.0,
                cpu_usage: 0.0,
            },
        }
    }

    #[test]
    fn test_summarize_groups_by_method() {
        let mut results = ResultSet::default();
        results.push(record("stream", 2, 1.0));
        results.push(record("lattice", 5, 0.25));
        results.push(record("stream", 4, 2.0));
        results.push(record("stream", 6, 3.0));

        let summaries = summarize(&results);

        assert_eq!(summaries.len(), 8);
        // BTreeMap 依名稱排序
        assert_eq!(summaries[0].method, "lattice");
        let tables = summaries
            .iter()
            .find(|s| s.method == "stream" && s.metric == "tables_extracted")
            .unwrap();
        assert_eq!(tables.mean, 4.0);
        assert_eq!(tables.min, 2.0);
        assert_eq!(tables.max, 6.0);
        assert_eq!(tables.std, 2.0);

        let single = summaries
            .iter()
            .find(|s| s.method == "lattice" && s.metric == "extraction_time")
            .unwrap();
        assert_eq!(single.mean, 0.25);
        assert_eq!(single.std, 0.0);
    }

    #[test]
    fn test_summarize_rounds_to_four_decimals() {
        let mut results = ResultSet::default();
        results.push(record("page_text", 1, 0.123456));
        results.push(record("page_text", 1, 0.654321));

        let time = summarize(&results)
            .into_iter()
            .find(|s| s.metric == "extraction_time")
            .unwrap();

        assert_eq!(time.min, 0.1235);
        assert_eq!(time.max, 0.6543);
    }

    #[test]
    fn test_summarize_empty() {
        assert!(summarize(&ResultSet::default()).is_empty());
    }
}
