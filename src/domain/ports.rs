use crate::core::cleaning::CleaningConfig;
use crate::domain::model::{DetectedTable, ResultSet};
use crate::utils::error::Result;
use crate::utils::monitor::MonitorConfig;
use std::path::Path;
use std::time::Duration;

/// Raw-table detection heuristic of one extraction backend.
///
/// The outer `Result` is a whole-file failure; inner errors are failures of a
/// single page or table and must not hide the tables found elsewhere.
pub trait TableDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Page-oriented detectors name their outputs by page and per-page index.
    fn page_oriented(&self) -> bool {
        false
    }

    fn detect(&self, pdf: &Path) -> Result<Vec<Result<DetectedTable>>>;
}

pub struct PageText {
    pub number: u32,
    pub text: Result<String>,
}

/// Source of per-page text for a document; PDF decoding lives behind this seam.
pub trait PageTextSource: Send + Sync {
    fn page_texts(&self, pdf: &Path) -> Result<Vec<PageText>>;
}

pub trait ResultsSink: Send + Sync {
    /// Writes the run's aggregate outputs and returns the main output path.
    fn persist(&self, results: &ResultSet) -> Result<String>;
}

pub trait ConfigProvider: Send + Sync {
    fn input_folder(&self) -> &str;
    fn output_path(&self) -> &str;
    fn backend_names(&self) -> &[String];
    fn cleaning(&self) -> CleaningConfig;
    fn monitor(&self) -> MonitorConfig;
    fn job_timeout(&self) -> Option<Duration>;
}
