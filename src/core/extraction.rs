use crate::adapters::csv_sink::{write_extraction_summary, write_table, EXTRACTION_SUMMARY_FILE};
use crate::core::cleaning::TableCleaner;
use crate::domain::model::{file_name, DetectedTable};
use crate::domain::ports::TableDetector;
use crate::utils::error::{BenchError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Per-file counts, plus the files whose job was given up on. An abandoned
/// file stays at zero whatever its worker reports later.
#[derive(Debug, Default)]
struct Ledger {
    counts: BTreeMap<String, usize>,
    abandoned: BTreeSet<String>,
}

impl Ledger {
    fn record(&mut self, filename: &str, count: usize) {
        if !self.abandoned.contains(filename) {
            self.counts.insert(filename.to_string(), count);
        }
    }
}

/// One extraction backend: a detection heuristic plus the shared cleaning
/// pipeline, persisting every accepted table under `<output>/<backend>/<stem>/`.
pub struct ExtractionBackend {
    detector: Box<dyn TableDetector>,
    cleaner: TableCleaner,
    output_dir: PathBuf,
    ledger: Mutex<Ledger>,
}

impl ExtractionBackend {
    pub fn new(
        detector: Box<dyn TableDetector>,
        cleaner: TableCleaner,
        output_root: impl AsRef<Path>,
    ) -> Self {
        let output_dir = output_root.as_ref().join(detector.name());
        Self {
            detector,
            cleaner,
            output_dir,
            ledger: Mutex::new(Ledger::default()),
        }
    }

    pub fn name(&self) -> &str {
        self.detector.name()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extracts, cleans and persists the tables of one file. Never fails:
    /// any file, page or table failure is logged and counts as zero.
    pub fn extract(&self, pdf: &Path) -> BTreeMap<String, usize> {
        let filename = file_name(pdf);
        self.ledger().record(&filename, 0);

        let count = match self.extract_file(pdf, &filename) {
            Ok(count) => {
                tracing::info!(
                    "✅ {} extracted {} tables from {}",
                    self.name(),
                    count,
                    filename
                );
                count
            }
            Err(e) => {
                tracing::warn!("❌ {} failed on {}: {}", self.name(), filename, e);
                0
            }
        };

        self.ledger().record(&filename, count);
        BTreeMap::from([(filename, count)])
    }

    /// Pins `pdf` at zero tables. A worker still running on it stops writing
    /// tables at the next one and cannot change the count afterwards.
    pub fn abandon(&self, pdf: &Path) {
        let filename = file_name(pdf);
        let mut ledger = self.ledger();
        ledger.counts.insert(filename.clone(), 0);
        ledger.abandoned.insert(filename);
    }

    fn is_abandoned(&self, filename: &str) -> bool {
        self.ledger().abandoned.contains(filename)
    }

    fn extract_file(&self, pdf: &Path, filename: &str) -> Result<usize> {
        let stem = pdf
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| filename.to_string());
        let table_dir = self.output_dir.join(stem);
        fs::create_dir_all(&table_dir)?;

        let detected = self.detector.detect(pdf)?;
        tracing::debug!("{} detected {} candidate tables", self.name(), detected.len());

        let mut accepted = 0;
        for candidate in detected {
            if self.is_abandoned(filename) {
                return Err(BenchError::DetectionError {
                    message: "job abandoned after its deadline".to_string(),
                });
            }

            let candidate = match candidate {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::warn!("⚠️ {} skipped part of {}: {}", self.name(), pdf.display(), e);
                    continue;
                }
            };

            if candidate.table.is_empty() {
                tracing::debug!("Skipping empty table {}", describe(&candidate));
                continue;
            }

            let Some(cleaned) = self.cleaner.clean(&candidate.table) else {
                tracing::debug!("Discarded table {} after cleaning", describe(&candidate));
                continue;
            };

            let next = accepted + 1;
            let output = table_dir.join(self.output_name(&candidate, next));
            match write_table(&output, &cleaned) {
                Ok(()) => accepted = next,
                Err(e) => tracing::warn!("⚠️ Could not write {}: {}", output.display(), e),
            }
        }

        Ok(accepted)
    }

    fn output_name(&self, candidate: &DetectedTable, sequence: usize) -> String {
        match candidate.page {
            Some(page) if self.detector.page_oriented() => {
                format!("page_{}_table_{}.csv", page, candidate.index)
            }
            _ => format!("table_{}.csv", sequence),
        }
    }

    /// Per-file counts recorded so far by this backend.
    pub fn summary(&self) -> BTreeMap<String, usize> {
        self.ledger().counts.clone()
    }

    /// Writes `<output>/<backend>/extraction_summary.csv`.
    pub fn write_summary(&self) -> Result<PathBuf> {
        let path = self.output_dir.join(EXTRACTION_SUMMARY_FILE);
        write_extraction_summary(&path, &self.summary())?;
        Ok(path)
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // 帳本只有整數計數，中毒後內容仍可用
        self.ledger
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn describe(candidate: &DetectedTable) -> String {
    match candidate.page {
        Some(page) => format!("{} on page {}", candidate.index, page),
        None => candidate.index.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::RawTable;
    use crate::utils::error::BenchError;
    use tempfile::TempDir;

    struct FixtureDetector {
        name: &'static str,
        page_oriented: bool,
        fail_file: bool,
    }

    impl FixtureDetector {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                page_oriented: false,
                fail_file: false,
            }
        }
    }

    fn good_table() -> RawTable {
        RawTable::from_rows([
            ["Metric", "2022", "2023"],
            ["Energy", "1,200", "1,150"],
            ["Water", "300", "280"],
        ])
    }

    impl TableDetector for FixtureDetector {
        fn name(&self) -> &str {
            self.name
        }

        fn page_oriented(&self) -> bool {
            self.page_oriented
        }

        fn detect(&self, _pdf: &Path) -> Result<Vec<Result<DetectedTable>>> {
            if self.fail_file {
                return Err(BenchError::DetectionError {
                    message: "unreadable document".to_string(),
                });
            }
            Ok(vec![
                Ok(DetectedTable {
                    page: Some(1),
                    index: 1,
                    table: good_table(),
                }),
                Ok(DetectedTable {
                    page: Some(1),
                    index: 2,
                    table: RawTable::from_rows([["only"], ["one"]]),
                }),
                Err(BenchError::DetectionError {
                    message: "page 2 could not be decoded".to_string(),
                }),
                Ok(DetectedTable {
                    page: Some(3),
                    index: 1,
                    table: RawTable::from_rows([["", ""], ["  ", ""]]),
                }),
                Ok(DetectedTable {
                    page: Some(3),
                    index: 2,
                    table: good_table(),
                }),
            ])
        }
    }

    #[test]
    fn test_extract_counts_and_persists_accepted_tables() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ExtractionBackend::new(
            Box::new(FixtureDetector::new("stream")),
            TableCleaner::default(),
            temp_dir.path(),
        );

        let counts = backend.extract(Path::new("/reports/annual_2023.pdf"));

        assert_eq!(counts.get("annual_2023.pdf"), Some(&2));
        let dir = temp_dir.path().join("stream").join("annual_2023");
        assert!(dir.join("table_1.csv").exists());
        assert!(dir.join("table_2.csv").exists());
        assert!(!dir.join("table_3.csv").exists());
    }

    #[test]
    fn test_page_oriented_names_include_page_and_index() {
        let temp_dir = TempDir::new().unwrap();
        let detector = FixtureDetector {
            page_oriented: true,
            ..FixtureDetector::new("page_text")
        };
        let backend =
            ExtractionBackend::new(Box::new(detector), TableCleaner::default(), temp_dir.path());

        backend.extract(Path::new("report.PDF"));

        let dir = temp_dir.path().join("page_text").join("report");
        assert!(dir.join("page_1_table_1.csv").exists());
        assert!(dir.join("page_3_table_2.csv").exists());
        assert!(!dir.join("page_1_table_2.csv").exists());
    }

    #[test]
    fn test_whole_file_failure_counts_zero() {
        let temp_dir = TempDir::new().unwrap();
        let detector = FixtureDetector {
            fail_file: true,
            ..FixtureDetector::new("lattice")
        };
        let backend =
            ExtractionBackend::new(Box::new(detector), TableCleaner::default(), temp_dir.path());

        let counts = backend.extract(Path::new("broken.pdf"));

        assert_eq!(counts, BTreeMap::from([("broken.pdf".to_string(), 0)]));
        assert_eq!(backend.summary().get("broken.pdf"), Some(&0));
    }

    #[test]
    fn test_summary_matches_returned_counts() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ExtractionBackend::new(
            Box::new(FixtureDetector::new("stream")),
            TableCleaner::default(),
            temp_dir.path(),
        );

        let first = backend.extract(Path::new("a.pdf"));
        let second = backend.extract(Path::new("b.pdf"));
        let path = backend.write_summary().unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content, "PDF_Filename,Tables_Extracted\na.pdf,2\nb.pdf,2\n");
        assert_eq!(backend.summary().get("a.pdf"), first.get("a.pdf"));
        assert_eq!(backend.summary().get("b.pdf"), second.get("b.pdf"));
    }

    #[test]
    fn test_abandoned_file_stays_at_zero() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ExtractionBackend::new(
            Box::new(FixtureDetector::new("stream")),
            TableCleaner::default(),
            temp_dir.path(),
        );

        backend.abandon(Path::new("late.pdf"));
        let counts = backend.extract(Path::new("late.pdf"));

        assert_eq!(counts.get("late.pdf"), Some(&0));
        assert_eq!(backend.summary().get("late.pdf"), Some(&0));
        assert!(!temp_dir.path().join("stream/late/table_1.csv").exists());

        backend.extract(Path::new("other.pdf"));
        assert_eq!(backend.summary().get("other.pdf"), Some(&2));
    }
}
