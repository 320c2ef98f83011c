use crate::adapters::csv_sink::CsvResultsSink;
use crate::app::backends;
use crate::core::cleaning::TableCleaner;
use crate::core::extraction::ExtractionBackend;
use crate::domain::model::{ExtractionJob, PerformanceRecord, ResultSet};
use crate::domain::ports::{ConfigProvider, ResultsSink};
use crate::utils::error::{BenchError, Result};
use crate::utils::monitor::PerformanceMonitor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Runs every (file, backend) job one after another under the performance
/// monitor and hands the collected records to the sink.
pub struct Orchestrator<K: ResultsSink> {
    backends: Vec<Arc<ExtractionBackend>>,
    monitor: PerformanceMonitor,
    sink: K,
    job_timeout: Option<Duration>,
}

impl Orchestrator<CsvResultsSink> {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let output_root = Path::new(config.output_path());
        let cleaner = TableCleaner::new(config.cleaning());
        let backends = backends::build_backends(config.backend_names(), &cleaner, output_root)?;
        let monitor = PerformanceMonitor::new(&config.monitor());

        Ok(Self::new(backends, monitor, CsvResultsSink::new(output_root))
            .with_job_timeout(config.job_timeout()))
    }
}

impl<K: ResultsSink> Orchestrator<K> {
    pub fn new(backends: Vec<Arc<ExtractionBackend>>, monitor: PerformanceMonitor, sink: K) -> Self {
        Self {
            backends,
            monitor,
            sink,
            job_timeout: None,
        }
    }

    /// With a deadline, a job that overruns is recorded as failed and the run
    /// moves on. Its worker thread keeps running detached until the detector
    /// returns, so its sampler can overlap the next job and raise that job's
    /// peaks; the file's count stays at zero in both summary and aggregate.
    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn backends(&self) -> &[Arc<ExtractionBackend>] {
        &self.backends
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub async fn run(&self, input_folder: impl AsRef<Path>) -> Result<ResultSet> {
        let input_folder = input_folder.as_ref();
        if !input_folder.is_dir() {
            return Err(BenchError::InputFolderMissing {
                path: input_folder.display().to_string(),
            });
        }

        let pdfs = discover_pdfs(input_folder)?;
        tracing::info!(
            "🚀 Benchmarking {} PDF files with {} backends",
            pdfs.len(),
            self.backends.len()
        );

        let mut results = ResultSet::default();
        for pdf in &pdfs {
            for backend in &self.backends {
                let job = ExtractionJob::new(pdf.clone(), backend.name());
                for record in self.run_job(&job, backend).await {
                    results.push(record);
                }
            }
        }

        for backend in &self.backends {
            match backend.write_summary() {
                Ok(path) => tracing::info!("📋 {} summary saved to {}", backend.name(), path.display()),
                Err(e) => tracing::error!("❌ Could not write {} summary: {}", backend.name(), e),
            }
        }

        let output = self.sink.persist(&results)?;
        tracing::info!(
            "✅ {} jobs finished, {} tables extracted, results in {}",
            results.len(),
            results.total_tables(),
            output
        );

        Ok(results)
    }

    async fn run_job(&self, job: &ExtractionJob, backend: &Arc<ExtractionBackend>) -> Vec<PerformanceRecord> {
        tracing::debug!("▶️ Starting job {}", job);

        let monitor = self.monitor.clone();
        let worker = Arc::clone(backend);
        let pdf = job.pdf.clone();
        let task = tokio::task::spawn_blocking(move || monitor.measure(|| worker.extract(&pdf)));

        let outcome = match self.job_timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined.map_err(BenchError::from),
                Err(_) => {
                    // 背景工作仍在執行；固定其計數為零，不讓它覆寫摘要
                    backend.abandon(&job.pdf);
                    Err(BenchError::JobTimeout {
                        job: job.to_string(),
                        seconds: limit.as_secs_f64(),
                    })
                }
            },
            None => task.await.map_err(BenchError::from),
        };

        match outcome {
            Ok((counts, metrics)) => counts
                .into_iter()
                .map(|(filename, tables_extracted)| {
                    tracing::info!(
                        "{} processed with {}: {} tables in {:.2}s",
                        filename,
                        job.backend,
                        tables_extracted,
                        metrics.extraction_time
                    );
                    PerformanceRecord {
                        filename,
                        method: job.backend.clone(),
                        tables_extracted,
                        metrics,
                    }
                })
                .collect(),
            Err(e) => {
                tracing::error!("❌ Job {} failed: {}", job, e);
                tracing::error!("💡 {}", e.recovery_suggestion());
                vec![PerformanceRecord::failed(job)]
            }
        }
    }
}

/// PDF files directly inside `folder`, by name. The extension check ignores case.
pub fn discover_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf && path.is_file() {
            pdfs.push(path);
        }
    }
    pdfs.sort();
    Ok(pdfs)
}
