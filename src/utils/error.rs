use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("PDF parsing error: {0}")]
    PdfError(#[from] lopdf::Error),

    #[error("Extraction task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    #[error("Input folder not found: {path}")]
    InputFolderMissing { path: String },

    #[error("Job {job} exceeded its {seconds:.1}s deadline")]
    JobTimeout { job: String, seconds: f64 },

    #[error("Table detection error: {message}")]
    DetectionError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BenchError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BenchError::DetectionError { .. } | BenchError::PdfError(_) => ErrorSeverity::Low,
            BenchError::JobTimeout { .. } | BenchError::TaskError(_) => ErrorSeverity::Medium,
            BenchError::ConfigValidationError { .. }
            | BenchError::InvalidConfigValueError { .. }
            | BenchError::InputFolderMissing { .. } => ErrorSeverity::High,
            BenchError::CsvError(_) | BenchError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BenchError::InputFolderMissing { .. } => {
                "Check that --input points to an existing folder containing PDF files"
            }
            BenchError::ConfigValidationError { .. } | BenchError::InvalidConfigValueError { .. } => {
                "Fix the reported field in the TOML file or command line flags"
            }
            BenchError::JobTimeout { .. } => {
                "Raise job_timeout_secs or remove it to wait for slow backends"
            }
            BenchError::PdfError(_) | BenchError::DetectionError { .. } => {
                "The document may be encrypted, scanned or malformed; other files are unaffected"
            }
            BenchError::TaskError(_) => "A backend crashed; rerun with --verbose for details",
            BenchError::CsvError(_) | BenchError::IoError(_) => {
                "Check that the output folder is writable and has free space"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
