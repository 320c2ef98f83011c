pub mod lattice;
pub mod layout;
pub mod page_text;
pub mod stream;

pub use lattice::LatticeDetector;
pub use page_text::PageTextDetector;
pub use stream::StreamDetector;

use crate::core::cleaning::TableCleaner;
use crate::core::extraction::ExtractionBackend;
use crate::domain::ports::TableDetector;
use crate::utils::error::{BenchError, Result};
use std::path::Path;
use std::sync::Arc;

/// Registered backends, in default run order.
pub const BACKEND_NAMES: [&str; 3] = ["stream", "lattice", "page_text"];

pub fn default_backend_names() -> Vec<String> {
    BACKEND_NAMES.iter().map(|name| name.to_string()).collect()
}

pub fn detector_for(name: &str) -> Result<Box<dyn TableDetector>> {
    match name {
        "stream" => Ok(Box::new(StreamDetector::default())),
        "lattice" => Ok(Box::new(LatticeDetector::default())),
        "page_text" => Ok(Box::new(PageTextDetector::default())),
        other => Err(BenchError::InvalidConfigValueError {
            field: "backends".to_string(),
            value: other.to_string(),
            reason: format!("Unknown backend. Known backends: {}", BACKEND_NAMES.join(", ")),
        }),
    }
}

pub fn build_backends(
    names: &[String],
    cleaner: &TableCleaner,
    output_root: &Path,
) -> Result<Vec<Arc<ExtractionBackend>>> {
    names
        .iter()
        .map(|name| {
            let detector = detector_for(name)?;
            Ok(Arc::new(ExtractionBackend::new(
                detector,
                cleaner.clone(),
                output_root,
            )))
        })
        .collect()
}
