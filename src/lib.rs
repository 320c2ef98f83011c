pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::csv_sink::CsvResultsSink;
pub use config::toml_config::TomlConfig;
pub use core::{
    cleaning::TableCleaner, extraction::ExtractionBackend, orchestrator::Orchestrator,
};
pub use utils::error::{BenchError, Result};
pub use utils::monitor::PerformanceMonitor;
