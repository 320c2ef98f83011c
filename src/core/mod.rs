pub mod cleaning;
pub mod extraction;
pub mod orchestrator;
pub mod stats;

pub use crate::domain::model::{CleanedTable, PerformanceRecord, RawTable, ResultSet};
pub use crate::domain::ports::{ConfigProvider, ResultsSink, TableDetector};
pub use crate::utils::error::Result;
