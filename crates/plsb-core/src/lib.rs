//! PLSB Core Library
//!
//! Shared functionality for the PLSB personal finance dashboard:
//! - Data sources for the monthly finance sheet (CSV file, spreadsheet export)
//! - Time-boxed dataset cache
//! - Monthly metrics and breakdown computation
//! - Dashboard configuration
//! - Presentation formatting helpers

pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod models;
pub mod source;

pub use config::{DashboardConfig, PageConfig, ServerSettings, SourceConfig};
pub use error::{Error, Result};
pub use metrics::{classify, combine, compute};
pub use models::{
    BreakdownSlice, Category, CategoryMetric, Dataset, Direction, MetricsView, MonthlyRecord,
};
pub use source::{
    parse_dataset, CachedDataset, CachedSource, CsvFileSource, DataSource, MemorySource,
    SheetSource,
};
