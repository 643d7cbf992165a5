pub mod alerts;
pub mod cache;
pub mod config;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use alerts::{AlertKind, AlertTracker, SignalAlert};
pub use cache::{CacheStats, CachedAnalyzer};
pub use config::ServiceConfig;
pub use service::{RefreshOutcome, SignalService};
pub use store::{normalize_symbol, sanitize_symbol, JsonFileStore, MemoryStore, ReportStore};
