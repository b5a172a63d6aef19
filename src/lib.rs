pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod refresh;
pub mod service;
pub mod store;
pub mod utils;

pub use config::EngineConfig;
pub use error::EngineError;
pub use refresh::{RefreshCoordinator, RefreshHandle, RefreshOptions};
pub use service::{BulkOutcome, ReconciliationService, SkippedTarget};
