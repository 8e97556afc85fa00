pub mod alerts;
pub mod config;
pub mod core;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod plugins;
pub mod scheduler;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use scheduler::{PollScheduler, RunOutcome};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
