//! Binh Dinh Travel Assistant Core Library
//!
//! Foundational utilities shared across the workspace:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Cooperative cancellation

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
