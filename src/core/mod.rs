// Public modules
pub mod build;
pub mod config;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod provision;
pub mod publish;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
