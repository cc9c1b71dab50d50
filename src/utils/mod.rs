// src/utils/mod.rs
//! Common utilities
//!
//! - **Errors**: Crate-wide error type and result alias
//! - **Config**: Engine configuration with env overrides

pub mod config;
pub mod errors;

pub use config::ExecutorConfig;
pub use errors::{ExecutorError, Result};
