//! Weekbank - a weekly work-unit tracker with banked-surplus carryover.
//!
//! This library provides the core functionality for the `wb` CLI tool and
//! its HTTP API: the banking-chain recalculation, the snapshot data model,
//! and pluggable storage backends for persisting state.

pub mod banking;
pub mod cli;
pub mod config;
pub mod models;
pub mod server;
pub mod sessions;
pub mod storage;

/// Library-level error type for Weekbank operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store write failed: {0}")]
    StoreWriteFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Weekbank operations.
pub type Result<T> = std::result::Result<T, Error>;
