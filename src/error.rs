//! Startup and infrastructure errors.
//!
//! These stop the binary (`main` prints them and exits 1) or, for `Store`,
//! are logged and swallowed by the aggregator. A failed launch is a
//! [`crate::launch::LaunchError`], and each collaborator keeps its own error
//! type next to its client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("draft store error: {0}")]
    Store(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
