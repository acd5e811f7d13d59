//! Error types shared by the session store, the sweep engine and the scheduler.
//!
//! Three kinds of failure are kept apart:
//!
//! - **Table errors**: anything the backing store reports (missing table,
//!   throttling, service faults). These are passed through untouched.
//! - **Decode errors**: a stored record is well formed but its serialized
//!   content cannot be parsed. This is different from "no session".
//! - **Configuration errors**: raised while building a store, before any
//!   asynchronous work is started.

use crate::table::TableError;

/// Errors returned by session store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing table failed the request
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Stored session content could not be decoded
    #[error("corrupt session content: {0}")]
    Decode(#[from] serde_json::Error),

    /// The store was configured with invalid options
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, Error>;
