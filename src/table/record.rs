//! The Record Table Contract
//!
//! A session store never talks to a concrete database. It talks to a
//! [`RecordTable`]: a keyed record service offering point reads and writes
//! plus a cursor-paginated scan filtered on the expiry attribute.
//!
//! ## Record Shape
//!
//! ```text
//! ┌──────────────┬──────────────────┬────────────────────────────┐
//! │ id (key)     │ expires (i64 ms) │ content (serialized bytes) │
//! └──────────────┴──────────────────┴────────────────────────────┘
//! ```
//!
//! ## Consistency
//!
//! - `get` is a strongly consistent read.
//! - `scan_page` may use a cheaper, eventually consistent read path. The sweep
//!   cutoff keeps a safety margin behind "now" so stale scan results never
//!   target a record that is about to be refreshed.
//! - Every call is atomic per key. Nothing here coordinates across keys.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Errors reported by a backing table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    /// The table does not exist (not provisioned yet, or deleted)
    #[error("table not found: {0}")]
    TableNotFound(String),

    /// The store rejected the request because capacity was exceeded
    #[error("throttled: {0}")]
    Throttled(String),

    /// The store could not be reached
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The store failed while serving the request
    #[error("internal error: {0}")]
    Internal(String),
}

/// A record as read back from the table.
///
/// Rows missing either attribute are never turned into a `RawRecord`; the
/// table reports them as absent instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Absolute expiry in epoch milliseconds
    pub expires: i64,
    /// Serialized session content, exactly as it was written
    pub content: Bytes,
}

/// Opaque continuation token for a paginated scan.
///
/// Only the table that produced a cursor knows what it means.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageCursor {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// One page of a filtered scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Ids of records whose expiry precedes the cutoff
    pub items: Vec<String>,
    /// Raw rows inspected to build this page, before filtering.
    /// Usually larger than `items.len()`.
    pub scanned_count: u64,
    /// Where the next page starts; `None` on the final page
    pub next_cursor: Option<PageCursor>,
}

/// Result of describing the table during the store's lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    /// The table already existed
    Ready,
    /// The table was missing and has just been provisioned
    Created,
}

/// A keyed record service holding session records.
///
/// Implementations must be safe to share between request handlers and the
/// background cleanup task.
#[async_trait]
pub trait RecordTable: Send + Sync + 'static {
    /// Name of the keyspace, used in log messages.
    fn name(&self) -> &str;

    /// Checks that the table exists and is reachable.
    async fn describe(&self) -> Result<(), TableError>;

    /// Provisions the table. Called only when `describe` reported it missing
    /// and the store was configured to auto-create.
    async fn create(&self) -> Result<(), TableError>;

    /// Strongly consistent point read.
    ///
    /// Returns `Ok(None)` when the record does not exist or lacks its
    /// `expires` or `content` attribute.
    async fn get(&self, id: &str) -> Result<Option<RawRecord>, TableError>;

    /// Unconditional upsert of the whole record.
    async fn put(&self, id: &str, expires: i64, content: Bytes) -> Result<(), TableError>;

    /// Updates only the `expires` attribute, leaving `content` alone.
    async fn set_expires(&self, id: &str, expires: i64) -> Result<(), TableError>;

    /// Unconditional delete. Deleting a missing id succeeds.
    async fn delete(&self, id: &str) -> Result<(), TableError>;

    /// Fetches one bounded page of ids whose `expires < cutoff`.
    async fn scan_page(
        &self,
        cutoff: i64,
        cursor: Option<PageCursor>,
    ) -> Result<ScanPage, TableError>;
}
