//! Record Table Module
//!
//! This module defines the keyed record service that session records live in
//! and ships an in-memory implementation of it.
//!
//! ## Operations
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      RecordTable                           │
//! │                                                            │
//! │  describe / create        lifecycle, provisioning          │
//! │  get                      strongly consistent point read   │
//! │  put                      full upsert                      │
//! │  set_expires              partial update of `expires`      │
//! │  delete                   idempotent delete                │
//! │  scan_page(cutoff, cur)   bounded filtered scan            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any database can back a session store by implementing [`RecordTable`].
//! [`MemoryTable`] is the reference implementation.

pub mod memory;
pub mod record;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use memory::{MemoryTable, TableStats, DEFAULT_PAGE_LIMIT};
pub use record::{PageCursor, RawRecord, RecordTable, ScanPage, TableError, TableStatus};
