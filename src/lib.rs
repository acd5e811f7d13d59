//! # FlashKV Sessions - Session Persistence over a Key-Value Table
//!
//! FlashKV Sessions stores web-session records in a key-value table and
//! keeps that table bounded by periodically sweeping out expired records.
//!
//! ## Features
//!
//! - **Pluggable Tables**: any store implementing [`table::RecordTable`] works
//! - **Touch Grace Window**: touches inside `touch_after` cost no write
//! - **Lazy + Active Expiry**: expired sessions vanish on read immediately and
//!   are physically deleted by a background sweep later
//! - **Gentle Sweeps**: pages are scanned and deleted strictly one call at a
//!   time, so a rate-limited table is never flooded
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          FlashKV Sessions                               │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐                                     │
//! │  │ Session     │───>│ Expiry      │──┐                                  │
//! │  │ Store       │    │ Policy      │  │                                  │
//! │  │ get/set/    │    └─────────────┘  │                                  │
//! │  │ touch/      │─────────────────────┤                                  │
//! │  │ destroy     │                     ▼                                  │
//! │  └─────────────┘          ┌──────────────────────────────────────────┐  │
//! │                           │              RecordTable                 │  │
//! │                           │  get · put · set_expires · delete · scan │  │
//! │                           └──────────────────────────────────────────┘  │
//! │                                      ▲                                  │
//! │                                      │ scan_page, delete                │
//! │                     ┌────────────────┴────────────────────────────────┐ │
//! │                     │    CleanupScheduler ──> Sweeper                 │ │
//! │                     │      (Background Tokio Task)                    │ │
//! │                     └─────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The request path and the sweep share the table but no in-process locks.
//! The table's per-key atomicity plus a sweep cutoff that trails "now" by the
//! touch grace window and a safety margin keep them from stepping on each other.
//!
//! ## Quick Start
//!
//! ```ignore
//! use flashkv_sessions::session::{Session, SessionBackend, SessionStore, StoreConfig};
//! use flashkv_sessions::table::MemoryTable;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> flashkv_sessions::Result<()> {
//!     let table = Arc::new(MemoryTable::new("sessions"));
//!     let config = StoreConfig::new("sessions")
//!         .with_ttl(Duration::from_secs(3600))
//!         .with_cleanup_interval(Duration::from_secs(60));
//!
//!     // Builds the store, arms the cleanup timer and connects to the table
//!     let store = SessionStore::builder(table, config).open().await?;
//!
//!     store.set("sid", &Session::new()).await?;
//!     let session = store.get("sid").await?;
//!     store.destroy("sid").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`table`]: the record table contract and an in-memory implementation
//! - [`expiry`]: clock and expiry policy
//! - [`sweep`]: the sweep engine and the cleanup scheduler
//! - [`session`]: the session store facade, configuration and observer hooks
//! - [`error`]: error types

pub mod error;
pub mod expiry;
pub mod session;
pub mod sweep;
pub mod table;

// Re-export commonly used types for convenience
pub use error::{Error, Result};
pub use expiry::{Clock, ExpiryPolicy, ManualClock, SystemClock};
pub use session::{
    Session, SessionBackend, SessionObserver, SessionStore, StoreConfig, StoreOptions, TouchMode,
};
pub use sweep::{sweep_cutoff, CleanupScheduler, SweepStats, Sweeper, SAFETY_MARGIN};
pub use table::{MemoryTable, RecordTable, TableError};

/// Version of FlashKV Sessions
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
