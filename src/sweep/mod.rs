//! Sweep Module
//!
//! Active expiry for the session table: a paginated scan-and-delete sweep and
//! the timer loop that runs it.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────┐
//! │     CleanupScheduler      │   Idle ──timer──> Sweeping ──done──> Idle
//! │  (Background Tokio Task)  │
//! └─────────────┬─────────────┘
//!               │ sweep(now - touch_after - SAFETY_MARGIN)
//!               ▼
//! ┌───────────────────────────┐
//! │         Sweeper           │   scan_page ─> delete, delete, ... ─> scan_page ...
//! └─────────────┬─────────────┘
//!               ▼
//!          RecordTable
//! ```

pub mod engine;
pub mod scheduler;

// Re-export commonly used types
pub use engine::{sweep_cutoff, SweepStats, Sweeper, SAFETY_MARGIN};
pub use scheduler::{CleanupScheduler, CleanupTask, SchedulerState, Timer, TokioTimer};
