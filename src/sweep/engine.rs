//! Sweep Engine
//!
//! A sweep deletes every record whose expiry precedes a cutoff. It walks the
//! table page by page:
//!
//! ```text
//!   cursor = None
//!   loop:
//!     page = scan_page(cutoff, cursor)
//!     for id in page.items:  delete(id)      <- one at a time
//!     stats += (page.scanned_count, deleted)
//!     cursor = page.next_cursor or stop
//! ```
//!
//! Deletes are issued serially, each one finishing before the next starts, so
//! a sweep never bursts past a rate-limited table's write capacity. Pages are
//! fetched only after the previous page's deletes are done. The walk is a
//! plain loop, so the number of pages is unbounded without growing the stack.
//!
//! ## Choosing the cutoff
//!
//! [`sweep_cutoff`] keeps the cutoff `touch_after + SAFETY_MARGIN` behind now.
//! A session inside its touch grace window may still hold an old `expires`
//! value; the margin keeps the sweep away from it and lets the table serve
//! scans from an eventually consistent read path.

use crate::expiry::duration_ms;
use crate::table::{RecordTable, TableError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Extra distance kept between the sweep cutoff and the touch grace window.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Computes the cutoff for a sweep starting at `now_ms`.
pub fn sweep_cutoff(now_ms: i64, touch_after: Duration) -> i64 {
    now_ms
        .saturating_sub(duration_ms(touch_after))
        .saturating_sub(duration_ms(SAFETY_MARGIN))
}

/// Counters accumulated over one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Raw rows the table inspected across all pages
    pub scanned: u64,
    /// Records deleted
    pub deleted: u64,
}

/// Deletes expired records from a table.
pub struct Sweeper<T: ?Sized> {
    table: Arc<T>,
}

impl<T: ?Sized> Clone for Sweeper<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Sweeper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper").finish_non_exhaustive()
    }
}

impl<T: RecordTable + ?Sized> Sweeper<T> {
    pub fn new(table: Arc<T>) -> Self {
        Self { table }
    }

    /// Runs one full sweep, deleting every record with `expires < cutoff`.
    ///
    /// Fails with the first scan or delete error; the remaining pages are
    /// left for the next sweep.
    pub async fn sweep(&self, cutoff: i64) -> Result<SweepStats, TableError> {
        let mut stats = SweepStats::default();
        let mut cursor = None;
        let mut pages = 0u64;

        loop {
            let page = self.table.scan_page(cutoff, cursor.take()).await?;
            pages += 1;

            let mut deleted = 0u64;
            for id in &page.items {
                self.table.delete(id).await?;
                trace!(id = %id, "Deleted expired session");
                deleted += 1;
            }

            stats.scanned += page.scanned_count;
            stats.deleted += deleted;

            debug!(
                page = pages,
                scanned = page.scanned_count,
                deleted = deleted,
                more = page.next_cursor.is_some(),
                "Swept page"
            );

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(stats),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::testing::{Call, ScriptedTable};
    use crate::table::{MemoryTable, PageCursor};
    use bytes::Bytes;

    #[test]
    fn test_cutoff_subtracts_grace_and_margin() {
        assert_eq!(sweep_cutoff(100_000, Duration::from_secs(10)), 85_000);
        assert_eq!(sweep_cutoff(100_000, Duration::ZERO), 95_000);
        assert_eq!(sweep_cutoff(i64::MIN + 1, Duration::from_secs(1)), i64::MIN);
    }

    #[tokio::test]
    async fn test_sweep_walks_every_page_in_order() {
        let table = Arc::new(
            ScriptedTable::new()
                .with_page(&["john", "paul"], 34, Some("brian"))
                .with_page(&[], 54, Some("yoko"))
                .with_page(&["george", "ringo"], 18, None),
        );

        let stats = Sweeper::new(Arc::clone(&table)).sweep(42).await.unwrap();

        assert_eq!(
            stats,
            SweepStats {
                scanned: 106,
                deleted: 4
            }
        );
        assert_eq!(
            table.calls(),
            vec![
                Call::Scan {
                    cutoff: 42,
                    cursor: None
                },
                Call::Delete("john".into()),
                Call::Delete("paul".into()),
                Call::Scan {
                    cutoff: 42,
                    cursor: Some(PageCursor::from("brian"))
                },
                Call::Scan {
                    cutoff: 42,
                    cursor: Some(PageCursor::from("yoko"))
                },
                Call::Delete("george".into()),
                Call::Delete("ringo".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_sweep_of_empty_table() {
        let table = Arc::new(ScriptedTable::new());
        let stats = Sweeper::new(Arc::clone(&table)).sweep(42).await.unwrap();
        assert_eq!(stats, SweepStats::default());
        assert_eq!(table.scans(), 1);
    }

    #[tokio::test]
    async fn test_scan_failure_fails_the_sweep() {
        let table = Arc::new(
            ScriptedTable::new().failing_scans(TableError::Throttled("scan".into())),
        );
        let result = Sweeper::new(Arc::clone(&table)).sweep(42).await;
        assert_eq!(result, Err(TableError::Throttled("scan".into())));
    }

    #[tokio::test]
    async fn test_delete_failure_stops_the_sweep() {
        let table = Arc::new(
            ScriptedTable::new()
                .with_page(&["john", "paul", "george"], 3, Some("next"))
                .with_page(&["ringo"], 1, None)
                .failing_on("paul"),
        );

        let result = Sweeper::new(Arc::clone(&table)).sweep(42).await;

        assert!(matches!(result, Err(TableError::Unavailable(_))));
        // Nothing after the failed delete is attempted
        assert_eq!(
            table.calls(),
            vec![
                Call::Scan {
                    cutoff: 42,
                    cursor: None
                },
                Call::Delete("john".into()),
                Call::Delete("paul".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_many_pages_do_not_grow_the_stack() {
        let mut scripted = ScriptedTable::new();
        for i in 0..20_000 {
            let cursor = format!("page-{}", i + 1);
            scripted = scripted.with_page(&["x"], 2, Some(cursor.as_str()));
        }
        let table = Arc::new(scripted.with_page(&[], 2, None));

        let stats = Sweeper::new(table).sweep(42).await.unwrap();
        assert_eq!(stats.scanned, 40_002);
        assert_eq!(stats.deleted, 20_000);
    }

    #[tokio::test]
    async fn test_sweep_memory_table() {
        let table = Arc::new(MemoryTable::new("sessions").with_page_limit(7));

        for i in 0..50 {
            let expires = if i % 5 == 0 { 10_000 } else { 500 };
            table
                .put(&format!("session-{i}"), expires, Bytes::from("{}"))
                .await
                .unwrap();
        }

        let stats = Sweeper::new(Arc::clone(&table)).sweep(1_000).await.unwrap();

        assert_eq!(stats.scanned, 50);
        assert_eq!(stats.deleted, 40);
        assert_eq!(table.len(), 10);
        for i in (0..50).step_by(5) {
            assert!(table.contains(&format!("session-{i}")));
        }
    }

    #[tokio::test]
    async fn test_sweep_leaves_records_at_the_cutoff() {
        let table = Arc::new(MemoryTable::new("sessions"));
        table.put("at", 1_000, Bytes::from("{}")).await.unwrap();
        table.put("before", 999, Bytes::from("{}")).await.unwrap();

        let stats = Sweeper::new(Arc::clone(&table)).sweep(1_000).await.unwrap();

        assert_eq!(stats.deleted, 1);
        assert!(table.contains("at"));
        assert!(!table.contains("before"));
    }
}
