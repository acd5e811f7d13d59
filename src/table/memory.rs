//! Sharded In-Memory Record Table
//!
//! `MemoryTable` is a [`RecordTable`] that lives entirely in process memory.
//! It backs the demo daemon, the benchmarks and most tests, and behaves like
//! a managed table in the ways the sweep relies on:
//!
//! 1. **Sharded Locks**: records are spread over independent shards so request
//!    traffic and the sweep rarely contend on the same lock.
//! 2. **Ordered Shards**: each shard is a `BTreeMap`, which gives scans a stable
//!    order and makes a `(shard, last key)` pair a valid resume point.
//! 3. **Bounded Pages**: a scan inspects at most `page_limit` rows before it
//!    returns, whether or not any of them matched. `scanned_count` is the
//!    number of rows inspected, not the number of matches.
//! 4. **Attribute Rows**: a row may hold only some of its attributes (a
//!    partial update on a missing id creates one). Such rows read as absent.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       MemoryTable                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │            │
//! │  │ BTreeMap│ │ BTreeMap│ │ BTreeMap│ │ BTreeMap│            │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//!      scan order: shard 0 keys ascending, then shard 1, ...
//! ```

use crate::table::record::{PageCursor, RawRecord, RecordTable, ScanPage, TableError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::ops::Bound;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::trace;

/// Number of shards in the table.
const NUM_SHARDS: usize = 16;

/// Default number of rows a single scan page inspects.
pub const DEFAULT_PAGE_LIMIT: usize = 1000;

/// A stored row. Either attribute may be missing.
#[derive(Debug, Clone, Default)]
struct Row {
    expires: Option<i64>,
    content: Option<Bytes>,
}

impl Row {
    fn complete(&self) -> Option<RawRecord> {
        match (self.expires, &self.content) {
            (Some(expires), Some(content)) => Some(RawRecord {
                expires,
                content: content.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Shard {
    rows: RwLock<BTreeMap<String, Row>>,
}

/// Operation counters for a [`MemoryTable`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableStats {
    pub rows: u64,
    pub get_ops: u64,
    pub put_ops: u64,
    pub update_ops: u64,
    pub delete_ops: u64,
    pub scan_ops: u64,
}

/// An in-memory [`RecordTable`].
///
/// # Example
///
/// ```
/// use flashkv_sessions::table::{MemoryTable, RecordTable};
/// use bytes::Bytes;
///
/// # tokio_test::block_on(async {
/// let table = MemoryTable::new("sessions");
/// table.put("abc", 1_000, Bytes::from_static(b"{}")).await.unwrap();
///
/// let page = table.scan_page(2_000, None).await.unwrap();
/// assert_eq!(page.items, vec!["abc".to_string()]);
/// assert!(page.next_cursor.is_none());
/// # });
/// ```
pub struct MemoryTable {
    name: String,
    shards: Vec<Shard>,
    page_limit: usize,
    exists: AtomicBool,

    row_count: AtomicU64,
    get_count: AtomicU64,
    put_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    scan_count: AtomicU64,
}

impl std::fmt::Debug for MemoryTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTable")
            .field("name", &self.name)
            .field("shards", &self.shards.len())
            .field("page_limit", &self.page_limit)
            .field("exists", &self.exists.load(Ordering::Relaxed))
            .field("rows", &self.row_count.load(Ordering::Relaxed))
            .finish()
    }
}

fn poisoned<T>(_: PoisonError<T>) -> TableError {
    TableError::Internal("shard lock poisoned".to_string())
}

impl MemoryTable {
    /// Creates an empty, already provisioned table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shards: (0..NUM_SHARDS).map(|_| Shard::default()).collect(),
            page_limit: DEFAULT_PAGE_LIMIT,
            exists: AtomicBool::new(true),
            row_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            put_count: AtomicU64::new(0),
            update_count: AtomicU64::new(0),
            delete_count: AtomicU64::new(0),
            scan_count: AtomicU64::new(0),
        }
    }

    /// Creates a table that does not exist yet; every call fails with
    /// [`TableError::TableNotFound`] until [`RecordTable::create`] runs.
    pub fn unprovisioned(name: impl Into<String>) -> Self {
        let table = Self::new(name);
        table.exists.store(false, Ordering::Relaxed);
        table
    }

    /// Sets how many rows one scan page inspects. Clamped to at least one.
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    #[inline]
    fn shard_index(&self, id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        (hasher.finish() as usize) % NUM_SHARDS
    }

    fn ensure_exists(&self) -> Result<(), TableError> {
        if self.exists.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(TableError::TableNotFound(self.name.clone()))
        }
    }

    /// Writes a row with only the given attributes, replacing any existing row.
    ///
    /// Useful for reproducing partially written or legacy rows.
    pub fn insert_partial(
        &self,
        id: &str,
        expires: Option<i64>,
        content: Option<Bytes>,
    ) -> Result<(), TableError> {
        self.ensure_exists()?;
        let shard = &self.shards[self.shard_index(id)];
        let mut rows = shard.rows.write().map_err(poisoned)?;
        if rows
            .insert(id.to_string(), Row { expires, content })
            .is_none()
        {
            self.row_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Returns the stored expiry of a row regardless of whether it has passed.
    pub fn expires_of(&self, id: &str) -> Option<i64> {
        let shard = &self.shards[self.shard_index(id)];
        let rows = shard.rows.read().ok()?;
        rows.get(id).and_then(|row| row.expires)
    }

    /// Checks whether a row is physically present, complete or not.
    pub fn contains(&self, id: &str) -> bool {
        let shard = &self.shards[self.shard_index(id)];
        shard
            .rows
            .read()
            .map(|rows| rows.contains_key(id))
            .unwrap_or(false)
    }

    /// Returns the number of physically present rows.
    pub fn len(&self) -> u64 {
        self.row_count.load(Ordering::Relaxed)
    }

    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns operation counters.
    pub fn stats(&self) -> TableStats {
        TableStats {
            rows: self.row_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            put_ops: self.put_count.load(Ordering::Relaxed),
            update_ops: self.update_count.load(Ordering::Relaxed),
            delete_ops: self.delete_count.load(Ordering::Relaxed),
            scan_ops: self.scan_count.load(Ordering::Relaxed),
        }
    }

    fn encode_cursor(shard: usize, id: &str) -> PageCursor {
        PageCursor::new(format!("{shard}:{id}"))
    }

    fn decode_cursor(cursor: &PageCursor) -> Result<(usize, String), TableError> {
        let invalid = || TableError::Internal(format!("invalid scan cursor: {cursor}"));
        let (shard, id) = cursor.as_str().split_once(':').ok_or_else(invalid)?;
        let shard: usize = shard.parse().map_err(|_| invalid())?;
        if shard >= NUM_SHARDS {
            return Err(invalid());
        }
        Ok((shard, id.to_string()))
    }
}

#[async_trait]
impl RecordTable for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn describe(&self) -> Result<(), TableError> {
        self.ensure_exists()
    }

    async fn create(&self) -> Result<(), TableError> {
        self.exists.store(true, Ordering::Release);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<RawRecord>, TableError> {
        self.ensure_exists()?;
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let shard = &self.shards[self.shard_index(id)];
        let rows = shard.rows.read().map_err(poisoned)?;
        Ok(rows.get(id).and_then(Row::complete))
    }

    async fn put(&self, id: &str, expires: i64, content: Bytes) -> Result<(), TableError> {
        self.ensure_exists()?;
        self.put_count.fetch_add(1, Ordering::Relaxed);

        let shard = &self.shards[self.shard_index(id)];
        let mut rows = shard.rows.write().map_err(poisoned)?;
        let row = Row {
            expires: Some(expires),
            content: Some(content),
        };
        if rows.insert(id.to_string(), row).is_none() {
            self.row_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn set_expires(&self, id: &str, expires: i64) -> Result<(), TableError> {
        self.ensure_exists()?;
        self.update_count.fetch_add(1, Ordering::Relaxed);

        let shard = &self.shards[self.shard_index(id)];
        let mut rows = shard.rows.write().map_err(poisoned)?;
        match rows.get_mut(id) {
            Some(row) => row.expires = Some(expires),
            None => {
                // Like a managed table's partial update, a missing id gets a
                // row holding only the updated attribute.
                rows.insert(
                    id.to_string(),
                    Row {
                        expires: Some(expires),
                        content: None,
                    },
                );
                self.row_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), TableError> {
        self.ensure_exists()?;
        self.delete_count.fetch_add(1, Ordering::Relaxed);

        let shard = &self.shards[self.shard_index(id)];
        let mut rows = shard.rows.write().map_err(poisoned)?;
        if rows.remove(id).is_some() {
            self.row_count.fetch_sub(1, Ordering::Relaxed);
            trace!(table = %self.name, id, "Deleted row");
        }
        Ok(())
    }

    async fn scan_page(
        &self,
        cutoff: i64,
        cursor: Option<PageCursor>,
    ) -> Result<ScanPage, TableError> {
        self.ensure_exists()?;
        self.scan_count.fetch_add(1, Ordering::Relaxed);

        let (start_shard, resume_after) = match cursor {
            Some(ref cursor) => {
                let (shard, id) = Self::decode_cursor(cursor)?;
                (shard, Some(id))
            }
            None => (0, None),
        };

        let mut page = ScanPage::default();
        let mut last_seen: Option<(usize, String)> = None;

        for shard_idx in start_shard..NUM_SHARDS {
            let rows = self.shards[shard_idx].rows.read().map_err(poisoned)?;

            let lower = match (&resume_after, shard_idx == start_shard) {
                (Some(id), true) => Bound::Excluded(id.as_str()),
                _ => Bound::Unbounded,
            };

            for (id, row) in rows.range::<str, _>((lower, Bound::Unbounded)) {
                // Stop only when another row is waiting, so a cursor is
                // handed out exactly when there is more to read.
                if page.scanned_count as usize >= self.page_limit {
                    page.next_cursor = last_seen
                        .as_ref()
                        .map(|(shard, id)| Self::encode_cursor(*shard, id));
                    return Ok(page);
                }

                page.scanned_count += 1;
                last_seen = Some((shard_idx, id.clone()));

                if row.expires.is_some_and(|expires| expires < cutoff) {
                    page.items.push(id.clone());
                }
            }
        }

        Ok(page)
    }
}
