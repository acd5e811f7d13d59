//! A scripted [`RecordTable`] for tests.
//!
//! Every call is appended to a log so tests can assert on exact call order.
//! Scan pages are served from a queue; once it runs dry every scan returns an
//! empty final page.

use crate::table::record::{PageCursor, RawRecord, RecordTable, ScanPage, TableError};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Describe,
    Create,
    Get(String),
    Put {
        id: String,
        expires: i64,
        content: Bytes,
    },
    SetExpires {
        id: String,
        expires: i64,
    },
    Delete(String),
    Scan {
        cutoff: i64,
        cursor: Option<PageCursor>,
    },
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedTable {
    calls: Mutex<Vec<Call>>,
    pages: Mutex<VecDeque<ScanPage>>,
    records: Mutex<HashMap<String, RawRecord>>,
    failing_ids: Mutex<HashSet<String>>,
    fail_scans: Mutex<Option<TableError>>,
    describe_result: Mutex<Option<TableError>>,
}

impl ScriptedTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a page to be returned by the next scan.
    pub(crate) fn with_page(self, items: &[&str], scanned_count: u64, cursor: Option<&str>) -> Self {
        self.pages.lock().unwrap().push_back(ScanPage {
            items: items.iter().map(|id| id.to_string()).collect(),
            scanned_count,
            next_cursor: cursor.map(PageCursor::from),
        });
        self
    }

    pub(crate) fn with_record(self, id: &str, expires: i64, content: &str) -> Self {
        self.records.lock().unwrap().insert(
            id.to_string(),
            RawRecord {
                expires,
                content: Bytes::copy_from_slice(content.as_bytes()),
            },
        );
        self
    }

    /// Every write or read naming this id fails.
    pub(crate) fn failing_on(self, id: &str) -> Self {
        self.failing_ids.lock().unwrap().insert(id.to_string());
        self
    }

    /// Every scan fails with the given error.
    pub(crate) fn failing_scans(self, error: TableError) -> Self {
        *self.fail_scans.lock().unwrap() = Some(error);
        self
    }

    pub(crate) fn missing_table(self, name: &str) -> Self {
        *self.describe_result.lock().unwrap() = Some(TableError::TableNotFound(name.to_string()));
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub(crate) fn scans(&self) -> usize {
        self.count(|c| matches!(c, Call::Scan { .. }))
    }

    pub(crate) fn writes(&self) -> usize {
        self.count(|c| matches!(c, Call::Put { .. } | Call::SetExpires { .. }))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, id: &str) -> Result<(), TableError> {
        if self.failing_ids.lock().unwrap().contains(id) {
            Err(TableError::Unavailable(format!("scripted failure for {id}")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordTable for ScriptedTable {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn describe(&self) -> Result<(), TableError> {
        self.record(Call::Describe);
        match self.describe_result.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn create(&self) -> Result<(), TableError> {
        self.record(Call::Create);
        *self.describe_result.lock().unwrap() = None;
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<RawRecord>, TableError> {
        self.record(Call::Get(id.to_string()));
        self.check(id)?;
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn put(&self, id: &str, expires: i64, content: Bytes) -> Result<(), TableError> {
        self.record(Call::Put {
            id: id.to_string(),
            expires,
            content: content.clone(),
        });
        self.check(id)?;
        self.records
            .lock()
            .unwrap()
            .insert(id.to_string(), RawRecord { expires, content });
        Ok(())
    }

    async fn set_expires(&self, id: &str, expires: i64) -> Result<(), TableError> {
        self.record(Call::SetExpires {
            id: id.to_string(),
            expires,
        });
        self.check(id)?;
        if let Some(record) = self.records.lock().unwrap().get_mut(id) {
            record.expires = expires;
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), TableError> {
        self.record(Call::Delete(id.to_string()));
        self.check(id)?;
        self.records.lock().unwrap().remove(id);
        Ok(())
    }

    async fn scan_page(
        &self,
        cutoff: i64,
        cursor: Option<PageCursor>,
    ) -> Result<ScanPage, TableError> {
        self.record(Call::Scan { cutoff, cursor });
        if let Some(err) = self.fail_scans.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}
