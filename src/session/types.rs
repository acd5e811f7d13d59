//! Session content.
//!
//! The store treats session content as an opaque JSON object, with two
//! exceptions it reads: `cookie.expires` (an explicit absolute expiry) and
//! `lastModified` (when the content was last fully written).

use crate::error::Result;
use bytes::Bytes;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Content key holding the time of the last full write, in epoch milliseconds.
pub const LAST_MODIFIED: &str = "lastModified";

/// Application session state, stored as a JSON object.
///
/// # Example
///
/// ```
/// use flashkv_sessions::session::Session;
/// use serde_json::json;
///
/// let mut session = Session::new();
/// session.insert("user", json!("ariz"));
/// session.insert("cookie", json!({"expires": 5000}));
///
/// assert_eq!(session.cookie_expires(), Some(5000));
/// assert_eq!(session.last_modified(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Session(Map<String, Value>);

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// The explicit expiry carried in `cookie.expires`, in epoch milliseconds.
    ///
    /// Accepts a number of milliseconds or a date string (RFC 3339, RFC 2822,
    /// or `MM/DD/YYYY HH:MM:SS` in UTC with an optional trailing `Z`).
    pub fn cookie_expires(&self) -> Option<i64> {
        match self.0.get("cookie")?.get("expires")? {
            // Zero means "no explicit expiry"
            Value::Number(n) if n.as_f64() == Some(0.0) => None,
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => parse_expiry_date(s),
            _ => None,
        }
    }

    /// When the content was last fully written, if recorded.
    pub fn last_modified(&self) -> Option<i64> {
        let value = self.0.get(LAST_MODIFIED)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    pub fn set_last_modified(&mut self, now_ms: i64) {
        self.0.insert(LAST_MODIFIED.to_string(), Value::from(now_ms));
    }

    pub fn clear_last_modified(&mut self) {
        self.0.remove(LAST_MODIFIED);
    }

    /// Serializes the content for storage.
    pub fn to_bytes(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(&self.0)?))
    }

    /// Parses stored content. Anything but a JSON object is a decode error.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl From<Map<String, Value>> for Session {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn parse_expiry_date(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(s.trim_end_matches('Z').trim_end(), "%m/%d/%Y %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}
