//! Configuration for the session store.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::time::Duration;

/// Default session lifetime when no cookie expiry is given: two weeks.
pub const DEFAULT_TTL: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// Default time between cleanup sweeps: five minutes.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Default touch grace window: ten seconds.
pub const DEFAULT_TOUCH_AFTER: Duration = Duration::from_secs(10);

/// How `touch` writes when a refresh is due.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TouchMode {
    /// Update only the `expires` attribute. One small write; the stored
    /// `lastModified` keeps the value from the last `set`.
    #[default]
    ExpiryOnly,
    /// Rewrite the whole record with a fresh `lastModified`, so the grace
    /// window restarts from this touch.
    Rewrite,
}

/// Configuration for a [`SessionStore`](crate::session::SessionStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name of the backing table
    pub table_name: String,

    /// Lifetime applied to sessions without a cookie expiry
    pub ttl: Duration,

    /// Time between cleanup sweeps. Zero disables sweeping.
    pub cleanup_interval: Duration,

    /// Minimum time between expiry refreshes of one session.
    /// Zero refreshes on every touch.
    pub touch_after: Duration,

    /// Provision the table if it does not exist
    pub auto_create: bool,

    /// How touches that are due write to the table
    pub touch_mode: TouchMode,
}

impl StoreConfig {
    /// Create a configuration for the given table with default values.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ttl: DEFAULT_TTL,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            touch_after: DEFAULT_TOUCH_AFTER,
            auto_create: false,
            touch_mode: TouchMode::default(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Disable the background cleanup sweep.
    pub fn without_cleanup(mut self) -> Self {
        self.cleanup_interval = Duration::ZERO;
        self
    }

    pub fn with_touch_after(mut self, touch_after: Duration) -> Self {
        self.touch_after = touch_after;
        self
    }

    pub fn with_auto_create(mut self, auto_create: bool) -> Self {
        self.auto_create = auto_create;
        self
    }

    pub fn with_touch_mode(mut self, mode: TouchMode) -> Self {
        self.touch_mode = mode;
        self
    }

    /// Checks the configuration before anything is started.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(Error::Config("a table name is required".to_string()));
        }
        Ok(())
    }
}

/// Store options as an embedding host passes them, e.g. parsed from JSON.
///
/// Durations are milliseconds and may be fractional. Missing or non-numeric
/// values take the defaults and negative values count as zero. Keys the store
/// does not use are ignored.
///
/// ```
/// use flashkv_sessions::session::{StoreConfig, StoreOptions};
/// use std::time::Duration;
///
/// let options: StoreOptions =
///     serde_json::from_str(r#"{"tableName": "sessions", "cleanupInterval": 0}"#).unwrap();
/// let config = StoreConfig::try_from(options).unwrap();
///
/// assert_eq!(config.cleanup_interval, Duration::ZERO);
/// assert_eq!(config.touch_after, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreOptions {
    pub table_name: Option<String>,
    #[serde(deserialize_with = "number_or_none")]
    pub ttl: Option<f64>,
    #[serde(deserialize_with = "number_or_none")]
    pub cleanup_interval: Option<f64>,
    #[serde(deserialize_with = "number_or_none")]
    pub touch_after: Option<f64>,
    pub auto_create: bool,
    pub touch_mode: TouchMode,
}

fn number_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|ms| ms.is_finite()))
}

fn millis_or(value: Option<f64>, default: Duration) -> Duration {
    match value {
        // Saturates for values beyond u64 nanoseconds
        Some(ms) => Duration::from_nanos((ms.max(0.0) * 1_000_000.0) as u64),
        None => default,
    }
}

impl TryFrom<StoreOptions> for StoreConfig {
    type Error = Error;

    fn try_from(options: StoreOptions) -> Result<Self> {
        let config = StoreConfig {
            table_name: options.table_name.unwrap_or_default(),
            ttl: millis_or(options.ttl, DEFAULT_TTL),
            cleanup_interval: millis_or(options.cleanup_interval, DEFAULT_CLEANUP_INTERVAL),
            touch_after: millis_or(options.touch_after, DEFAULT_TOUCH_AFTER),
            auto_create: options.auto_create,
            touch_mode: options.touch_mode,
        };
        config.validate()?;
        Ok(config)
    }
}
