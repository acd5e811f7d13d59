//! Session Store
//!
//! `SessionStore` turns session-middleware calls into table operations:
//!
//! ```text
//!   get(sid)            ──> table.get            (expired => no session)
//!   set(sid, session)   ──> policy.stamp + compute_expiry ──> table.put
//!   touch(sid, session) ──> policy.should_refresh?
//!                              no  ──> done, nothing written
//!                              yes ──> table.set_expires   (TouchMode::ExpiryOnly)
//!                                      table.put           (TouchMode::Rewrite)
//!   destroy(sid)        ──> table.delete
//! ```
//!
//! Alongside the request path, the store owns a [`CleanupScheduler`] that
//! sweeps expired records from the same table. The two paths share no
//! in-process locks; they rely on the table's per-key atomicity and on the
//! sweep cutoff staying behind the touch grace window.
//!
//! Failures are returned to the caller and also reported to the observer's
//! error hook. Nothing panics after construction.

use crate::error::{Error, Result};
use crate::expiry::{Clock, ExpiryPolicy, SystemClock};
use crate::session::config::{StoreConfig, TouchMode};
use crate::session::observer::{NoopObserver, SessionObserver};
use crate::session::types::Session;
use crate::sweep::{
    CleanupScheduler, CleanupTask, SchedulerState, SweepStats, Sweeper, Timer, TokioTimer,
};
use crate::table::{RecordTable, TableError, TableStatus};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

/// The contract a session-middleware host expects from a store.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Lifecycle hook: connects to the table, provisioning it if configured to.
    async fn init(&self) -> Result<TableStatus>;

    /// Loads a live session. Missing, incomplete and expired records are `None`.
    async fn get(&self, sid: &str) -> Result<Option<Session>>;

    /// Writes the full session.
    async fn set(&self, sid: &str, session: &Session) -> Result<()>;

    /// Extends the session's lifetime, unless it was written recently.
    async fn touch(&self, sid: &str, session: &Session) -> Result<()>;

    /// Removes the session. Removing a missing session succeeds.
    async fn destroy(&self, sid: &str) -> Result<()>;
}

/// A session store over a [`RecordTable`].
///
/// # Example
///
/// ```
/// use flashkv_sessions::session::{Session, SessionBackend, SessionStore, StoreConfig};
/// use flashkv_sessions::table::MemoryTable;
/// use serde_json::json;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let table = Arc::new(MemoryTable::new("sessions"));
/// let store = SessionStore::builder(table, StoreConfig::new("sessions").without_cleanup())
///     .build()
///     .unwrap();
///
/// let mut session = Session::new();
/// session.insert("user", json!("ariz"));
/// store.set("sid-1", &session).await.unwrap();
///
/// let loaded = store.get("sid-1").await.unwrap().unwrap();
/// assert_eq!(loaded.get("user"), Some(&json!("ariz")));
/// # });
/// ```
pub struct SessionStore<T: RecordTable> {
    table: Arc<T>,
    config: StoreConfig,
    policy: ExpiryPolicy,
    observer: Arc<dyn SessionObserver>,
    cleanup_task: CleanupTask<T>,
    cleanup: Option<CleanupScheduler>,
}

impl<T: RecordTable> std::fmt::Debug for SessionStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("table", &self.table.name())
            .field("config", &self.config)
            .field("cleanup", &self.cleanup_state())
            .finish()
    }
}

impl<T: RecordTable> SessionStore<T> {
    /// Starts building a store over `table`.
    pub fn builder(table: Arc<T>, config: StoreConfig) -> SessionStoreBuilder<T> {
        SessionStoreBuilder {
            table,
            config,
            clock: Arc::new(SystemClock),
            timer: Arc::new(TokioTimer),
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn table(&self) -> &Arc<T> {
        &self.table
    }

    /// State of the background cleanup, or `None` when sweeping is disabled.
    pub fn cleanup_state(&self) -> Option<SchedulerState> {
        self.cleanup.as_ref().map(CleanupScheduler::state)
    }

    /// Runs one sweep right now, independent of the cleanup timer.
    pub async fn sweep_expired(&self) -> Result<SweepStats> {
        self.cleanup_task.run_once().await
    }

    fn report(&self, message: String, err: &Error) {
        debug!(error = %err, "{}", message);
        self.observer.error(&message, err);
    }

    async fn connect(&self) -> Result<TableStatus> {
        match self.table.describe().await {
            Ok(()) => Ok(TableStatus::Ready),
            Err(TableError::TableNotFound(_)) if self.config.auto_create => {
                debug!(table = %self.config.table_name, "Table missing, creating it");
                self.table.create().await?;
                Ok(TableStatus::Created)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load(&self, sid: &str) -> Result<Option<Session>> {
        let Some(record) = self.table.get(sid).await? else {
            return Ok(None);
        };

        if record.expires <= self.policy.now_ms() {
            trace!(sid, expires = record.expires, "Session expired on read");
            return Ok(None);
        }

        Ok(Some(Session::from_bytes(&record.content)?))
    }

    async fn save(&self, sid: &str, session: &Session) -> Result<()> {
        let expires = self.policy.compute_expiry(session);
        let mut content = session.clone();
        self.policy.stamp(&mut content);
        self.table.put(sid, expires, content.to_bytes()?).await?;
        Ok(())
    }

    async fn refresh(&self, sid: &str, session: &Session) -> Result<()> {
        if !self.policy.should_refresh(session) {
            trace!(sid, "Session modified recently, touch skipped");
            return Ok(());
        }

        match self.config.touch_mode {
            TouchMode::ExpiryOnly => {
                let expires = self.policy.compute_expiry(session);
                self.table.set_expires(sid, expires).await?;
                Ok(())
            }
            TouchMode::Rewrite => self.save(sid, session).await,
        }
    }
}

#[async_trait]
impl<T: RecordTable> SessionBackend for SessionStore<T> {
    async fn init(&self) -> Result<TableStatus> {
        let result = self.connect().await;
        match &result {
            Ok(_) => self
                .observer
                .info(&format!("SessionStore connected to {}", self.config.table_name)),
            Err(e) => self.report(
                format!("Unable to connect to {}", self.config.table_name),
                e,
            ),
        }
        result
    }

    async fn get(&self, sid: &str) -> Result<Option<Session>> {
        let result = self.load(sid).await;
        if let Err(e) = &result {
            self.report(format!("Unable to get session sid:{sid}"), e);
        }
        result
    }

    async fn set(&self, sid: &str, session: &Session) -> Result<()> {
        let result = self.save(sid, session).await;
        if let Err(e) = &result {
            self.report(format!("Unable to save session sid:{sid}"), e);
        }
        result
    }

    async fn touch(&self, sid: &str, session: &Session) -> Result<()> {
        let result = self.refresh(sid, session).await;
        if let Err(e) = &result {
            self.report(format!("Unable to touch session sid:{sid}"), e);
        }
        result
    }

    async fn destroy(&self, sid: &str) -> Result<()> {
        let result = self.table.delete(sid).await.map_err(Error::from);
        if let Err(e) = &result {
            self.report(format!("Unable to delete session sid:{sid}"), e);
        }
        result
    }
}

/// Builder for [`SessionStore`], for swapping in a clock, timer or observer.
pub struct SessionStoreBuilder<T: RecordTable> {
    table: Arc<T>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    timer: Arc<dyn Timer>,
    observer: Arc<dyn SessionObserver>,
}

impl<T: RecordTable> SessionStoreBuilder<T> {
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validates the configuration and arms the cleanup timer.
    ///
    /// Fails with [`Error::Config`] on invalid configuration, or when
    /// sweeping is enabled and no Tokio runtime is running.
    pub fn build(self) -> Result<SessionStore<T>> {
        self.config.validate()?;

        let sweeping = !self.config.cleanup_interval.is_zero();
        if sweeping && tokio::runtime::Handle::try_current().is_err() {
            return Err(Error::Config(
                "expired session cleanup needs a running Tokio runtime".to_string(),
            ));
        }

        let policy = ExpiryPolicy::new(
            self.config.ttl,
            self.config.touch_after,
            Arc::clone(&self.clock),
        );

        let cleanup_task = CleanupTask::new(
            Sweeper::new(Arc::clone(&self.table)),
            self.config.cleanup_interval,
            self.config.touch_after,
        )
        .with_clock(self.clock)
        .with_timer(self.timer)
        .with_observer(Arc::clone(&self.observer));

        let cleanup = cleanup_task.clone().spawn();

        Ok(SessionStore {
            table: self.table,
            config: self.config,
            policy,
            observer: self.observer,
            cleanup_task,
            cleanup,
        })
    }

    /// Builds the store and runs its lifecycle hook.
    ///
    /// A failed connection is reported but does not fail the store; its
    /// operations keep reaching the table.
    pub async fn open(self) -> Result<SessionStore<T>> {
        let store = self.build()?;
        let _ = store.init().await;
        Ok(store)
    }
}
