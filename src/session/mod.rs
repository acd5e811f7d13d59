//! Session Store Module
//!
//! The public face of the crate: the store a session-middleware host talks to.
//!
//! ## Modules
//!
//! - `store`: [`SessionStore`] and the [`SessionBackend`] contract
//! - `config`: [`StoreConfig`] and the host-facing [`StoreOptions`]
//! - `types`: the [`Session`] content type
//! - `observer`: informational and error hooks for the host

pub mod config;
pub mod observer;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{
    StoreConfig, StoreOptions, TouchMode, DEFAULT_CLEANUP_INTERVAL, DEFAULT_TOUCH_AFTER,
    DEFAULT_TTL,
};
pub use observer::{NoopObserver, SessionObserver, TracingObserver};
pub use store::{SessionBackend, SessionStore, SessionStoreBuilder};
pub use types::{Session, LAST_MODIFIED};
