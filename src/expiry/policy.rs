//! Expiry Policy
//!
//! Decides when a session record expires and whether a `touch` has to write.
//!
//! ## Rules
//!
//! - A session carrying `cookie.expires` expires exactly then.
//!   Everything else expires at `now + ttl`.
//! - With a zero `touch_after`, every touch writes.
//! - Otherwise a touch writes only once `now - lastModified >= touch_after`.
//!   A session without a usable `lastModified` always writes.
//! - `set` stamps `lastModified = now` into the content whenever a grace
//!   window is configured, so later touches have something to compare with.

use crate::expiry::clock::{duration_ms, Clock};
use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;

/// Computes expiry timestamps and refresh decisions for sessions.
#[derive(Clone)]
pub struct ExpiryPolicy {
    ttl: Duration,
    touch_after: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ExpiryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiryPolicy")
            .field("ttl", &self.ttl)
            .field("touch_after", &self.touch_after)
            .finish()
    }
}

impl ExpiryPolicy {
    pub fn new(ttl: Duration, touch_after: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            touch_after,
            clock,
        }
    }

    /// Current time from the policy's clock.
    #[inline]
    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn touch_after(&self) -> Duration {
        self.touch_after
    }

    /// Absolute expiry for a session about to be written.
    pub fn compute_expiry(&self, session: &Session) -> i64 {
        session
            .cookie_expires()
            .unwrap_or_else(|| self.now_ms().saturating_add(duration_ms(self.ttl)))
    }

    /// Whether a touch of this session must write to the table.
    pub fn should_refresh(&self, session: &Session) -> bool {
        if self.touch_after.is_zero() {
            return true;
        }
        match session.last_modified() {
            Some(last_modified) => {
                self.now_ms().saturating_sub(last_modified) >= duration_ms(self.touch_after)
            }
            None => true,
        }
    }

    /// Prepares session content for a full write.
    ///
    /// With a grace window, `lastModified` is set to now. Without one the
    /// field carries no meaning and is dropped.
    pub fn stamp(&self, session: &mut Session) {
        if self.touch_after.is_zero() {
            session.clear_last_modified();
        } else {
            session.set_last_modified(self.now_ms());
        }
    }
}
