//! Expiry Module
//!
//! Time and expiry decisions for session records.
//!
//! - `clock`: the injectable wall clock (epoch milliseconds)
//! - `policy`: expiry computation, touch grace windows and `lastModified` stamping
//!
//! ## Lazy + Active Expiry
//!
//! Records expire in two ways:
//! 1. **Lazy**: a read of a record whose expiry has passed reports no session,
//!    even though the row may still physically exist.
//! 2. **Active**: the sweep (see [`crate::sweep`]) periodically deletes rows
//!    whose expiry is safely in the past.

pub mod clock;
pub mod policy;

pub use clock::{duration_ms, Clock, ManualClock, SystemClock};
pub use policy::ExpiryPolicy;
