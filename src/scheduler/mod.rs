//! Timer scheduling on the single UI event loop.
//!
//! All callbacks run on the thread that owns the scheduler, there is no
//! parallelism and nothing here is `Send`.

#[cfg(feature = "glib")]
mod glib_loop;
mod manual;

#[cfg(feature = "glib")]
pub use glib_loop::GlibScheduler;
pub use manual::ManualScheduler;

use std::time::Duration;

/// Identifies a scheduled timer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct TimerId(pub(crate) u64);

pub trait Scheduler {
    /// Calls `callback` once after `delay`.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Calls `callback` every `interval` until cancelled.
    fn schedule_repeating(&self, interval: Duration, callback: Box<dyn FnMut()>) -> TimerId;

    /// Cancels a timer. Cancelling a timer that already fired or was already
    /// cancelled does nothing.
    fn cancel(&self, id: TimerId);
}
