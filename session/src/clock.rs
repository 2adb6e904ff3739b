//! Time sources consumed by the session.

use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

use incident_rush_core::Timestamp;

/// Source of monotonic timestamps.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall clock measuring time since its construction.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_offset(self.origin.elapsed())
    }
}

/// Manually driven clock used for fast-forward simulation and tests.
///
/// Clones share the same underlying instant, so a driver can keep one handle
/// while the session owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    /// Creates a clock positioned at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get().saturating_add(delta));
    }

    /// Moves the clock to `instant`. Moving backwards is ignored.
    pub fn set(&self, instant: Timestamp) {
        if instant.offset() > self.now.get() {
            self.now.set(instant.offset());
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_offset(self.now.get())
    }
}
