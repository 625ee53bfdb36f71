//! Wall-clock abstraction so freshness decisions can be evaluated at a pinned instant.

use std::sync::{Arc, Mutex};

use time::OffsetDateTime;

use super::lock::mutex_lock;

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *mutex_lock(&self.now, "util::clock", "set") = now;
    }

    pub fn advance(&self, by: time::Duration) {
        *mutex_lock(&self.now, "util::clock", "advance") += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *mutex_lock(&self.now, "util::clock", "now")
    }
}
