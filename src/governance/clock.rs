//! Time source for the registry
//!
//! The registry never reads wall-clock time directly; it asks an injected
//! `Clock` once per operation.

use chrono::{DateTime, Utc};
#[cfg(test)]
use chrono::Duration;
#[cfg(test)]
use std::sync::{Arc, Mutex};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        let mut instant = self.instant.lock().unwrap_or_else(|e| e.into_inner());
        *instant = to;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().unwrap_or_else(|e| e.into_inner())
    }
}
