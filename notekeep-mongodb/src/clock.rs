//! Write timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Hands out strictly increasing millisecond timestamps.
///
/// BSON datetimes only keep milliseconds, so two writes within the same
/// millisecond would otherwise get the same `updated_at`. When the wall clock
/// has not moved past the last value handed out, the next millisecond is
/// used instead.
#[derive(Debug, Default)]
pub(crate) struct Clock {
    last_millis: AtomicI64,
}

impl Clock {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let next = wall.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return bson::DateTime::from_millis(next).to_chrono(),
                Err(current) => last = current,
            }
        }
    }
}
