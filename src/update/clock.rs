//! Time source for check scheduling

use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Whole days between two instants, regardless of order
pub fn days_between(earlier: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - earlier).num_days().unsigned_abs()
}
