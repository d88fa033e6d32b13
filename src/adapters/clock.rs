//! Wall-clock adapter.

use chrono::{Local, NaiveDateTime, Timelike};

use crate::app::ports::Clock;

/// Local system time, truncated to whole seconds.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}
