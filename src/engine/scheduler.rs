//! Repeating timers on the device clock
//!
//! Timers never block: the owner asks which timers are due at the current
//! device time and runs their work itself.

use std::fmt;

/// Cancellable handle of a repeating timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RepeatingTimer {
    id: TimerId,
    period: f64,
    next_due: f64,
}

/// A timer firing: which timer, and the deadline it fired for
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Firing {
    pub timer: TimerId,
    pub due: f64,
}

/// Set of repeating timers
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<RepeatingTimer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a timer whose first deadline is `now + period` (seconds)
    ///
    /// `period` must be positive and finite.
    pub fn set_interval(&mut self, now: f64, period: f64) -> TimerId {
        debug_assert!(period.is_finite() && period > 0.0);
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(RepeatingTimer {
            id,
            period,
            next_due: now + period,
        });
        id
    }

    /// Cancel a timer. Returns false if it was not active.
    pub fn clear(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Earliest pending deadline
    pub fn next_due(&self) -> Option<f64> {
        self.timers.iter().map(|t| t.next_due).reduce(f64::min)
    }

    /// Collect timers due at `now`, ordered by deadline
    ///
    /// Each due timer fires once; a timer that fell more than one period
    /// behind skips the missed deadlines and realigns past `now`.
    pub fn take_due(&mut self, now: f64) -> Vec<Firing> {
        // Tolerate clock rounding to whole frames
        let now = now + 1e-9;
        let mut firings = Vec::new();

        for timer in &mut self.timers {
            if timer.next_due > now {
                continue;
            }
            firings.push(Firing {
                timer: timer.id,
                due: timer.next_due,
            });
            timer.next_due += timer.period;
            if timer.next_due <= now {
                let missed = ((now - timer.next_due) / timer.period).floor() + 1.0;
                timer.next_due += missed * timer.period;
            }
        }

        firings.sort_by(|a, b| a.due.total_cmp(&b.due));
        firings
    }
}
