//! The session's periodic checks, scheduled against a [`Clock`](super::clock::Clock).
//!
//! Instead of one timer per check, the session polls [`PeriodicTasks::due`]
//! from a single heartbeat. A task that is overdue by several periods fires
//! once and is rescheduled from the current time, so a suspended process does
//! not replay a burst of missed ticks on wake.

use crate::constants::{
    ANALYSIS_TICK_SECS, DISPLAY_REFRESH_SECS, ROLLOVER_CHECK_SECS, SAVE_SWEEP_SECS,
};
use chrono::{DateTime, Duration, Utc};

/// A periodic check run by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Recompute display-only progress.
    DisplayRefresh,
    /// Compare analysis counters to thresholds.
    AnalysisTick,
    /// Persist the current entry if it changed.
    SaveSweep,
    /// Look for a calendar-day change.
    RolloverCheck,
}

impl Task {
    pub const ALL: [Task; 4] = [
        Task::DisplayRefresh,
        Task::AnalysisTick,
        Task::SaveSweep,
        Task::RolloverCheck,
    ];

    pub fn period(self) -> Duration {
        let secs = match self {
            Task::DisplayRefresh => DISPLAY_REFRESH_SECS,
            Task::AnalysisTick => ANALYSIS_TICK_SECS,
            Task::SaveSweep => SAVE_SWEEP_SECS,
            Task::RolloverCheck => ROLLOVER_CHECK_SECS,
        };
        Duration::seconds(secs)
    }
}

/// Next due time of each periodic task.
#[derive(Debug, Clone)]
pub struct PeriodicTasks {
    schedule: Vec<(Task, DateTime<Utc>)>,
}

impl PeriodicTasks {
    /// Schedules every task one period after `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            schedule: Task::ALL
                .iter()
                .map(|task| (*task, start + task.period()))
                .collect(),
        }
    }

    /// Returns the tasks due at `now`, in declaration order, and reschedules them.
    pub fn due(&mut self, now: DateTime<Utc>) -> Vec<Task> {
        let mut due = Vec::new();
        for (task, next) in self.schedule.iter_mut() {
            if *next <= now {
                due.push(*task);
                *next = now + task.period();
            }
        }
        due
    }

    /// Earliest upcoming due time.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.schedule.iter().map(|(_, next)| *next).min()
    }
}
