//! Reports returned by the cron endpoints and logged by `run_jobs`.

use serde::Serialize;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct WorkflowJobReport {
    pub processed: usize,
    pub completed: usize,
    pub failed: usize,
    /// Runs another worker claimed first.
    pub skipped: usize,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ReminderJobReport {
    pub scheduled: usize,
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}
