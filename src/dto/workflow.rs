use serde::Serialize;

use crate::domain::workflow::{Workflow, WorkflowRun};

#[derive(Debug, Serialize)]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub recent_runs: Vec<WorkflowRun>,
}

/// How many workflows an event started.
#[derive(Debug, Default, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TriggerOutcome {
    pub executed: usize,
    pub scheduled: usize,
}
