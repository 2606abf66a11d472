use std::time::Duration;

use uuid::Uuid;

/// The next scheduled step of a run.
///
/// Owned by its run and replaced together with it on restart, so a pending
/// step never outlives the run that scheduled it. `run_id` lets a front end
/// driving its own timer tell which run the step was scheduled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub run_id: Uuid,
    pub node_id: String,
    /// Pacing before the node is visited.
    pub delay: Duration,
}

impl Task {
    pub fn new(run_id: Uuid, node_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            run_id,
            node_id: node_id.into(),
            delay,
        }
    }
}
