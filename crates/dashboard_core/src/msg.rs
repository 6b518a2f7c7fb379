use std::collections::HashMap;

use crate::{ControlAction, Job, JobId, Transfer};

/// What asked for a fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOrigin {
    Timer,
    User,
    /// Follow-up after a control operation's settle delay.
    Settle,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// A new fetch cycle is wanted.
    RefreshRequested(RefreshOrigin),
    /// Jobs and their active transfers were fetched for `cycle`.
    CycleCompleted {
        cycle: u64,
        fetched_utc: String,
        jobs: Vec<Job>,
        transfers: HashMap<JobId, Transfer>,
    },
    /// The job listing for `cycle` failed.
    CycleFailed { cycle: u64, message: String },
    /// The service accepted a control operation.
    ActionSucceeded { job_id: JobId, action: ControlAction },
    /// A control operation was rejected locally or by the service.
    ActionFailed {
        job_id: JobId,
        action: ControlAction,
        message: String,
    },
    /// User dismissed the current notification.
    NotificationDismissed,
}
