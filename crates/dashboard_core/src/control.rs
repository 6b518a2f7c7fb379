use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{Action, Job, JobStatus, Trigger};

/// Literal the operator must type to confirm a delete.
pub const DELETE_CONFIRMATION: &str = "DELETE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Start,
    Pause,
    Resume,
    Retrigger,
    Delete,
}

impl ControlAction {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Retrigger => "retrigger",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("delete not confirmed: expected {expected:?}, got {got:?}")]
pub struct ConfirmationError {
    pub expected: &'static str,
    pub got: String,
}

/// Checks the operator's confirmation text. The match is exact, case included.
pub fn confirm_delete(text: &str) -> Result<(), ConfirmationError> {
    if text == DELETE_CONFIRMATION {
        Ok(())
    } else {
        Err(ConfirmationError {
            expected: DELETE_CONFIRMATION,
            got: text.to_string(),
        })
    }
}

/// Body of `PATCH /jobs/{jobId}`. Absent fields are left alone by the service.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<Action>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<Trigger>>,
}

impl JobPatch {
    pub fn start() -> Self {
        Self {
            status: Some(JobStatus::InProgress.as_wire().to_string()),
            ..Self::default()
        }
    }

    /// Switch to manual triggering and mark paused, keeping the endpoints.
    pub fn pause(current: &Job) -> Self {
        Self {
            paused: Some(true),
            actions: Some(current.actions.clone()),
            triggers: Some(vec![Trigger::manual()]),
            ..Self::default()
        }
    }

    /// Back to hot-folder triggering and unpaused, keeping the endpoints.
    pub fn resume(current: &Job) -> Self {
        Self {
            paused: Some(false),
            ..Self::retrigger(current)
        }
    }

    /// Hot-folder triggering without touching the paused flag.
    pub fn retrigger(current: &Job) -> Self {
        Self {
            actions: Some(current.actions.clone()),
            triggers: Some(vec![Trigger::hot_folder()]),
            ..Self::default()
        }
    }
}
