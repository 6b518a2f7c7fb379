use dashboard_core::{ConfirmationError, ControlAction, JobId};

use crate::auth::AuthError;
use crate::RequestError;

/// Failure of a dashboard operation, as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("failed to fetch jobs: {0}")]
    Fetch(RequestError),
    #[error("failed to {action} job {job_id}: {source}")]
    Action {
        action: ControlAction,
        job_id: JobId,
        source: RequestError,
    },
    #[error(transparent)]
    Confirmation(#[from] ConfirmationError),
}

impl DashboardError {
    pub(crate) fn fetch(err: RequestError) -> Self {
        match err.kind {
            crate::FailureKind::Auth(auth) => Self::Auth(auth),
            _ => Self::Fetch(err),
        }
    }

    pub(crate) fn action(action: ControlAction, job_id: &JobId, err: RequestError) -> Self {
        match err.kind {
            crate::FailureKind::Auth(auth) => Self::Auth(auth),
            _ => Self::Action {
                action,
                job_id: job_id.clone(),
                source: err,
            },
        }
    }

    /// The message worth showing in a notification: the upstream one when the
    /// service sent one.
    pub fn user_message(&self) -> String {
        match self {
            Self::Action { source, .. } | Self::Fetch(source) => source.to_string(),
            other => other.to_string(),
        }
    }
}
