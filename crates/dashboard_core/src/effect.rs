use std::sync::Arc;

use crate::Snapshot;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Fetch jobs and transfers, then report back as `cycle`.
    StartCycle { cycle: u64 },
    /// Hand a new snapshot to subscribers.
    Publish(Arc<Snapshot>),
    /// Refresh again once the service has had time to apply a mutation.
    ScheduleSettleRefresh,
    /// Show a non-blocking message to the operator.
    Notify(Notification),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}
