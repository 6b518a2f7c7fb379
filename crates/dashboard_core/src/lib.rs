//! Dashboard core: job model, derived views and the pure reconciler state machine.
mod control;
mod effect;
mod format;
mod job;
mod msg;
mod snapshot;
mod state;
mod stats;
mod transfer;
mod update;
mod view_model;

pub use control::{confirm_delete, ConfirmationError, ControlAction, JobPatch, DELETE_CONFIRMATION};
pub use effect::{Effect, Notification, NotificationLevel};
pub use format::{format_bytes, format_percent, format_rate};
pub use job::{
    Action, Alert, Job, JobId, JobStatus, Monitor, StatusField, StatusState, Trigger,
    HOT_FOLDER_EVENTS, TRIGGER_HOT_FOLDER, TRIGGER_MANUAL,
};
pub use msg::{Msg, RefreshOrigin};
pub use snapshot::Snapshot;
pub use state::DashboardState;
pub use stats::AggregateStats;
pub use transfer::{percent_of, ByteCount, ObjectsManifest, Transfer, TransferProgress};
pub use update::update;
pub use view_model::{DashboardViewModel, DerivedView, JobRowView, StatusVariant};
