use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reads an explicit `null` as the field's default, like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Run state of a job as displayed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JobStatus {
    #[default]
    Ready,
    InProgress,
    Error,
    Paused,
}

impl JobStatus {
    /// Parses a wire status case-insensitively. Unknown values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "READY" => Some(Self::Ready),
            "IN_PROGRESS" | "INPROGRESS" => Some(Self::InProgress),
            "ERROR" => Some(Self::Error),
            "PAUSED" => Some(Self::Paused),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::Ready => "READY",
            Self::InProgress => "IN_PROGRESS",
            Self::Error => "ERROR",
            Self::Paused => "PAUSED",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::InProgress => "In Progress",
            Self::Error => "Error",
            Self::Paused => "Paused",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// `{ "state": "..." }` as nested under monitors and actions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Monitor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Source or destination endpoint descriptor.
///
/// Only the fields the dashboard reads are typed; everything else is kept in
/// `extra` so a read-then-PATCH sends the configuration back untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusState>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub const TRIGGER_MANUAL: &str = "MANUAL";
pub const TRIGGER_HOT_FOLDER: &str = "HOT_FOLDER";

/// Filesystem events a hot-folder trigger watches.
pub const HOT_FOLDER_EVENTS: [&str; 3] = ["CREATED", "MODIFIED", "RENAMED"];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor: Option<Monitor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Trigger {
    pub fn manual() -> Self {
        Self {
            kind: TRIGGER_MANUAL.to_string(),
            ..Self::default()
        }
    }

    pub fn hot_folder() -> Self {
        Self {
            kind: TRIGGER_HOT_FOLDER.to_string(),
            events: Some(HOT_FOLDER_EVENTS.iter().map(|e| e.to_string()).collect()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_alerts: Vec<Alert>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by_auth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_by_auth_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<Action>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub triggers: Vec<Trigger>,
}

/// The job-level `status` field, which the service sends either as a bare
/// string or as `{ "state": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusField {
    Plain(String),
    Nested(StatusState),
}

impl StatusField {
    pub fn state(&self) -> Option<&str> {
        match self {
            Self::Plain(state) => Some(state),
            Self::Nested(nested) => nested.state.as_deref(),
        }
    }
}

impl Job {
    /// Effective status of the job.
    ///
    /// Precedence: first trigger's monitor state, then first action's state,
    /// then the job's own `status`, then `Ready`. Values that do not parse are
    /// skipped rather than short-circuiting to the default.
    pub fn resolved_status(&self) -> JobStatus {
        let monitor = self
            .triggers
            .first()
            .and_then(|t| t.monitor.as_ref())
            .and_then(|m| m.status.as_ref())
            .and_then(|s| s.state.as_deref());
        let action = self
            .actions
            .first()
            .and_then(|a| a.status.as_ref())
            .and_then(|s| s.state.as_deref());
        let own = self.status.as_ref().and_then(StatusField::state);

        [monitor, action, own]
            .into_iter()
            .flatten()
            .find_map(JobStatus::parse)
            .unwrap_or_default()
    }

    pub fn has_alerts(&self) -> bool {
        !self.active_alerts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job_from(value: Value) -> Job {
        serde_json::from_value(value).expect("job json")
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(JobStatus::parse("in_progress"), Some(JobStatus::InProgress));
        assert_eq!(JobStatus::parse("In-Progress"), Some(JobStatus::InProgress));
        assert_eq!(JobStatus::parse(" paused "), Some(JobStatus::Paused));
        assert_eq!(JobStatus::parse("queued"), None);
    }

    #[test]
    fn monitor_state_wins_over_action_state() {
        let job = job_from(json!({
            "jobId": "j1",
            "triggers": [{"type": "HOT_FOLDER", "monitor": {"status": {"state": "error"}}}],
            "actions": [{"type": "S3", "status": {"state": "IN_PROGRESS"}}],
            "status": "READY"
        }));
        assert_eq!(job.resolved_status(), JobStatus::Error);
    }

    #[test]
    fn falls_back_to_action_then_job_status() {
        let job = job_from(json!({
            "jobId": "j1",
            "triggers": [{"type": "MANUAL"}],
            "actions": [{"type": "S3", "status": {"state": "paused"}}]
        }));
        assert_eq!(job.resolved_status(), JobStatus::Paused);

        let job = job_from(json!({"jobId": "j2", "status": {"state": "IN_PROGRESS"}}));
        assert_eq!(job.resolved_status(), JobStatus::InProgress);
    }

    #[test]
    fn unknown_or_missing_status_defaults_to_ready() {
        let job = job_from(json!({"jobId": "j1", "status": "SOMETHING_NEW"}));
        assert_eq!(job.resolved_status(), JobStatus::Ready);

        let job = job_from(json!({"jobId": "j2"}));
        assert_eq!(job.resolved_status(), JobStatus::Ready);
    }

    #[test]
    fn null_collections_and_names_read_as_empty() {
        let job = job_from(json!({
            "jobId": "j1",
            "name": null,
            "status": null,
            "activeAlerts": null,
            "actions": null,
            "triggers": [{"type": null, "monitor": null}]
        }));
        assert_eq!(job.name, "");
        assert!(!job.has_alerts());
        assert!(job.actions.is_empty());
        assert_eq!(job.triggers[0].kind, "");
        assert_eq!(job.resolved_status(), JobStatus::Ready);
    }

    #[test]
    fn unknown_action_fields_survive_a_round_trip() {
        let raw = json!({
            "type": "SFTP",
            "host": "files.example.com",
            "path": "/inbound",
            "credentials": {"secretRef": "abc"}
        });
        let action: Action = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(action.kind.as_deref(), Some("SFTP"));
        assert_eq!(serde_json::to_value(&action).unwrap(), raw);
    }
}
