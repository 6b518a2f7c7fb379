use crate::{AggregateStats, Job, JobId, JobStatus, Notification, Transfer};

/// Visual treatment of a job's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusVariant {
    Neutral,
    Active,
    Danger,
    Muted,
    /// Any status that carries active alerts.
    Warning,
}

impl StatusVariant {
    pub fn for_status(status: JobStatus, has_alerts: bool) -> Self {
        if has_alerts {
            return Self::Warning;
        }
        match status {
            JobStatus::Ready => Self::Neutral,
            JobStatus::InProgress => Self::Active,
            JobStatus::Error => Self::Danger,
            JobStatus::Paused => Self::Muted,
        }
    }
}

/// Display fields computed from a job and its active transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedView {
    pub status: JobStatus,
    pub display_status: String,
    pub status_variant: StatusVariant,
    pub percent_complete: Option<u32>,
    pub bytes_transferred: Option<u64>,
    pub total_bytes: Option<u64>,
    pub files_remaining: Option<u64>,
    pub rate_bits_per_second: Option<f64>,
    pub alert_count: usize,
}

impl DerivedView {
    pub fn compute(job: &Job, transfer: Option<&Transfer>) -> Self {
        let status = job.resolved_status();
        let alert_count = job.active_alerts.len();
        let has_alerts = job.has_alerts();
        let display_status = if has_alerts {
            format!("{} ({} alert{})", status.label(), alert_count, plural(alert_count))
        } else {
            status.label().to_string()
        };

        Self {
            status,
            display_status,
            status_variant: StatusVariant::for_status(status, has_alerts),
            percent_complete: transfer.and_then(Transfer::percent_complete),
            bytes_transferred: transfer.map(|t| t.transfer_progress.processed_bytes()),
            total_bytes: transfer.map(Transfer::total_bytes),
            files_remaining: transfer.map(|t| t.transfer_progress.remaining.count),
            rate_bits_per_second: transfer
                .and_then(|t| t.current_rate_bits_per_second)
                .filter(|rate| rate.is_finite()),
            alert_count,
        }
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// One job as published: the fetched records plus their derived view.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRowView {
    pub job: Job,
    pub transfer: Option<Transfer>,
    pub derived: DerivedView,
}

impl JobRowView {
    pub fn new(job: Job, transfer: Option<Transfer>) -> Self {
        let derived = DerivedView::compute(&job, transfer.as_ref());
        Self {
            job,
            transfer,
            derived,
        }
    }

    pub fn job_id(&self) -> &JobId {
        &self.job.job_id
    }
}

/// Everything a front end needs to draw the dashboard.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardViewModel {
    pub cycle: Option<u64>,
    pub fetched_utc: Option<String>,
    pub rows: Vec<JobRowView>,
    pub stats: AggregateStats,
    pub refreshing: bool,
    pub last_notification: Option<Notification>,
}
