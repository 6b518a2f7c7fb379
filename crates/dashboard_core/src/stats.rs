use crate::{JobRowView, JobStatus};

/// Counts per status bucket across the whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateStats {
    pub total: usize,
    pub ready: usize,
    pub in_progress: usize,
    pub error: usize,
    pub paused: usize,
    pub with_alerts: usize,
    /// Sum of processed bytes over jobs that have transfer data.
    pub bytes_transferred: u64,
}

impl AggregateStats {
    pub fn from_rows(rows: &[JobRowView]) -> Self {
        rows.iter().fold(Self::default(), |mut stats, row| {
            stats.total += 1;
            match row.derived.status {
                JobStatus::Ready => stats.ready += 1,
                JobStatus::InProgress => stats.in_progress += 1,
                JobStatus::Error => stats.error += 1,
                JobStatus::Paused => stats.paused += 1,
            }
            if row.derived.alert_count > 0 {
                stats.with_alerts += 1;
            }
            stats.bytes_transferred = stats
                .bytes_transferred
                .saturating_add(row.derived.bytes_transferred.unwrap_or(0));
            stats
        })
    }
}
