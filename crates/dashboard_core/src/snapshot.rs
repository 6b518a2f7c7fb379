use std::collections::HashMap;

use crate::{AggregateStats, Job, JobId, JobRowView, Transfer};

/// Result of one completed fetch cycle. Published whole or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub cycle: u64,
    pub fetched_utc: String,
    pub rows: Vec<JobRowView>,
    pub stats: AggregateStats,
}

impl Snapshot {
    /// Merges jobs with their active transfers, keeping the service's job order.
    ///
    /// A transfer is attached only while its job still resolves to
    /// in-progress; anything else in `transfers` is ignored.
    pub fn build(
        cycle: u64,
        fetched_utc: String,
        jobs: Vec<Job>,
        mut transfers: HashMap<JobId, Transfer>,
    ) -> Self {
        let rows: Vec<JobRowView> = jobs
            .into_iter()
            .map(|job| {
                let transfer = if job.resolved_status() == crate::JobStatus::InProgress {
                    transfers.remove(&job.job_id)
                } else {
                    None
                };
                JobRowView::new(job, transfer)
            })
            .collect();
        let stats = AggregateStats::from_rows(&rows);

        Self {
            cycle,
            fetched_utc,
            rows,
            stats,
        }
    }

    pub fn row(&self, job_id: &JobId) -> Option<&JobRowView> {
        self.rows.iter().find(|row| row.job_id() == job_id)
    }
}
