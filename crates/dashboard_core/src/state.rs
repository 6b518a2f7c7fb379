use std::collections::HashMap;
use std::sync::Arc;

use crate::view_model::DashboardViewModel;
use crate::{Job, JobId, Notification, Snapshot, Transfer};

/// Reconciler bookkeeping: which cycle is in flight and what was last published.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardState {
    last_cycle: u64,
    in_flight: Option<u64>,
    refresh_pending: bool,
    published: Option<Arc<Snapshot>>,
    last_notification: Option<Notification>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> DashboardViewModel {
        match self.published.as_deref() {
            Some(snapshot) => DashboardViewModel {
                cycle: Some(snapshot.cycle),
                fetched_utc: Some(snapshot.fetched_utc.clone()),
                rows: snapshot.rows.clone(),
                stats: snapshot.stats,
                refreshing: self.in_flight.is_some(),
                last_notification: self.last_notification.clone(),
            },
            None => DashboardViewModel {
                refreshing: self.in_flight.is_some(),
                last_notification: self.last_notification.clone(),
                ..DashboardViewModel::default()
            },
        }
    }

    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.published.as_ref()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.last_notification.as_ref()
    }

    /// Starts the next cycle unless one is already running, in which case a
    /// single follow-up is queued.
    pub(crate) fn request_cycle(&mut self) -> Option<u64> {
        if self.in_flight.is_some() {
            self.refresh_pending = true;
            return None;
        }
        self.last_cycle += 1;
        self.in_flight = Some(self.last_cycle);
        Some(self.last_cycle)
    }

    /// Clears the in-flight marker. Returns whether `cycle` is newer than the
    /// published snapshot.
    pub(crate) fn finish_cycle(&mut self, cycle: u64) -> bool {
        self.in_flight = None;
        let published = self.published.as_ref().map_or(0, |s| s.cycle);
        cycle > published
    }

    /// Consumes a queued follow-up, starting it.
    pub(crate) fn take_pending_cycle(&mut self) -> Option<u64> {
        if !std::mem::take(&mut self.refresh_pending) {
            return None;
        }
        self.request_cycle()
    }

    pub(crate) fn publish(
        &mut self,
        cycle: u64,
        fetched_utc: String,
        jobs: Vec<Job>,
        transfers: HashMap<JobId, Transfer>,
    ) -> Arc<Snapshot> {
        let snapshot = Arc::new(Snapshot::build(cycle, fetched_utc, jobs, transfers));
        self.published = Some(snapshot.clone());
        snapshot
    }

    pub(crate) fn set_notification(&mut self, notification: Option<Notification>) {
        self.last_notification = notification;
    }
}
