use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use dashboard_core::{
    confirm_delete, update, ControlAction, DashboardState, DashboardViewModel, Effect, Job,
    JobId, JobPatch, JobStatus, Msg, Notification, RefreshOrigin, Snapshot, Transfer,
};
use dashboard_logging::{dash_debug, dash_error, dash_info, dash_warn};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use tokio::sync::{broadcast, watch};

use crate::api::ApiClient;
use crate::error::DashboardError;
use crate::RequestError;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1500);
const NOTIFICATION_BACKLOG: usize = 32;

/// Produces the timestamp recorded on each published snapshot.
pub type Timestamper = Arc<dyn Fn() -> String + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Wait after a control operation before re-fetching.
    pub settle_delay: Duration,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Keeps the published job snapshot in step with the service and runs
/// control operations against it.
///
/// All bookkeeping lives in [`DashboardState`]; this type only performs the
/// effects `update` asks for. The state lock is never held across an await.
pub struct Reconciler {
    api: Arc<ApiClient>,
    settings: ReconcilerSettings,
    fetched_utc: Timestamper,
    state: Mutex<DashboardState>,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    notification_tx: broadcast::Sender<Notification>,
}

impl Reconciler {
    pub fn new(
        api: Arc<ApiClient>,
        settings: ReconcilerSettings,
        fetched_utc: Timestamper,
    ) -> Arc<Self> {
        let (snapshot_tx, _) = watch::channel(None);
        let (notification_tx, _) = broadcast::channel(NOTIFICATION_BACKLOG);
        Arc::new(Self {
            api,
            settings,
            fetched_utc,
            state: Mutex::new(DashboardState::new()),
            snapshot_tx,
            notification_tx,
        })
    }

    /// Receives every published snapshot. Starts at the current one.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_tx.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notification_tx.subscribe()
    }

    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.with_state(|state| state.snapshot().cloned())
    }

    pub fn view(&self) -> DashboardViewModel {
        self.with_state(|state| state.view())
    }

    pub fn dismiss_notification(&self) {
        self.dispatch(Msg::NotificationDismissed);
    }

    /// Runs a fetch cycle, or queues one behind the cycle already in flight.
    pub async fn refresh(self: &Arc<Self>, origin: RefreshOrigin) {
        dash_debug!("Refresh requested ({:?})", origin);
        let effects = self.dispatch(Msg::RefreshRequested(origin));
        self.run_effects(effects).await;
    }

    pub async fn start_job(self: &Arc<Self>, job_id: &JobId) -> Result<(), DashboardError> {
        self.control(job_id, ControlAction::Start, async {
            self.api.patch_job(job_id, &JobPatch::start()).await
        })
        .await
    }

    pub async fn pause_job(self: &Arc<Self>, job_id: &JobId) -> Result<(), DashboardError> {
        self.control(job_id, ControlAction::Pause, async {
            let current = self.api.get_job(job_id).await?;
            self.api.patch_job(job_id, &JobPatch::pause(&current)).await
        })
        .await
    }

    pub async fn resume_job(self: &Arc<Self>, job_id: &JobId) -> Result<(), DashboardError> {
        self.control(job_id, ControlAction::Resume, async {
            let current = self.api.get_job(job_id).await?;
            self.api.patch_job(job_id, &JobPatch::resume(&current)).await
        })
        .await
    }

    pub async fn retrigger_job(self: &Arc<Self>, job_id: &JobId) -> Result<(), DashboardError> {
        self.control(job_id, ControlAction::Retrigger, async {
            let current = self.api.get_job(job_id).await?;
            self.api.patch_job(job_id, &JobPatch::retrigger(&current)).await
        })
        .await
    }

    /// Deletes a job once `confirmation` matches exactly. A mismatch fails
    /// without touching the network.
    pub async fn delete_job(
        self: &Arc<Self>,
        job_id: &JobId,
        confirmation: &str,
    ) -> Result<(), DashboardError> {
        if let Err(err) = confirm_delete(confirmation) {
            dash_info!("Delete of job {} not confirmed", job_id);
            let effects = self.dispatch(Msg::ActionFailed {
                job_id: job_id.clone(),
                action: ControlAction::Delete,
                message: err.to_string(),
            });
            self.run_effects(effects).await;
            return Err(err.into());
        }
        self.control(job_id, ControlAction::Delete, async {
            self.api.delete_job(job_id).await
        })
        .await
    }

    async fn control<F>(
        self: &Arc<Self>,
        job_id: &JobId,
        action: ControlAction,
        operation: F,
    ) -> Result<(), DashboardError>
    where
        F: Future<Output = Result<(), RequestError>>,
    {
        dash_info!("Requesting {} of job {}", action, job_id);
        match operation.await {
            Ok(()) => {
                let effects = self.dispatch(Msg::ActionSucceeded {
                    job_id: job_id.clone(),
                    action,
                });
                self.run_effects(effects).await;
                Ok(())
            }
            Err(err) => {
                dash_warn!("{} of job {} failed: {}", action, job_id, err);
                let err = DashboardError::action(action, job_id, err);
                let effects = self.dispatch(Msg::ActionFailed {
                    job_id: job_id.clone(),
                    action,
                    message: err.user_message(),
                });
                self.run_effects(effects).await;
                Err(err)
            }
        }
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let state = std::mem::take(&mut *guard);
        let (state, effects) = update(state, msg);
        *guard = state;
        effects
    }

    fn with_state<T>(&self, f: impl FnOnce(&DashboardState) -> T) -> T {
        let guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Effects run on their own task and finish even if the caller is dropped.
    async fn run_effects(self: &Arc<Self>, effects: Vec<Effect>) {
        if effects.is_empty() {
            return;
        }
        let task = tokio::spawn(Arc::clone(self).drive_effects(effects));
        if let Err(err) = task.await {
            dash_error!("Effect runner stopped: {}", err);
        }
    }

    fn drive_effects(self: Arc<Self>, effects: Vec<Effect>) -> BoxFuture<'static, ()> {
        async move { self.drain_effects(effects).await }.boxed()
    }

    async fn drain_effects(self: &Arc<Self>, effects: Vec<Effect>) {
        let mut queue = VecDeque::from(effects);
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::StartCycle { cycle } => {
                    let msg = self.fetch_cycle(cycle).await;
                    queue.extend(self.dispatch(msg));
                }
                Effect::Publish(snapshot) => {
                    dash_info!(
                        "Published cycle {} with {} jobs ({} in progress)",
                        snapshot.cycle,
                        snapshot.stats.total,
                        snapshot.stats.in_progress
                    );
                    self.snapshot_tx.send_replace(Some(snapshot));
                }
                Effect::ScheduleSettleRefresh => self.schedule_settle_refresh(),
                Effect::Notify(notification) => {
                    // No receivers is fine; the state keeps the last one.
                    let _ = self.notification_tx.send(notification);
                }
            }
        }
    }

    fn schedule_settle_refresh(self: &Arc<Self>) {
        let delay = self.settings.settle_delay;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.settle_refresh().await;
        });
    }

    // Boxed so the spawned task does not name `refresh`'s own future type.
    fn settle_refresh(self: Arc<Self>) -> BoxFuture<'static, ()> {
        async move { self.refresh(RefreshOrigin::Settle).await }.boxed()
    }

    async fn fetch_cycle(&self, cycle: u64) -> Msg {
        match self.fetch_jobs_and_transfers().await {
            Ok((jobs, transfers)) => Msg::CycleCompleted {
                cycle,
                fetched_utc: (self.fetched_utc)(),
                jobs,
                transfers,
            },
            Err(err) => {
                dash_warn!("Fetch cycle {} failed: {}", cycle, err);
                Msg::CycleFailed {
                    cycle,
                    message: err.user_message(),
                }
            }
        }
    }

    async fn fetch_jobs_and_transfers(
        &self,
    ) -> Result<(Vec<Job>, HashMap<JobId, Transfer>), DashboardError> {
        let jobs = self.api.search_jobs().await.map_err(DashboardError::fetch)?;

        let lookups = jobs
            .iter()
            .filter(|job| job.resolved_status() == JobStatus::InProgress)
            .map(|job| {
                let job_id = job.job_id.clone();
                async move {
                    let result = self.api.active_transfer(&job_id).await;
                    (job_id, result)
                }
            });

        let mut transfers = HashMap::new();
        for (job_id, result) in join_all(lookups).await {
            match result {
                Ok(Some(transfer)) => {
                    transfers.insert(job_id, transfer);
                }
                Ok(None) => dash_debug!("Job {} is in progress without an active transfer", job_id),
                Err(err) => dash_warn!("Transfer lookup for job {} failed: {}", job_id, err),
            }
        }
        Ok((jobs, transfers))
    }
}
