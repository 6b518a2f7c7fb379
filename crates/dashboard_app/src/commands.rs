use std::future::Future;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{SecondsFormat, Utc};
use dashboard_core::{JobId, Notification, RefreshOrigin, DELETE_CONFIRMATION};
use dashboard_engine::{DashboardEngine, EngineConfig, Reconciler};
use dashboard_logging::{dash_info, dash_warn};
use tokio::sync::broadcast::error::RecvError;

use crate::render::render_dashboard;

/// Control operation selected on the command line.
pub enum Control {
    Start,
    Pause,
    Resume,
    Retrigger,
    Delete { confirmation: String },
}

pub fn build_engine(config: EngineConfig) -> Result<DashboardEngine> {
    let timestamper = Arc::new(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
    DashboardEngine::new(config, timestamper).context("failed to set up the HTTP client")
}

pub async fn list(engine: &DashboardEngine) -> Result<()> {
    let reconciler = engine.reconciler();
    reconciler.refresh(RefreshOrigin::User).await;
    let view = reconciler.view();
    if let Some(notification) = view.last_notification.as_ref().filter(|n| n.is_error()) {
        bail!("{}", notification.message);
    }
    print!("{}", render_dashboard(&view));
    Ok(())
}

pub async fn watch(engine: &DashboardEngine) -> Result<()> {
    watch_until(engine, tokio::signal::ctrl_c()).await
}

/// Redraws on every published snapshot until `shutdown` completes.
async fn watch_until<F: Future>(engine: &DashboardEngine, shutdown: F) -> Result<()> {
    let reconciler = engine.reconciler();
    let mut snapshots = reconciler.subscribe();
    let mut notifications = reconciler.notifications();
    let poller = engine.start_polling();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                // Clear the screen and home the cursor before redrawing.
                print!("\x1b[2J\x1b[H{}", render_dashboard(&reconciler.view()));
                io::stdout().flush().ok();
            }
            received = notifications.recv() => match received {
                Ok(notification) => report(&notification),
                Err(RecvError::Lagged(skipped)) => {
                    dash_warn!("Dropped {} notifications", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            _ = &mut shutdown => {
                dash_info!("Interrupted; stopping");
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

/// Runs one control operation, then waits for the settle refresh and prints it.
pub async fn control(
    engine: &DashboardEngine,
    control: Control,
    job_id: &str,
    settle_wait: Duration,
) -> Result<()> {
    let reconciler = engine.reconciler();
    let job_id = JobId::new(job_id);
    let mut snapshots = reconciler.subscribe();

    let outcome = run_control(reconciler, &control, &job_id).await;
    if let Some(notification) = reconciler.view().last_notification {
        report(&notification);
    }
    outcome?;

    match tokio::time::timeout(settle_wait, snapshots.changed()).await {
        Ok(Ok(())) => print!("{}", render_dashboard(&reconciler.view())),
        Ok(Err(_)) => {}
        Err(_) => dash_warn!("No refreshed job list within {:?}", settle_wait),
    }
    Ok(())
}

async fn run_control(
    reconciler: &Arc<Reconciler>,
    control: &Control,
    job_id: &JobId,
) -> Result<(), dashboard_engine::DashboardError> {
    match control {
        Control::Start => reconciler.start_job(job_id).await,
        Control::Pause => reconciler.pause_job(job_id).await,
        Control::Resume => reconciler.resume_job(job_id).await,
        Control::Retrigger => reconciler.retrigger_job(job_id).await,
        Control::Delete { confirmation } => reconciler.delete_job(job_id, confirmation).await,
    }
}

pub fn prompt_confirmation(job_id: &str) -> Result<String> {
    let stdin = io::stdin();
    read_confirmation(job_id, &mut stdin.lock(), &mut io::stderr())
}

fn read_confirmation(
    job_id: &str,
    input: &mut impl BufRead,
    prompt: &mut impl Write,
) -> Result<String> {
    write!(prompt, "Type {DELETE_CONFIRMATION} to delete job {job_id}: ")?;
    prompt.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn report(notification: &Notification) {
    if notification.is_error() {
        eprintln!("error: {}", notification.message);
    } else {
        eprintln!("{}", notification.message);
    }
}
