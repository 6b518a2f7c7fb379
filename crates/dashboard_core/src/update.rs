use crate::{DashboardState, Effect, Msg, Notification};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: DashboardState, msg: Msg) -> (DashboardState, Vec<Effect>) {
    let effects = match msg {
        Msg::RefreshRequested(_origin) => match state.request_cycle() {
            Some(cycle) => vec![Effect::StartCycle { cycle }],
            None => Vec::new(),
        },
        Msg::CycleCompleted {
            cycle,
            fetched_utc,
            jobs,
            transfers,
        } => {
            if state.in_flight() != Some(cycle) {
                // Never started here, or already superseded.
                return (state, Vec::new());
            }
            let mut effects = Vec::new();
            if state.finish_cycle(cycle) {
                let snapshot = state.publish(cycle, fetched_utc, jobs, transfers);
                effects.push(Effect::Publish(snapshot));
            }
            if let Some(next) = state.take_pending_cycle() {
                effects.push(Effect::StartCycle { cycle: next });
            }
            effects
        }
        Msg::CycleFailed { cycle, message } => {
            if state.in_flight() != Some(cycle) {
                return (state, Vec::new());
            }
            state.finish_cycle(cycle);
            let notification = Notification::error(format!("Failed to refresh jobs: {message}"));
            state.set_notification(Some(notification.clone()));
            let mut effects = vec![Effect::Notify(notification)];
            if let Some(next) = state.take_pending_cycle() {
                effects.push(Effect::StartCycle { cycle: next });
            }
            effects
        }
        Msg::ActionSucceeded { job_id, action } => {
            let notification = Notification::info(format!("Requested {action} of job {job_id}"));
            state.set_notification(Some(notification.clone()));
            vec![Effect::Notify(notification), Effect::ScheduleSettleRefresh]
        }
        Msg::ActionFailed {
            job_id,
            action,
            message,
        } => {
            let notification =
                Notification::error(format!("Failed to {action} job {job_id}: {message}"));
            state.set_notification(Some(notification.clone()));
            vec![Effect::Notify(notification)]
        }
        Msg::NotificationDismissed => {
            if state.last_notification().is_some() {
                state.set_notification(None);
            }
            Vec::new()
        }
    };

    (state, effects)
}
