mod common;

use std::time::Duration;

use common::{
    api_path, engine, grant_token, init_logging, job_json, path_of, search_returns, token_path,
    transfer_json, ScriptedTransport,
};
use dashboard_core::{JobId, JobStatus, NotificationLevel, RefreshOrigin};
use dashboard_engine::{BearerToken, DashboardError, FailureKind, Method, RequestBody};
use futures_util::join;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn successful_cycle_publishes_jobs_with_transfers() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(
        &transport,
        vec![job_json("a", "IN_PROGRESS"), job_json("b", "READY")],
    );
    transport.respond(
        Method::Get,
        &api_path("/jobs/a/transfers"),
        200,
        json!({"items": [transfer_json(250, 1000)]}),
    );
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();
    let mut updates = reconciler.subscribe();

    reconciler.refresh(RefreshOrigin::User).await;

    let snapshot = reconciler.snapshot().expect("published");
    assert_eq!(snapshot.cycle, 1);
    assert_eq!(snapshot.fetched_utc, "2026-10-17T12:00:00Z");
    assert_eq!(snapshot.rows.len(), 2);
    let a = snapshot.row(&JobId::new("a")).unwrap();
    assert_eq!(a.derived.status, JobStatus::InProgress);
    assert_eq!(a.derived.percent_complete, Some(25));
    assert!(snapshot.row(&JobId::new("b")).unwrap().transfer.is_none());
    assert_eq!(snapshot.stats.in_progress, 1);
    assert_eq!(snapshot.stats.ready, 1);

    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().as_ref().map(|s| s.cycle), Some(1));

    // Only the in-progress job had its transfer looked up.
    assert_eq!(transport.count(Method::Get, &api_path("/jobs/b/transfers")), 0);
    let lookup = &transport.requests_to(Method::Get, &api_path("/jobs/a/transfers"))[0];
    assert!(lookup.url.ends_with("/jobs/a/transfers?state=IN_PROGRESS"));
    assert_eq!(lookup.bearer, Some(BearerToken::new("tok-1")));
}

#[tokio::test]
async fn search_body_sorts_by_last_modified_descending() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(&transport, vec![]);
    let engine = engine(transport.clone());

    engine.reconciler().refresh(RefreshOrigin::Timer).await;

    let search = &transport.requests_to(Method::Post, &api_path("/jobs/search"))[0];
    assert_eq!(
        search.body,
        RequestBody::Json(json!({"sortBy": "lastModifiedOn", "sortOrder": "DESC", "limit": 100}))
    );
}

#[tokio::test]
async fn jobs_with_null_fields_or_bad_shape_do_not_sink_the_cycle() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(
        &transport,
        vec![
            job_json("a", "READY"),
            json!({"jobId": "b", "name": null, "activeAlerts": null, "actions": null, "triggers": null}),
            json!({"name": "no id", "status": "READY"}),
        ],
    );
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    reconciler.refresh(RefreshOrigin::Timer).await;

    let snapshot = reconciler.snapshot().expect("published");
    assert_eq!(snapshot.rows.len(), 2);
    let b = snapshot.row(&JobId::new("b")).unwrap();
    assert_eq!(b.job.name, "");
    assert_eq!(b.derived.status, JobStatus::Ready);
    assert_eq!(snapshot.stats.with_alerts, 0);
    assert!(reconciler.view().last_notification.is_none());
}

#[tokio::test]
async fn failed_cycle_keeps_previous_snapshot_and_notifies() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(&transport, vec![job_json("a", "READY")]);
    transport.respond(
        Method::Post,
        &api_path("/jobs/search"),
        503,
        json!({"message": "maintenance window"}),
    );
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();
    let mut notifications = reconciler.notifications();

    reconciler.refresh(RefreshOrigin::User).await;
    let first = reconciler.snapshot().expect("first cycle published");

    reconciler.refresh(RefreshOrigin::User).await;
    let after_failure = reconciler.snapshot().expect("snapshot survives");
    assert!(std::sync::Arc::ptr_eq(&first, &after_failure));

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(notification.message.contains("maintenance window"));
    assert_eq!(reconciler.view().last_notification, Some(notification));
}

#[tokio::test]
async fn failed_transfer_lookup_only_drops_that_transfer() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(
        &transport,
        vec![job_json("a", "IN_PROGRESS"), job_json("b", "IN_PROGRESS")],
    );
    transport.respond(
        Method::Get,
        &api_path("/jobs/a/transfers"),
        200,
        json!({"items": [transfer_json(500, 1000)]}),
    );
    transport.fail(Method::Get, &api_path("/jobs/b/transfers"), FailureKind::Timeout);
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    reconciler.refresh(RefreshOrigin::User).await;

    let snapshot = reconciler.snapshot().expect("cycle still published");
    assert_eq!(snapshot.rows.len(), 2);
    let a = snapshot.row(&JobId::new("a")).unwrap();
    let b = snapshot.row(&JobId::new("b")).unwrap();
    assert_eq!(a.derived.percent_complete, Some(50));
    assert!(b.transfer.is_none());
    assert_eq!(b.derived.status, JobStatus::InProgress);
}

#[tokio::test(start_paused = true)]
async fn overlapping_refreshes_coalesce_into_one_follow_up() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(&transport, vec![job_json("a", "READY")]);
    transport.set_delay(Duration::from_millis(20));
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    join!(
        reconciler.refresh(RefreshOrigin::Timer),
        reconciler.refresh(RefreshOrigin::User),
        reconciler.refresh(RefreshOrigin::User),
    );

    assert_eq!(transport.count(Method::Post, &api_path("/jobs/search")), 2);
    assert_eq!(reconciler.snapshot().unwrap().cycle, 2);
    assert!(!reconciler.view().refreshing);
}

#[tokio::test(start_paused = true)]
async fn abandoned_refresh_still_finishes_its_cycle() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(&transport, vec![job_json("a", "READY")]);
    transport.set_delay(Duration::from_secs(5));
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    let abandoned =
        tokio::time::timeout(Duration::from_secs(1), reconciler.refresh(RefreshOrigin::User)).await;
    assert!(abandoned.is_err());
    assert!(reconciler.view().refreshing);

    // Queued behind the abandoned cycle, so it returns at once.
    reconciler.refresh(RefreshOrigin::User).await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(reconciler.snapshot().map(|s| s.cycle), Some(2));
    assert_eq!(transport.count(Method::Post, &api_path("/jobs/search")), 2);
    assert!(!reconciler.view().refreshing);

    reconciler.refresh(RefreshOrigin::User).await;
    assert_eq!(reconciler.snapshot().map(|s| s.cycle), Some(3));
    assert_eq!(transport.count(Method::Post, &api_path("/jobs/search")), 3);
}

#[tokio::test]
async fn unauthorized_response_drops_cached_token() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    grant_token(&transport, "tok-2", 3600);
    transport.respond(
        Method::Post,
        &api_path("/jobs/search"),
        401,
        json!({"error": "token revoked"}),
    );
    search_returns(&transport, vec![]);
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    reconciler.refresh(RefreshOrigin::User).await;
    assert!(reconciler.snapshot().is_none());

    reconciler.refresh(RefreshOrigin::User).await;
    assert!(reconciler.snapshot().is_some());
    assert_eq!(transport.count(Method::Post, token_path()), 2);
    let searches = transport.requests_to(Method::Post, &api_path("/jobs/search"));
    assert_eq!(searches[1].bearer, Some(BearerToken::new("tok-2")));
}

#[tokio::test]
async fn delete_requires_exact_confirmation() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    transport.respond(Method::Delete, &api_path("/jobs/a"), 204, json!(null));
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();
    let job = JobId::new("a");

    let err = reconciler.delete_job(&job, "delete").await.unwrap_err();
    assert!(matches!(err, DashboardError::Confirmation(_)));
    assert!(transport.requests().is_empty());
    assert_eq!(
        reconciler.view().last_notification.map(|n| n.level),
        Some(NotificationLevel::Error)
    );

    reconciler.delete_job(&job, "DELETE").await.unwrap();
    assert_eq!(transport.count(Method::Delete, &api_path("/jobs/a")), 1);
}

#[tokio::test]
async fn pause_switches_to_manual_trigger_and_keeps_actions() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    let current = job_json("a", "IN_PROGRESS");
    transport.respond(Method::Get, &api_path("/jobs/a"), 200, current.clone());
    transport.respond(Method::Patch, &api_path("/jobs/a"), 200, current.clone());
    let engine = engine(transport.clone());

    engine.reconciler().pause_job(&JobId::new("a")).await.unwrap();

    let patches = transport.requests_to(Method::Patch, &api_path("/jobs/a"));
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0].body,
        RequestBody::Json(json!({
            "paused": true,
            "actions": current["actions"],
            "triggers": [{"type": "MANUAL"}]
        }))
    );
}

#[tokio::test]
async fn resume_restores_hot_folder_trigger() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    let current = job_json("a", "READY");
    transport.respond(Method::Get, &api_path("/jobs/a"), 200, current.clone());
    transport.respond(Method::Patch, &api_path("/jobs/a"), 200, current.clone());
    let engine = engine(transport.clone());

    engine.reconciler().resume_job(&JobId::new("a")).await.unwrap();

    let patch = &transport.requests_to(Method::Patch, &api_path("/jobs/a"))[0];
    let RequestBody::Json(body) = &patch.body else {
        panic!("expected a json body, got {:?}", patch.body);
    };
    assert_eq!(body["paused"], json!(false));
    assert_eq!(body["triggers"][0]["type"], json!("HOT_FOLDER"));
    assert_eq!(
        body["triggers"][0]["events"],
        json!(["CREATED", "MODIFIED", "RENAMED"])
    );
}

#[tokio::test]
async fn start_patches_status_in_progress() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    transport.respond(Method::Patch, &api_path("/jobs/a"), 200, json!({}));
    let engine = engine(transport.clone());

    engine.reconciler().start_job(&JobId::new("a")).await.unwrap();

    let patch = &transport.requests_to(Method::Patch, &api_path("/jobs/a"))[0];
    assert_eq!(patch.body, RequestBody::Json(json!({"status": "IN_PROGRESS"})));
    assert_eq!(transport.count(Method::Get, &api_path("/jobs/a")), 0);
}

#[tokio::test]
async fn failed_action_surfaces_upstream_message() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    transport.respond(
        Method::Patch,
        &api_path("/jobs/a"),
        409,
        json!({"message": "job is locked by another operator"}),
    );
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    let err = reconciler.start_job(&JobId::new("a")).await.unwrap_err();
    match &err {
        DashboardError::Action { source, .. } => assert_eq!(source.status(), Some(409)),
        other => panic!("expected an action error, got {other:?}"),
    }
    let notification = reconciler.view().last_notification.unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(notification.message.starts_with("Failed to start job a:"));
    assert!(notification.message.contains("job is locked by another operator"));
}

#[tokio::test(start_paused = true)]
async fn successful_action_schedules_a_settle_refresh() {
    init_logging();
    let transport = ScriptedTransport::new();
    grant_token(&transport, "tok-1", 3600);
    search_returns(&transport, vec![job_json("a", "IN_PROGRESS")]);
    transport.respond(Method::Patch, &api_path("/jobs/a"), 200, json!({}));
    transport.respond(
        Method::Get,
        &api_path("/jobs/a/transfers"),
        200,
        json!({"items": []}),
    );
    let engine = engine(transport.clone());
    let reconciler = engine.reconciler();

    reconciler.start_job(&JobId::new("a")).await.unwrap();
    assert_eq!(transport.count(Method::Post, &api_path("/jobs/search")), 0);

    tokio::time::sleep(Duration::from_millis(1400)).await;
    assert_eq!(transport.count(Method::Post, &api_path("/jobs/search")), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.count(Method::Post, &api_path("/jobs/search")), 1);
    assert_eq!(reconciler.snapshot().map(|s| s.cycle), Some(1));

    let paths: Vec<String> = transport.requests().iter().map(|r| path_of(&r.url)).collect();
    assert_eq!(paths.first().map(String::as_str), Some(token_path()));
}
