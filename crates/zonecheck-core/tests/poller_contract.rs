//! Contract Test: Convergence Polling
//!
//! Verifies the terminal behaviour of `StatePoller`.
//!
//! Constraints verified:
//! - A zone already in the target state costs exactly one fetch and no sleep
//! - The attempt budget is a hard upper bound on fetches
//! - Timeouts report the last observed status
//! - ERROR is fatal immediately and never retried
//! - NotFound satisfies an absence wait; any other fetch error surfaces as-is
//! - Every fetch uses the configured show parameters (e.g. `all_projects`)

mod common;

use std::time::Duration;

use common::*;
use zonecheck_core::{
    Error, ErrorKind, ExpectedState, MemoryZoneService, PollOutcome, ShowParams, StatePoller,
    ZoneStatus,
};

#[tokio::test(start_paused = true)]
async fn already_converged_returns_after_one_fetch() {
    let client = ScriptedZoneClient::constant(ZoneStatus::Active);
    let poller = StatePoller::new(&fast_poll(10));

    let started = tokio::time::Instant::now();
    let zone = poller
        .wait_for_status(&client, "z1", ZoneStatus::Active)
        .await
        .expect("zone is already active");

    assert_eq!(zone.status, ZoneStatus::Active);
    assert_eq!(client.show_call_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO, "no sleep before the first fetch");
}

#[tokio::test(start_paused = true)]
async fn converges_after_pending_observations() {
    let client = ScriptedZoneClient::new(vec![
        Step::Status(ZoneStatus::Pending),
        Step::Status(ZoneStatus::Pending),
        Step::Status(ZoneStatus::Active),
    ]);
    let poller = StatePoller::new(&fast_poll(10));

    let started = tokio::time::Instant::now();
    poller
        .wait_for_status(&client, "z1", ZoneStatus::Active)
        .await
        .expect("zone converges on the third fetch");

    assert_eq!(client.show_call_count(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn timeout_is_bounded_and_reports_last_status() {
    let client = ScriptedZoneClient::constant(ZoneStatus::Pending);
    let poller = StatePoller::new(&fast_poll(4));

    let err = poller
        .wait_for_status(&client, "z1", ZoneStatus::Active)
        .await
        .unwrap_err();

    assert_eq!(client.show_call_count(), 4, "exactly max_attempts fetches");
    match err {
        Error::Timeout {
            resource_id,
            last_status,
            attempts,
            ..
        } => {
            assert_eq!(resource_id, "z1");
            assert_eq!(last_status, Some(ZoneStatus::Pending));
            assert_eq!(attempts, 4);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn error_status_is_fatal_without_retry() {
    let client = ScriptedZoneClient::new(vec![
        Step::Status(ZoneStatus::Pending),
        Step::Status(ZoneStatus::Error),
        Step::Status(ZoneStatus::Active),
    ]);
    let poller = StatePoller::new(&fast_poll(10));

    let err = poller
        .wait_for_status(&client, "z1", ZoneStatus::Active)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UnexpectedState);
    assert_eq!(client.show_call_count(), 2, "no fetch after ERROR");
}

#[tokio::test(start_paused = true)]
async fn waiting_for_error_converges_on_error() {
    let client = ScriptedZoneClient::new(vec![
        Step::Status(ZoneStatus::Pending),
        Step::Status(ZoneStatus::Error),
    ]);
    let poller = StatePoller::new(&fast_poll(10));

    let zone = poller
        .wait_for_status(&client, "z1", ZoneStatus::Error)
        .await
        .expect("ERROR is the target here");
    assert_eq!(zone.status, ZoneStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn absence_succeeds_on_not_found() {
    let client = ScriptedZoneClient::new(vec![
        Step::Status(ZoneStatus::Pending),
        Step::Status(ZoneStatus::Deleted),
        Step::Fail(Error::not_found("gone")),
    ]);
    let poller = StatePoller::new(&fast_poll(10));

    poller
        .wait_for_absence(&client, "z1")
        .await
        .expect("zone disappears on the third fetch");
    assert_eq!(client.show_call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn absence_times_out_while_zone_is_fetchable() {
    let client = ScriptedZoneClient::constant(ZoneStatus::Active);
    let poller = StatePoller::new(&fast_poll(3));

    let err = poller.wait_for_absence(&client, "z1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(client.show_call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn not_found_while_waiting_for_status_surfaces() {
    let client = ScriptedZoneClient::new(vec![Step::Fail(Error::not_found("gone"))]);
    let poller = StatePoller::new(&fast_poll(10));

    let err = poller
        .wait_for_status(&client, "z1", ZoneStatus::Active)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(client.show_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn other_fetch_errors_are_not_retried() {
    let client = ScriptedZoneClient::new(vec![
        Step::Status(ZoneStatus::Pending),
        Step::Fail(Error::server(503, "unavailable")),
        Step::Status(ZoneStatus::Active),
    ]);
    let poller = StatePoller::new(&fast_poll(10));

    let err = poller.wait_for_absence(&client, "z1").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Server);
    assert_eq!(client.show_call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn builder_overrides_budget_and_interval() {
    let client = ScriptedZoneClient::constant(ZoneStatus::Pending);
    let poller = StatePoller::new(&fast_poll(100))
        .with_attempts(3)
        .with_interval(Duration::from_millis(250));

    let started = tokio::time::Instant::now();
    let outcome = poller
        .poll(&client, "z1", ExpectedState::Status(ZoneStatus::Active))
        .await
        .expect("timeouts are an outcome, not an error");

    assert_eq!(
        outcome,
        PollOutcome::TimedOut {
            last_status: Some(ZoneStatus::Pending),
            attempts: 3,
        }
    );
    assert_eq!(started.elapsed(), Duration::from_millis(500), "no sleep after the last fetch");
}

#[tokio::test(start_paused = true)]
async fn show_params_apply_to_every_fetch() {
    let client = ScriptedZoneClient::new(vec![
        Step::Status(ZoneStatus::Pending),
        Step::Status(ZoneStatus::Active),
    ]);
    let poller = StatePoller::new(&fast_poll(10)).with_show_params(ShowParams::all_projects());

    poller
        .wait_for_status(&client, "z1", ZoneStatus::Active)
        .await
        .expect("zone converges on the second fetch");

    assert_eq!(
        client.show_params(),
        vec![ShowParams::all_projects(), ShowParams::all_projects()]
    );
}

#[tokio::test(start_paused = true)]
async fn admin_watches_other_tenant_zone_with_all_projects() {
    let service = MemoryZoneService::new();
    let owner = service.client(PRIMARY_TENANT);
    let admin = service.admin_client(ADMIN_TENANT);
    let id = owner.create_zone(&attrs("example.com.")).await.unwrap().body.id;

    // Without all_projects the admin cannot see another tenant's zone
    let err = StatePoller::new(&fast_poll(10))
        .wait_for_status(admin.as_ref(), &id, ZoneStatus::Active)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let zone = StatePoller::new(&fast_poll(10))
        .with_show_params(ShowParams::all_projects())
        .wait_for_status(admin.as_ref(), &id, ZoneStatus::Active)
        .await
        .unwrap();
    assert_eq!(zone.project_id.as_deref(), Some(PRIMARY_TENANT));
}
