//! Location reporter state machine: idempotent start, clean stop,
//! permission loss, identifier resolution.

mod common;

use std::time::Duration;

use common::{flat_profile, harness, nested_profile, token_without_expiry};
use ridebeacon::error::TrackingError;
use ridebeacon::traits::{PermissionGrant, PositionError};

#[tokio::test(start_paused = true)]
async fn start_is_idempotent() {
    // Two starts, one timer. Cycle counts prove it: an immediate
    // report plus one per interval, never doubled.
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;

    h.coordinator.reporter.start().await.unwrap();
    h.coordinator.reporter.start().await.unwrap();
    assert!(h.coordinator.reporter.status().is_tracking);

    tokio::time::sleep(Duration::from_secs(61)).await;

    // 1 immediate + 2 interval ticks; a second timer would double this.
    assert_eq!(h.location.position_calls(), 3);
    assert_eq!(h.primary.write_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn stop_prevents_further_cycles() {
    // After stop, advancing past several intervals produces nothing.
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;

    h.coordinator.reporter.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(31)).await;
    let cycles_before = h.location.position_calls();
    assert!(cycles_before >= 2);

    h.coordinator.reporter.stop();
    assert!(!h.coordinator.reporter.status().is_tracking);

    tokio::time::sleep(Duration::from_secs(180)).await;
    assert_eq!(h.location.position_calls(), cycles_before);

    // stop is idempotent.
    h.coordinator.reporter.stop();
}

#[tokio::test(start_paused = true)]
async fn start_without_permission_fails_clean() {
    // Permission denied: start fails, no timer, not tracking.
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;
    h.location.set_permissions(
        PermissionGrant::denied(true),
        PermissionGrant::denied(true),
    );

    let err = h.coordinator.reporter.start().await.unwrap_err();
    assert!(matches!(err, TrackingError::PermissionRequired { .. }));
    assert!(!h.coordinator.reporter.status().is_tracking);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.location.position_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn start_without_session_fails_clean() {
    let h = harness();
    let err = h.coordinator.reporter.start().await.unwrap_err();
    assert!(matches!(err, TrackingError::IdentityUnresolved { .. }));
    assert!(!h.coordinator.reporter.status().is_tracking);
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.location.position_calls(), 0, "failed start must not leave a timer");
}

#[tokio::test(start_paused = true)]
async fn start_resolves_nested_identifiers() {
    // vendor_id present only under account.vendor_id still resolves.
    let h = harness();
    h.seed_session(&token_without_expiry(), nested_profile()).await;

    h.coordinator.reporter.start().await.unwrap();

    let writes = h.primary.writes();
    assert_eq!(writes.len(), 1);
    // id=77 wins the driver chain, account.* supplies vendor and tenant.
    assert_eq!(writes[0].path, "drivers/t-9/5/77");
}

#[tokio::test(start_paused = true)]
async fn permission_loss_stops_tracking_asynchronously() {
    // No explicit stop anywhere; the monitor's poll notices revocation.
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;
    h.coordinator.reporter.start().await.unwrap();
    assert!(h.coordinator.reporter.status().is_tracking);

    h.location.set_permissions(
        PermissionGrant::denied(false),
        PermissionGrant::denied(false),
    );

    // Within one poll interval the loss is observed and tracking stops.
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(!h.coordinator.reporter.status().is_tracking);

    let cycles = h.location.position_calls();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.location.position_calls(), cycles);
}

#[tokio::test(start_paused = true)]
async fn fallback_cycle_still_updates_status() {
    // Primary signals unavailable, fallback succeeds; the
    // cycle counts as a success and last_known_location is populated.
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;
    h.primary
        .set_behavior(ridebeacon::adapters::mock::MockBehavior::Unavailable);

    h.coordinator.reporter.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(31)).await;

    let status = h.coordinator.reporter.status();
    assert!(status.is_tracking, "soft transport trouble never stops tracking");
    assert!(status.last_known_location.is_some());
    assert!(h.fallback.write_count() >= 2);
}

#[tokio::test(start_paused = true)]
async fn cycle_failures_never_kill_the_loop() {
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;
    h.location.set_position_error(Some(PositionError::Timeout {
        timeout: Duration::from_secs(15),
    }));

    h.coordinator.reporter.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(95)).await;

    // Every cycle failed, tracking still on, nothing published.
    assert!(h.coordinator.reporter.status().is_tracking);
    assert_eq!(h.primary.write_count(), 0);
    assert!(h.location.position_calls() >= 3);

    // The device recovers; the next tick publishes.
    h.location.set_position_error(None);
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(h.primary.write_count() >= 1);
    assert!(h.coordinator.reporter.status().last_known_location.is_some());
}

#[tokio::test(start_paused = true)]
async fn manual_report_resolves_fresh_identifiers() {
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;

    h.coordinator.reporter.report_once().await.unwrap();
    assert_eq!(h.primary.writes()[0].path, "drivers/t-1/v-1/d-1");
    let value = &h.primary.writes()[0].value;
    assert_eq!(value["manual_update"], true);

    // Profile changes between reports are picked up without a restart.
    h.seed_session(&token_without_expiry(), nested_profile()).await;
    h.coordinator.reporter.report_once().await.unwrap();
    assert_eq!(h.primary.writes()[1].path, "drivers/t-9/5/77");
}

#[tokio::test(start_paused = true)]
async fn manual_report_without_session_fails() {
    let h = harness();
    let err = h.coordinator.reporter.report_once().await.unwrap_err();
    assert!(matches!(err, TrackingError::IdentityUnresolved { .. }));
}

#[tokio::test(start_paused = true)]
async fn restart_after_stop_creates_a_fresh_loop() {
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;

    h.coordinator.reporter.start().await.unwrap();
    h.coordinator.reporter.stop();
    h.coordinator.reporter.start().await.unwrap();

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(h.coordinator.reporter.status().is_tracking);
    // 2 immediate (one per start) + 1 interval tick from the second loop.
    assert_eq!(h.location.position_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn logout_stops_tracking() {
    let h = harness();
    h.seed_session(&token_without_expiry(), flat_profile()).await;
    h.coordinator.reporter.start().await.unwrap();

    h.coordinator.logout().await;
    assert!(!h.coordinator.reporter.status().is_tracking);

    let cycles = h.location.position_calls();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.location.position_calls(), cycles);
}
