use super::cache::{Actor, AlertCache, DeviceCache};
use crate::db::models::{Alert, AlertStatus, Device, DeviceStatus, GeoPoint};

fn alert(id: &str, status: AlertStatus) -> Alert {
    Alert {
        id: id.to_string(),
        timestamp: "2025-06-01T10:00:00Z".to_string(),
        kind: "weapon_detected".to_string(),
        weapon: "handgun".to_string(),
        confidence: 0.91,
        status,
        location: Some(GeoPoint {
            lat: 51.1605,
            lng: 71.4704,
        }),
        camera_id: Some("CAM-001".to_string()),
        snapshot: None,
        notes: Some(String::new()),
        officer: None,
        escalated_by: None,
    }
}

fn device(id: &str, status: DeviceStatus) -> Device {
    Device {
        id: id.to_string(),
        kind: "camera".to_string(),
        name: "Main Entrance".to_string(),
        status,
        last_seen: "2025-06-01T10:00:00Z".to_string(),
    }
}

fn officer() -> Actor {
    Actor {
        id: "u-2".to_string(),
        display_name: "Officer on duty".to_string(),
    }
}

#[test]
fn confirming_response_clears_the_lock() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    cache.begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()));
    assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Escalated);
    assert_eq!(
        cache.pending_status("A-10001"),
        Some(AlertStatus::Escalated)
    );

    cache.complete_status_change(alert("A-10001", AlertStatus::Escalated));
    assert!(cache.pending_status("A-10001").is_none());
    assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Escalated);
}

#[test]
fn stale_data_never_unpins_the_displayed_status() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    cache.begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()));

    // Any number of stale broadcasts still carrying the old status.
    for _ in 0..3 {
        cache.apply_update(alert("A-10001", AlertStatus::Active));
        assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Escalated);
        assert_eq!(
            cache.pending_status("A-10001"),
            Some(AlertStatus::Escalated)
        );
    }

    // A confirming broadcast finally releases it.
    cache.apply_update(alert("A-10001", AlertStatus::Escalated));
    assert!(cache.pending_status("A-10001").is_none());
}

#[test]
fn stale_data_still_merges_other_fields_while_pinned() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    cache.begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()));

    let mut stale = alert("A-10001", AlertStatus::Active);
    stale.notes = Some("two suspects on camera".to_string());
    stale.snapshot = Some("/snapshots/snap-1.jpg".to_string());
    cache.apply_update(stale);

    let shown = cache.get("A-10001").unwrap();
    assert_eq!(shown.status, AlertStatus::Escalated);
    assert_eq!(shown.notes.as_deref(), Some("two suspects on camera"));
    assert_eq!(shown.snapshot.as_deref(), Some("/snapshots/snap-1.jpg"));
}

#[test]
fn local_escalation_attaches_the_acting_officer() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    cache.begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()));

    let shown = cache.get("A-10001").unwrap();
    assert_eq!(shown.officer.as_deref(), Some("Officer on duty"));
    assert_eq!(shown.escalated_by.as_deref(), Some("u-2"));
}

#[test]
fn out_of_order_responses_resolve_to_the_last_locally_issued_value() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    // First change: escalate. Second change, issued before the first
    // response arrives: decline. The lock now belongs to `declined`.
    cache.begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()));
    cache.begin_status_change("A-10001", AlertStatus::Declined, None);

    // The first request's response returns late and confirms `escalated`;
    // the display must stay on the newest local value.
    cache.complete_status_change(alert("A-10001", AlertStatus::Escalated));
    assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Declined);
    assert_eq!(cache.pending_status("A-10001"), Some(AlertStatus::Declined));

    // Only its own confirmation resolves it.
    cache.complete_status_change(alert("A-10001", AlertStatus::Declined));
    assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Declined);
    assert!(cache.pending_status("A-10001").is_none());
}

#[test]
fn failed_request_rolls_back_and_releases_the_lock() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    let prior = cache
        .begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()))
        .unwrap();
    cache.fail_status_change("A-10001", AlertStatus::Escalated, prior);

    assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Active);
    assert!(cache.pending_status("A-10001").is_none());
}

#[test]
fn failure_of_a_superseded_request_changes_nothing() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    let first_prior = cache
        .begin_status_change("A-10001", AlertStatus::Escalated, Some(&officer()))
        .unwrap();
    cache.begin_status_change("A-10001", AlertStatus::Declined, None);

    // The older escalation request fails, but the lock has moved on.
    cache.fail_status_change("A-10001", AlertStatus::Escalated, first_prior);

    assert_eq!(cache.get("A-10001").unwrap().status, AlertStatus::Declined);
    assert_eq!(cache.pending_status("A-10001"), Some(AlertStatus::Declined));
}

#[test]
fn snapshot_merge_inserts_unknown_alerts() {
    let mut cache = AlertCache::new();
    assert!(cache.is_empty());
    cache.merge_snapshot(vec![
        alert("A-10001", AlertStatus::Active),
        alert("A-10002", AlertStatus::Resolved),
    ]);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("A-10002").unwrap().status, AlertStatus::Resolved);
}

#[test]
fn new_alert_broadcasts_prepend() {
    let mut cache = AlertCache::new();
    cache.merge_snapshot(vec![alert("A-10001", AlertStatus::Active)]);

    cache.apply_new_alert(alert("A-10002", AlertStatus::Active));

    assert_eq!(cache.alerts()[0].id, "A-10002");
    assert_eq!(cache.len(), 2);
}

#[test]
fn device_toggle_confirms_and_merges() {
    let mut cache = DeviceCache::new();
    cache.merge_snapshot(vec![device("CAM-001", DeviceStatus::Online)]);

    let target = cache.begin_toggle("CAM-001").unwrap();
    assert_eq!(target, DeviceStatus::Offline);
    assert_eq!(cache.get("CAM-001").unwrap().status, DeviceStatus::Offline);

    let mut confirmed = device("CAM-001", DeviceStatus::Offline);
    confirmed.last_seen = "2025-06-01T10:05:00Z".to_string();
    cache.complete_toggle(confirmed);

    let shown = cache.get("CAM-001").unwrap();
    assert_eq!(shown.status, DeviceStatus::Offline);
    assert_eq!(shown.last_seen, "2025-06-01T10:05:00Z");
}

#[test]
fn device_toggle_rolls_back_exactly_when_the_request_fails() {
    let mut cache = DeviceCache::new();
    cache.merge_snapshot(vec![device("CAM-001", DeviceStatus::Online)]);

    cache.begin_toggle("CAM-001");
    cache.fail_toggle("CAM-001");
    assert_eq!(cache.get("CAM-001").unwrap().status, DeviceStatus::Online);

    // A successful round trip does not roll back.
    cache.begin_toggle("CAM-001");
    cache.complete_toggle(device("CAM-001", DeviceStatus::Offline));
    assert_eq!(cache.get("CAM-001").unwrap().status, DeviceStatus::Offline);
}

#[test]
fn stale_device_broadcast_stays_pinned_to_the_toggle_target() {
    let mut cache = DeviceCache::new();
    cache.merge_snapshot(vec![device("CAM-001", DeviceStatus::Online)]);

    cache.begin_toggle("CAM-001");

    // A concurrent broadcast still carrying the old status.
    cache.apply_update(device("CAM-001", DeviceStatus::Online));
    assert_eq!(cache.get("CAM-001").unwrap().status, DeviceStatus::Offline);

    // The confirming broadcast releases the pin.
    cache.apply_update(device("CAM-001", DeviceStatus::Offline));
    cache.apply_update(device("CAM-001", DeviceStatus::Online));
    assert_eq!(cache.get("CAM-001").unwrap().status, DeviceStatus::Online);
}

#[test]
fn unknown_device_broadcast_inserts_at_front() {
    let mut cache = DeviceCache::new();
    cache.merge_snapshot(vec![device("CAM-001", DeviceStatus::Online)]);

    cache.apply_update(device("SENSOR-002", DeviceStatus::Offline));

    assert_eq!(cache.devices()[0].id, "SENSOR-002");
    assert_eq!(cache.len(), 2);
}
