use crate::db::migrations;
use crate::db::models::{
    AlertStatus, CreateAlertRequest, Device, DeviceStatus, GeoPoint, LocationInput,
    UpdateAlertRequest, UpdateDeviceRequest,
};
use crate::db::repositories::alerts::AlertsRepository;
use crate::db::repositories::devices::DevicesRepository;
use crate::db::repositories::users::UsersRepository;
use crate::error::Error;
use crate::security::password;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

// One connection only: every pooled connection to `sqlite::memory:` would
// otherwise open its own private database.
async fn test_pool() -> Arc<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    migrations::run_migrations(&pool).await.expect("migrations");
    Arc::new(pool)
}

#[tokio::test]
async fn create_applies_ingestion_defaults() {
    let repo = AlertsRepository::new(test_pool().await);

    let alert = repo
        .create(&CreateAlertRequest::default())
        .await
        .expect("created");

    assert_eq!(alert.status, AlertStatus::Active);
    assert_eq!(alert.kind, "unknown");
    assert_eq!(alert.weapon, "unknown");
    assert_eq!(alert.confidence, 0.0);
    assert_eq!(alert.camera_id.as_deref(), Some("unknown"));
    assert_eq!(alert.notes.as_deref(), Some(""));
    assert!(alert.location.is_none());
    assert!(alert.officer.is_none());

    // Server-generated identifier: "A-" followed by five digits.
    assert_eq!(alert.id.len(), 7);
    assert!(alert.id.starts_with("A-"));
    assert!(alert.id[2..].chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn create_honors_explicit_fields() {
    let repo = AlertsRepository::new(test_pool().await);

    let req = CreateAlertRequest {
        timestamp: Some("2025-06-01T10:00:00Z".to_string()),
        kind: Some("weapon_detected".to_string()),
        weapon: Some("rifle".to_string()),
        confidence: Some(0.87),
        status: Some(AlertStatus::Escalated),
        camera_id: Some("CAM-003".to_string()),
        notes: Some("north gate".to_string()),
        location: Some(LocationInput::Point(GeoPoint {
            lat: 51.1605,
            lng: 71.4704,
        })),
        ..Default::default()
    };

    let alert = repo.create(&req).await.expect("created");

    assert_eq!(alert.timestamp, "2025-06-01T10:00:00Z");
    assert_eq!(alert.status, AlertStatus::Escalated);
    assert_eq!(alert.kind, "weapon_detected");
    assert_eq!(
        alert.location,
        Some(GeoPoint {
            lat: 51.1605,
            lng: 71.4704,
        })
    );

    // The stored row shapes back identically.
    let fetched = repo
        .get_by_id(&alert.id)
        .await
        .expect("queried")
        .expect("stored");
    assert_eq!(fetched, alert);
}

#[tokio::test]
async fn create_decodes_json_encoded_location() {
    let repo = AlertsRepository::new(test_pool().await);

    let req = CreateAlertRequest {
        location: Some(LocationInput::Encoded(
            r#"{"lat": 43.238, "lng": 76.889}"#.to_string(),
        )),
        ..Default::default()
    };

    let alert = repo.create(&req).await.expect("created");
    assert_eq!(
        alert.location,
        Some(GeoPoint {
            lat: 43.238,
            lng: 76.889,
        })
    );
}

#[tokio::test]
async fn flat_coordinates_win_over_nested() {
    let req = CreateAlertRequest {
        location_lat: Some(1.0),
        location_lng: Some(2.0),
        location: Some(LocationInput::Point(GeoPoint { lat: 9.0, lng: 9.0 })),
        ..Default::default()
    };

    assert_eq!(
        req.resolved_location(),
        Some(GeoPoint { lat: 1.0, lng: 2.0 })
    );
}

#[tokio::test]
async fn unparsable_encoded_location_is_ignored() {
    let req = CreateAlertRequest {
        location: Some(LocationInput::Encoded("not json".to_string())),
        ..Default::default()
    };

    assert!(req.resolved_location().is_none());
}

#[tokio::test]
async fn update_unknown_alert_is_not_found() {
    let repo = AlertsRepository::new(test_pool().await);

    let err = repo
        .update("A-00000", &UpdateAlertRequest::default())
        .await
        .expect_err("unknown id");

    match err.downcast_ref::<Error>() {
        Some(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn update_preserves_absent_fields() {
    let repo = AlertsRepository::new(test_pool().await);

    let created = repo
        .create(&CreateAlertRequest {
            kind: Some("weapon_detected".to_string()),
            weapon: Some("handgun".to_string()),
            confidence: Some(0.91),
            notes: Some("first report".to_string()),
            snapshot: Some("/snapshots/snap-1.jpg".to_string()),
            ..Default::default()
        })
        .await
        .expect("created");

    let (updated, _) = repo
        .update(
            &created.id,
            &UpdateAlertRequest {
                status: Some(AlertStatus::Declined),
                ..Default::default()
            },
        )
        .await
        .expect("updated");

    assert_eq!(updated.status, AlertStatus::Declined);
    assert_eq!(updated.notes.as_deref(), Some("first report"));
    assert_eq!(updated.snapshot.as_deref(), Some("/snapshots/snap-1.jpg"));
    assert_eq!(updated.kind, "weapon_detected");
    assert_eq!(updated.weapon, "handgun");
    assert_eq!(updated.confidence, 0.91);
}

#[tokio::test]
async fn update_overwrites_with_explicit_empty_string() {
    let repo = AlertsRepository::new(test_pool().await);

    let created = repo
        .create(&CreateAlertRequest {
            notes: Some("first report".to_string()),
            ..Default::default()
        })
        .await
        .expect("created");

    let (updated, _) = repo
        .update(
            &created.id,
            &UpdateAlertRequest {
                notes: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .expect("updated");

    assert_eq!(updated.notes.as_deref(), Some(""));
}

#[tokio::test]
async fn update_clears_nullable_field_with_explicit_null() {
    let repo = AlertsRepository::new(test_pool().await);

    let created = repo
        .create(&CreateAlertRequest {
            snapshot: Some("/snapshots/snap-1.jpg".to_string()),
            ..Default::default()
        })
        .await
        .expect("created");

    // The wire shape `{"snapshot": null}` deserializes to `Some(None)`.
    let changes: UpdateAlertRequest =
        serde_json::from_str(r#"{"snapshot": null}"#).expect("payload");
    assert_eq!(changes.snapshot, Some(None));

    let (updated, _) = repo.update(&created.id, &changes).await.expect("updated");
    assert!(updated.snapshot.is_none());
}

#[tokio::test]
async fn update_reports_prior_status_for_escalation_tracking() {
    let repo = AlertsRepository::new(test_pool().await);

    let created = repo
        .create(&CreateAlertRequest::default())
        .await
        .expect("created");

    let escalate = UpdateAlertRequest {
        status: Some(AlertStatus::Escalated),
        escalated_by: Some(Some("u-2".to_string())),
        escalated_by_name: Some(Some("Officer on duty".to_string())),
        ..Default::default()
    };

    let (updated, prior) = repo.update(&created.id, &escalate).await.expect("updated");
    assert_eq!(prior, AlertStatus::Active);
    assert_eq!(updated.status, AlertStatus::Escalated);
    assert_eq!(updated.officer.as_deref(), Some("Officer on duty"));
    assert_eq!(updated.escalated_by.as_deref(), Some("u-2"));

    // Re-submitting the same status reports the escalated prior, which is
    // how the caller avoids a second notification.
    let (_, prior) = repo.update(&created.id, &escalate).await.expect("updated");
    assert_eq!(prior, AlertStatus::Escalated);
}

#[tokio::test]
async fn alerts_are_listed_newest_first() {
    let repo = AlertsRepository::new(test_pool().await);

    for timestamp in [
        "2025-06-01T08:00:00Z",
        "2025-06-01T10:00:00Z",
        "2025-06-01T09:00:00Z",
    ] {
        repo.create(&CreateAlertRequest {
            timestamp: Some(timestamp.to_string()),
            ..Default::default()
        })
        .await
        .expect("created");
    }

    let alerts = repo.get_all().await.expect("listed");
    let timestamps: Vec<&str> = alerts.iter().map(|a| a.timestamp.as_str()).collect();
    assert_eq!(
        timestamps,
        vec![
            "2025-06-01T10:00:00Z",
            "2025-06-01T09:00:00Z",
            "2025-06-01T08:00:00Z",
        ]
    );
}

#[tokio::test]
async fn list_devices_on_empty_store_is_empty() {
    let repo = DevicesRepository::new(test_pool().await);
    assert!(repo.get_all().await.expect("listed").is_empty());
}

#[tokio::test]
async fn update_unknown_device_is_not_found() {
    let repo = DevicesRepository::new(test_pool().await);

    let err = repo
        .update("CAM-404", &UpdateDeviceRequest::default())
        .await
        .expect_err("unknown id");

    match err.downcast_ref::<Error>() {
        Some(Error::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn device_update_merges_and_stamps_last_seen() {
    let repo = DevicesRepository::new(test_pool().await);

    repo.insert(&Device {
        id: "CAM-001".to_string(),
        kind: "camera".to_string(),
        name: "Main Entrance".to_string(),
        status: DeviceStatus::Online,
        last_seen: "2025-01-01T00:00:00Z".to_string(),
    })
    .await
    .expect("seeded");

    let updated = repo
        .update(
            "CAM-001",
            &UpdateDeviceRequest {
                status: Some(DeviceStatus::Offline),
                ..Default::default()
            },
        )
        .await
        .expect("updated");

    assert_eq!(updated.status, DeviceStatus::Offline);
    assert_eq!(updated.name, "Main Entrance");
    assert_eq!(updated.kind, "camera");
    // Stamped unconditionally, whatever the payload contained.
    assert_ne!(updated.last_seen, "2025-01-01T00:00:00Z");
}

#[tokio::test]
async fn default_admin_is_seeded_with_verifiable_password() {
    let repo = UsersRepository::new(test_pool().await);

    let admin = repo
        .get_by_username("admin")
        .await
        .expect("queried")
        .expect("seeded admin");

    assert_eq!(admin.role, "admin");
    assert!(password::verify_password("admin", &admin.password_hash).expect("verified"));
    assert!(!password::verify_password("wrong", &admin.password_hash).expect("verified"));
}
