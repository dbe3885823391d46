use crate::db::models::DeviceFixture;
use crate::db::repositories::devices::DevicesRepository;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Seed the devices table from the legacy JSON fixture when it is empty.
///
/// A missing or malformed fixture is logged and skipped; startup never
/// fails because of seed data.
pub async fn seed_devices(pool: &Arc<SqlitePool>, fixture_path: &Path) -> Result<()> {
    let repo = DevicesRepository::new(Arc::clone(pool));

    if repo.count().await? > 0 {
        return Ok(());
    }

    let raw = match std::fs::read_to_string(fixture_path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(
                "Device fixture {:?} not readable, skipping seed: {}",
                fixture_path, e
            );
            return Ok(());
        }
    };

    let fixture: DeviceFixture = match serde_json::from_str(&raw) {
        Ok(fixture) => fixture,
        Err(e) => {
            error!("Failed to parse device fixture {:?}: {}", fixture_path, e);
            return Ok(());
        }
    };

    let now = Utc::now().to_rfc3339();
    let mut seeded = 0;
    for entry in fixture.devices {
        let device = entry.into_device(now.clone());
        if let Err(e) = repo.insert(&device).await {
            error!("Failed to seed device {}: {}", device.id, e);
            continue;
        }
        seeded += 1;
    }

    if seeded > 0 {
        info!("Seeded {} devices from {:?}", seeded, fixture_path);
    }

    Ok(())
}
