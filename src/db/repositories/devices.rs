use crate::db::models::{Device, UpdateDeviceRequest};
use crate::error::Error;
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

const DEVICE_COLUMNS: &str = "id, type, name, status, last_seen";

/// Devices repository for handling device operations
#[derive(Clone)]
pub struct DevicesRepository {
    pool: Arc<SqlitePool>,
}

impl DevicesRepository {
    /// Create a new devices repository
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Full snapshot. An empty store yields an empty list.
    pub async fn get_all(&self) -> Result<Vec<Device>> {
        let result = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices ORDER BY id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get devices: {}", e)))?;

        Ok(result)
    }

    /// Get device by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Device>> {
        let result = sqlx::query_as::<_, Device>(&format!(
            "SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get device by ID: {}", e)))?;

        Ok(result)
    }

    /// Number of stored devices, used to decide whether to seed.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count devices: {}", e)))?;

        Ok(count)
    }

    /// Insert a device record, used by startup seeding.
    pub async fn insert(&self, device: &Device) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO devices ({DEVICE_COLUMNS}) VALUES (?, ?, ?, ?, ?)"
        ))
        .bind(&device.id)
        .bind(&device.kind)
        .bind(&device.name)
        .bind(device.status)
        .bind(&device.last_seen)
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to insert device: {}", e)))?;

        Ok(())
    }

    /// Merge partial fields over the existing row. `last_seen` is stamped to
    /// the current time on every update, whatever the payload contains.
    pub async fn update(&self, id: &str, changes: &UpdateDeviceRequest) -> Result<Device> {
        let existing = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Device not found: {}", id)))?;

        let next_kind = changes.kind.clone().unwrap_or(existing.kind);
        let next_name = changes.name.clone().unwrap_or(existing.name);
        let next_status = changes.status.unwrap_or(existing.status);
        let last_seen = Utc::now().to_rfc3339();

        let device = sqlx::query_as::<_, Device>(&format!(
            r#"
            UPDATE devices
            SET type = ?, name = ?, status = ?, last_seen = ?
            WHERE id = ?
            RETURNING {DEVICE_COLUMNS}
            "#
        ))
        .bind(&next_kind)
        .bind(&next_name)
        .bind(next_status)
        .bind(&last_seen)
        .bind(id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update device: {}", e)))?;

        info!("Updated device {} ({})", id, device.status);

        Ok(device)
    }
}
