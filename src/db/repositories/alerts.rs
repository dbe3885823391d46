use crate::db::models::{Alert, AlertRow, AlertStatus, CreateAlertRequest, UpdateAlertRequest};
use crate::error::Error;
use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::info;

const ALERT_COLUMNS: &str = "id, timestamp, type, weapon, confidence, status, location_lat, \
                             location_lng, camera_id, snapshot, notes, escalated_by, escalated_by_name";

/// Alerts repository for handling alert operations
#[derive(Clone)]
pub struct AlertsRepository {
    pool: Arc<SqlitePool>,
}

impl AlertsRepository {
    /// Create a new alerts repository
    pub fn new(pool: Arc<SqlitePool>) -> Self {
        Self { pool }
    }

    /// Create a new alert, applying ingestion defaults for absent fields.
    pub async fn create(&self, req: &CreateAlertRequest) -> Result<Alert> {
        let timestamp = req
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339());
        let kind = req.kind.clone().unwrap_or_else(|| "unknown".to_string());
        let weapon = req.weapon.clone().unwrap_or_else(|| "unknown".to_string());
        let confidence = req.confidence.unwrap_or(0.0);
        let status = req.status.unwrap_or(AlertStatus::Active);
        let camera_id = req
            .camera_id
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let notes = req.notes.clone().unwrap_or_default();
        let location = req.resolved_location();

        // Fresh ids collide only in the rare birthday case; retry on the
        // unique constraint instead of surfacing a 500.
        let mut attempts = 0;
        loop {
            attempts += 1;
            let id = generate_alert_id();

            let result = sqlx::query_as::<_, AlertRow>(&format!(
                r#"
                INSERT INTO alerts ({ALERT_COLUMNS})
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING {ALERT_COLUMNS}
                "#
            ))
            .bind(&id)
            .bind(&timestamp)
            .bind(&kind)
            .bind(&weapon)
            .bind(confidence)
            .bind(status)
            .bind(location.map(|p| p.lat))
            .bind(location.map(|p| p.lng))
            .bind(&camera_id)
            .bind(&req.snapshot)
            .bind(&notes)
            .bind(Option::<String>::None)
            .bind(Option::<String>::None)
            .fetch_one(&*self.pool)
            .await;

            match result {
                Ok(row) => {
                    info!("Created alert {}", row.id);
                    return Ok(Alert::from(row));
                }
                Err(sqlx::Error::Database(db)) if attempts < 3 && db.is_unique_violation() => {
                    continue;
                }
                Err(e) => {
                    return Err(Error::Database(format!("Failed to create alert: {}", e)).into())
                }
            }
        }
    }

    /// Get alert by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Alert>> {
        let result = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get alert by ID: {}", e)))?;

        Ok(result.map(Alert::from))
    }

    /// Full snapshot, newest first.
    pub async fn get_all(&self) -> Result<Vec<Alert>> {
        let result = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY datetime(timestamp) DESC"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get alerts: {}", e)))?;

        Ok(result.into_iter().map(Alert::from).collect())
    }

    /// Partial update with present-key merge semantics: absent fields keep
    /// their stored value, present fields overwrite it. Returns the shaped
    /// record together with the status the row held before the update, so
    /// the caller can detect the escalation transition.
    pub async fn update(
        &self,
        id: &str,
        changes: &UpdateAlertRequest,
    ) -> Result<(Alert, AlertStatus)> {
        let existing = sqlx::query_as::<_, AlertRow>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to get alert by ID: {}", e)))?
        .ok_or_else(|| Error::NotFound(format!("Alert not found: {}", id)))?;

        let prior_status = existing.status;

        let next_status = changes.status.unwrap_or(existing.status);
        let next_notes = changes.notes.clone().or(existing.notes);
        let next_snapshot = match &changes.snapshot {
            Some(value) => value.clone(),
            None => existing.snapshot,
        };
        let next_escalated_by = match &changes.escalated_by {
            Some(value) => value.clone(),
            None => existing.escalated_by,
        };
        let next_escalated_by_name = match &changes.escalated_by_name {
            Some(value) => value.clone(),
            None => existing.escalated_by_name,
        };

        let row = sqlx::query_as::<_, AlertRow>(&format!(
            r#"
            UPDATE alerts
            SET status = ?, notes = ?, snapshot = ?, escalated_by = ?, escalated_by_name = ?
            WHERE id = ?
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(next_status)
        .bind(&next_notes)
        .bind(&next_snapshot)
        .bind(&next_escalated_by)
        .bind(&next_escalated_by_name)
        .bind(id)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update alert: {}", e)))?;

        info!("Updated alert {} ({} -> {})", id, prior_status, row.status);

        Ok((Alert::from(row), prior_status))
    }
}

/// Server-generated alert identifier: `A-` followed by five digits.
fn generate_alert_id() -> String {
    let number: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("A-{}", number)
}
