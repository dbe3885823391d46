use anyhow::Result;
use chrono::Utc;
use sqlx::{Executor, SqlitePool};
use tracing::info;

use crate::security::password;

/// Migration scripts, embedded at compile time and applied in order. Every
/// script must be idempotent (`IF NOT EXISTS`).
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_create_users",
        include_str!("sql/0001_create_users.sql"),
    ),
    (
        "0002_create_alerts",
        include_str!("sql/0002_create_alerts.sql"),
    ),
    (
        "0003_create_devices",
        include_str!("sql/0003_create_devices.sql"),
    ),
    ("0004_add_indexes", include_str!("sql/0004_add_indexes.sql")),
];

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    for (name, sql) in MIGRATIONS {
        pool.execute(*sql).await?;
        info!("Applied migration: {}", name);
    }

    create_default_admin(pool).await?;

    Ok(())
}

/// Create default admin user if no users exist
async fn create_default_admin(pool: &SqlitePool) -> Result<()> {
    let user_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count == 0 {
        // Default password "admin" should be changed immediately.
        let password_hash = password::hash_password("admin", 10)?;

        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, role, name, full_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind("u-1")
        .bind("admin")
        .bind(password_hash)
        .bind("admin")
        .bind("Admin")
        .bind("Administrator")
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await?;

        info!("Created default admin user");
    }

    Ok(())
}
