use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::{SettingsRepository, SettingsTable};
use crate::error::AppResult;
use crate::services::hr_api::{DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::services::listing::DEFAULT_PAGE_SIZE;
use crate::services::notification_poller::DEFAULT_POLL_INTERVAL_SECS;

const USER_VERSION: i32 = 2;

#[derive(Debug)]
pub struct MigrationInfo {
    pub version: i32,
    pub description: String,
    pub applied_at: DateTime<Utc>,
}

pub fn run(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS migration_history (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL,
            rollback_sql TEXT
        );
        "#,
    )?;

    let mut current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version < 1 {
        info!(target: "app::db", version = current_version, "running migration v1");
        migrate_to_v1(conn)?;
        current_version = 1;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(conn, 1, "Seed default backend settings", None)?;
    }

    if current_version < 2 {
        info!(target: "app::db", version = current_version, "running migration v2");
        migrate_to_v2(conn)?;
        current_version = 2;
        conn.execute(&format!("PRAGMA user_version = {}", current_version), [])?;
        record_migration(
            conn,
            2,
            "Add updated_at index on settings tables",
            Some(
                r#"
                DROP INDEX IF EXISTS idx_app_settings_updated_at;
                DROP INDEX IF EXISTS idx_secure_settings_updated_at;
                "#,
            ),
        )?;
    }

    if current_version != USER_VERSION {
        conn.execute(&format!("PRAGMA user_version = {}", USER_VERSION), [])?;
    }

    Ok(())
}

fn record_migration(
    conn: &Connection,
    version: i32,
    description: &str,
    rollback_sql: Option<&str>,
) -> AppResult<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO migration_history (version, description, applied_at, rollback_sql) VALUES (?, ?, ?, ?)",
        (version, description, now, rollback_sql),
    )?;
    Ok(())
}

pub fn rollback_to_version(conn: &Connection, target_version: i32) -> AppResult<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if target_version >= current_version {
        warn!(
            target: "app::db",
            target_version,
            current_version,
            "rollback target is not below the current version"
        );
        return Ok(());
    }

    let mut stmt = conn.prepare(
        "SELECT version, rollback_sql FROM migration_history WHERE version > ? ORDER BY version DESC",
    )?;
    let scripts = stmt
        .query_map([target_version], |row| {
            Ok((row.get::<_, i32>(0)?, row.get::<_, Option<String>>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (version, rollback_sql) in scripts {
        match rollback_sql {
            Some(sql) => {
                info!(target: "app::db", version, "rolling back migration");
                conn.execute_batch(&sql)?;
            }
            None => warn!(target: "app::db", version, "no rollback script for migration"),
        }
    }

    conn.execute(&format!("PRAGMA user_version = {}", target_version), [])?;
    conn.execute(
        "DELETE FROM migration_history WHERE version > ?",
        [target_version],
    )?;

    Ok(())
}

pub fn get_migration_history(conn: &Connection) -> AppResult<Vec<MigrationInfo>> {
    let mut stmt = conn.prepare(
        "SELECT version, description, applied_at FROM migration_history ORDER BY version",
    )?;

    let migrations = stmt
        .query_map([], |row| {
            let applied_at_str: String = row.get(2)?;
            let applied_at = DateTime::parse_from_rfc3339(&applied_at_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "applied_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Utc);

            Ok(MigrationInfo {
                version: row.get(0)?,
                description: row.get(1)?,
                applied_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(migrations)
}

fn migrate_to_v1(conn: &Connection) -> AppResult<()> {
    let defaults = [
        ("api_base_url", DEFAULT_API_BASE_URL.to_string()),
        ("request_timeout_secs", DEFAULT_HTTP_TIMEOUT_SECS.to_string()),
        ("notification_poll_secs", DEFAULT_POLL_INTERVAL_SECS.to_string()),
        ("default_page_size", DEFAULT_PAGE_SIZE.to_string()),
    ];
    for (key, value) in defaults {
        SettingsRepository::insert_default(conn, SettingsTable::App, key, &value)?;
    }
    Ok(())
}

fn migrate_to_v2(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_app_settings_updated_at
            ON app_settings(updated_at);
        CREATE INDEX IF NOT EXISTS idx_secure_settings_updated_at
            ON secure_settings(updated_at);
        "#,
    )?;
    Ok(())
}
