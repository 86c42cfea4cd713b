use std::convert::TryFrom;

use rusqlite::{named_params, Connection, OptionalExtension, Row};

use crate::error::AppResult;

/// Key/value tables. Secrets go to `secure_settings`, already encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsTable {
    App,
    Secure,
}

impl SettingsTable {
    fn name(self) -> &'static str {
        match self {
            SettingsTable::App => "app_settings",
            SettingsTable::Secure => "secure_settings",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SettingRow {
    pub key: String,
    pub value: String,
    pub updated_at: String,
}

impl TryFrom<&Row<'_>> for SettingRow {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'_>) -> Result<Self, Self::Error> {
        Ok(Self {
            key: row.get("key")?,
            value: row.get("value")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

pub struct SettingsRepository;

impl SettingsRepository {
    pub fn get(conn: &Connection, table: SettingsTable, key: &str) -> AppResult<Option<SettingRow>> {
        let sql = format!(
            "SELECT key, value, updated_at FROM {} WHERE key = ?1",
            table.name()
        );
        let mut stmt = conn.prepare(&sql)?;

        let row = stmt
            .query_row([key], |row| SettingRow::try_from(row))
            .optional()?;

        Ok(row)
    }

    pub fn list(conn: &Connection, table: SettingsTable) -> AppResult<Vec<SettingRow>> {
        let sql = format!(
            "SELECT key, value, updated_at FROM {} ORDER BY key ASC",
            table.name()
        );
        let mut stmt = conn.prepare(&sql)?;

        let rows = stmt
            .query_map([], |row| SettingRow::try_from(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    pub fn upsert(conn: &Connection, table: SettingsTable, key: &str, value: &str) -> AppResult<()> {
        let sql = format!(
            r#"
                INSERT INTO {} (key, value)
                VALUES (:key, :value)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = CURRENT_TIMESTAMP
            "#,
            table.name()
        );
        conn.execute(&sql, named_params! {":key": key, ":value": value})?;

        Ok(())
    }

    /// Insert only when the key is absent; used to seed defaults.
    pub fn insert_default(
        conn: &Connection,
        table: SettingsTable,
        key: &str,
        value: &str,
    ) -> AppResult<bool> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (key, value) VALUES (?1, ?2)",
            table.name()
        );
        let inserted = conn.execute(&sql, [key, value])?;
        Ok(inserted > 0)
    }

    pub fn delete(conn: &Connection, table: SettingsTable, key: &str) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE key = ?1", table.name());
        conn.execute(&sql, [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../schema.sql")).unwrap();
        conn
    }

    #[test]
    fn tables_are_kept_apart() {
        let conn = memory_conn();
        SettingsRepository::upsert(&conn, SettingsTable::App, "api_base_url", "http://hr").unwrap();
        SettingsRepository::upsert(&conn, SettingsTable::Secure, "api_token", "v1:abc").unwrap();

        assert!(SettingsRepository::get(&conn, SettingsTable::App, "api_token")
            .unwrap()
            .is_none());
        let secure = SettingsRepository::get(&conn, SettingsTable::Secure, "api_token")
            .unwrap()
            .unwrap();
        assert_eq!(secure.value, "v1:abc");
    }

    #[test]
    fn upsert_overwrites_and_default_does_not() {
        let conn = memory_conn();
        assert!(SettingsRepository::insert_default(&conn, SettingsTable::App, "k", "1").unwrap());
        assert!(!SettingsRepository::insert_default(&conn, SettingsTable::App, "k", "2").unwrap());
        SettingsRepository::upsert(&conn, SettingsTable::App, "k", "3").unwrap();

        let rows = SettingsRepository::list(&conn, SettingsTable::App).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "3");

        SettingsRepository::delete(&conn, SettingsTable::App, "k").unwrap();
        assert!(SettingsRepository::list(&conn, SettingsTable::App)
            .unwrap()
            .is_empty());
    }
}
