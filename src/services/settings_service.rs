use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use reqwest::Url;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::{SettingRow, SettingsRepository, SettingsTable};
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::settings::AppSettings;
use crate::services::hr_api::{BackendConfig, DEFAULT_API_BASE_URL, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::services::listing::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::services::notification_poller::{DEFAULT_POLL_INTERVAL_SECS, MIN_POLL_INTERVAL_SECS};
use crate::utils::crypto::CryptoVault;

const KEY_API_BASE_URL: &str = "api_base_url";
const KEY_API_TOKEN: &str = "api_token";
const KEY_REQUEST_TIMEOUT: &str = "request_timeout_secs";
const KEY_NOTIFICATION_POLL: &str = "notification_poll_secs";
const KEY_DEFAULT_PAGE_SIZE: &str = "default_page_size";

const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
const MAX_POLL_INTERVAL_SECS: u64 = 3600;

/// Partial update; `api_token: Some(None)` clears the stored token.
#[derive(Debug, Default, Clone)]
pub struct SettingsUpdateInput {
    pub api_base_url: Option<String>,
    pub api_token: Option<Option<String>>,
    pub request_timeout_secs: Option<u64>,
    pub notification_poll_secs: Option<u64>,
    pub default_page_size: Option<usize>,
}

pub struct SettingsService {
    db: DbPool,
    vault: CryptoVault,
    cache: RwLock<Option<AppSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> AppResult<Self> {
        let vault = CryptoVault::from_database_path(db.path())?;
        Ok(Self::with_vault(db, vault))
    }

    pub fn with_vault(db: DbPool, vault: CryptoVault) -> Self {
        Self {
            db,
            vault,
            cache: RwLock::new(None),
        }
    }

    pub fn get(&self) -> AppResult<AppSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.as_ref() {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db()?;
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, input: SettingsUpdateInput) -> AppResult<AppSettings> {
        let mut current = self.get()?;

        let base_url = input
            .api_base_url
            .as_deref()
            .map(normalize_base_url)
            .transpose()?;
        if let Some(value) = base_url.as_ref() {
            current.api_base_url = value.clone();
        }

        if let Some(secs) = input.request_timeout_secs {
            ensure_in_range("Request timeout", secs, 1, MAX_REQUEST_TIMEOUT_SECS)?;
            current.request_timeout_secs = secs;
        }

        if let Some(secs) = input.notification_poll_secs {
            ensure_in_range(
                "Notification poll interval",
                secs,
                MIN_POLL_INTERVAL_SECS,
                MAX_POLL_INTERVAL_SECS,
            )?;
            current.notification_poll_secs = secs;
        }

        if let Some(size) = input.default_page_size {
            ensure_in_range("Default page size", size as u64, 1, MAX_PAGE_SIZE as u64)?;
            current.default_page_size = size;
        }

        let token = self.prepare_token_instruction(&input)?;
        match &token {
            TokenInstruction::Set { masked, .. } => current.api_token = Some(masked.clone()),
            TokenInstruction::Clear => current.api_token = None,
            TokenInstruction::NoChange => {}
        }

        self.db.with_connection(|conn| {
            match &token {
                TokenInstruction::Set { ciphertext, .. } => {
                    SettingsRepository::upsert(conn, SettingsTable::Secure, KEY_API_TOKEN, ciphertext)?;
                }
                TokenInstruction::Clear => {
                    SettingsRepository::delete(conn, SettingsTable::Secure, KEY_API_TOKEN)?;
                }
                TokenInstruction::NoChange => {}
            }

            if let Some(value) = base_url.as_deref() {
                SettingsRepository::upsert(conn, SettingsTable::App, KEY_API_BASE_URL, value)?;
            }
            if let Some(value) = input.request_timeout_secs {
                SettingsRepository::upsert(
                    conn,
                    SettingsTable::App,
                    KEY_REQUEST_TIMEOUT,
                    &value.to_string(),
                )?;
            }
            if let Some(value) = input.notification_poll_secs {
                SettingsRepository::upsert(
                    conn,
                    SettingsTable::App,
                    KEY_NOTIFICATION_POLL,
                    &value.to_string(),
                )?;
            }
            if let Some(value) = input.default_page_size {
                SettingsRepository::upsert(
                    conn,
                    SettingsTable::App,
                    KEY_DEFAULT_PAGE_SIZE,
                    &value.to_string(),
                )?;
            }
            Ok(())
        })?;

        current.updated_at = Utc::now().to_rfc3339();
        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(current.clone());
        }
        info!(target: "app::settings", "settings updated");

        Ok(current)
    }

    pub fn clear_token(&self) -> AppResult<()> {
        self.db.with_connection(|conn| {
            SettingsRepository::delete(conn, SettingsTable::Secure, KEY_API_TOKEN)
        })?;

        if let Err(err) = self.vault.clear_master_secret() {
            warn!(
                target: "app::settings",
                error = %err,
                "failed to clear master secret from system keyring"
            );
        }

        if let Ok(mut guard) = self.cache.write() {
            if let Some(settings) = guard.as_mut() {
                settings.api_token = None;
                settings.updated_at = Utc::now().to_rfc3339();
            }
        }

        Ok(())
    }

    /// Connection settings for the HR backend: stored values, then
    /// `PERFDESK_*` environment overrides.
    pub fn backend_config(&self) -> AppResult<BackendConfig> {
        let settings = self.get()?;
        let api_token = self.load_token()?;
        Ok(BackendConfig {
            base_url: settings.api_base_url,
            api_token,
            http_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
        .apply_env())
    }

    pub fn poll_interval(&self) -> AppResult<Duration> {
        Ok(Duration::from_secs(self.get()?.notification_poll_secs))
    }

    fn load_token(&self) -> AppResult<Option<String>> {
        let row = self.db.with_connection(|conn| {
            SettingsRepository::get(conn, SettingsTable::Secure, KEY_API_TOKEN)
        })?;
        match row {
            Some(row) => match self.vault.decrypt_str(&row.value) {
                Ok(token) => Ok(Some(token)),
                Err(err) => {
                    warn!(target: "app::settings", error = %err, "failed to decrypt stored api token");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn prepare_token_instruction(&self, input: &SettingsUpdateInput) -> AppResult<TokenInstruction> {
        match &input.api_token {
            None => Ok(TokenInstruction::NoChange),
            Some(None) => Ok(TokenInstruction::Clear),
            Some(Some(value)) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(AppError::validation("API token must not be empty"));
                }
                Ok(TokenInstruction::Set {
                    ciphertext: self.vault.encrypt_str(trimmed)?,
                    masked: mask_token(trimmed),
                })
            }
        }
    }

    fn load_settings_from_db(&self) -> AppResult<AppSettings> {
        let (rows, token_row) = self.db.with_connection(|conn| {
            let rows = SettingsRepository::list(conn, SettingsTable::App)?;
            let token = SettingsRepository::get(conn, SettingsTable::Secure, KEY_API_TOKEN)?;
            Ok((rows, token))
        })?;

        let mut latest_updated_at: Option<String> = None;
        let mut map: HashMap<String, SettingRow> = HashMap::new();
        for row in rows.into_iter().chain(token_row.clone()) {
            if latest_updated_at.as_deref().map_or(true, |current| current < row.updated_at.as_str()) {
                latest_updated_at = Some(row.updated_at.clone());
            }
            map.insert(row.key.clone(), row);
        }

        let api_token = token_row.and_then(|row| match self.vault.decrypt_str(&row.value) {
            Ok(plain) => Some(mask_token(&plain)),
            Err(err) => {
                warn!(target: "app::settings", error = %err, "failed to decrypt stored api token");
                None
            }
        });

        let api_base_url = map
            .get(KEY_API_BASE_URL)
            .and_then(|row| normalize_base_url(&row.value).ok())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let request_timeout_secs = parse_setting(&map, KEY_REQUEST_TIMEOUT)
            .filter(|secs| (1..=MAX_REQUEST_TIMEOUT_SECS).contains(secs))
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let notification_poll_secs = parse_setting(&map, KEY_NOTIFICATION_POLL)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
            .max(MIN_POLL_INTERVAL_SECS);

        let default_page_size = parse_setting(&map, KEY_DEFAULT_PAGE_SIZE)
            .map(|size| size as usize)
            .filter(|size| (1..=MAX_PAGE_SIZE).contains(size))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(AppSettings {
            api_base_url,
            api_token,
            request_timeout_secs,
            notification_poll_secs,
            default_page_size,
            updated_at: latest_updated_at.unwrap_or_else(|| Utc::now().to_rfc3339()),
        })
    }
}

fn parse_setting(map: &HashMap<String, SettingRow>, key: &str) -> Option<u64> {
    let row = map.get(key)?;
    match row.value.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(target: "app::settings", key, value = %row.value, "ignoring unparsable setting");
            None
        }
    }
}

fn normalize_base_url(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed)
        .map_err(|err| AppError::validation(format!("Invalid API base URL: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::validation("API base URL must use http or https"));
    }
    Ok(trimmed.to_string())
}

fn ensure_in_range(label: &str, value: u64, min: u64, max: u64) -> AppResult<()> {
    if !(min..=max).contains(&value) {
        return Err(AppError::validation(format!(
            "{label} must be between {min} and {max}"
        )));
    }
    Ok(())
}

fn mask_token(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}

#[derive(Debug, Clone)]
enum TokenInstruction {
    Set { ciphertext: String, masked: String },
    Clear,
    NoChange,
}
