use std::time::Duration;

use httpmock::prelude::*;
use perfdesk_app_lib::commands::AppState;
use perfdesk_app_lib::db::DbPool;
use perfdesk_app_lib::error::AppError;
use perfdesk_app_lib::services::settings_service::{SettingsService, SettingsUpdateInput};
use perfdesk_app_lib::utils::crypto::{CryptoVault, KEY_LEN};
use serde_json::json;
use tempfile::TempDir;

const SECRET: [u8; KEY_LEN] = [9u8; KEY_LEN];

fn service_in(dir: &TempDir) -> SettingsService {
    let pool = DbPool::in_dir(dir.path()).expect("database should open");
    SettingsService::with_vault(pool, CryptoVault::with_master_secret(SECRET))
}

#[test]
fn settings_survive_a_restart() {
    let dir = TempDir::new().unwrap();
    {
        let service = service_in(&dir);
        service
            .update(SettingsUpdateInput {
                api_base_url: Some("https://hr.example.com/api/".into()),
                api_token: Some(Some("token-abcdef".into())),
                request_timeout_secs: Some(45),
                notification_poll_secs: Some(120),
                default_page_size: Some(50),
            })
            .unwrap();
    }

    let reopened = service_in(&dir);
    let settings = reopened.get().unwrap();
    assert_eq!(settings.api_base_url, "https://hr.example.com/api");
    assert_eq!(settings.request_timeout_secs, 45);
    assert_eq!(settings.notification_poll_secs, 120);
    assert_eq!(settings.default_page_size, 50);
    assert_eq!(settings.api_token.as_deref(), Some("********cdef"));
    assert_eq!(reopened.poll_interval().unwrap(), Duration::from_secs(120));
}

#[test]
fn token_is_unreadable_with_another_secret() {
    let dir = TempDir::new().unwrap();
    service_in(&dir)
        .update(SettingsUpdateInput {
            api_token: Some(Some("token-abcdef".into())),
            ..Default::default()
        })
        .unwrap();

    let pool = DbPool::in_dir(dir.path()).unwrap();
    let foreign = SettingsService::with_vault(pool, CryptoVault::with_master_secret([1u8; KEY_LEN]));
    assert!(foreign.get().unwrap().api_token.is_none());
}

#[test]
fn out_of_range_values_are_validation_errors() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let cases = [
        SettingsUpdateInput {
            request_timeout_secs: Some(0),
            ..Default::default()
        },
        SettingsUpdateInput {
            notification_poll_secs: Some(4),
            ..Default::default()
        },
        SettingsUpdateInput {
            default_page_size: Some(201),
            ..Default::default()
        },
        SettingsUpdateInput {
            api_base_url: Some("not a url".into()),
            ..Default::default()
        },
        SettingsUpdateInput {
            api_token: Some(Some("   ".into())),
            ..Default::default()
        },
    ];

    for input in cases {
        let err = service.update(input).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }), "got {err:?}");
    }

    let settings = service_in(&dir).get().unwrap();
    assert_eq!(settings.request_timeout_secs, 30);
    assert_eq!(settings.default_page_size, 20);
}

#[tokio::test]
async fn updated_settings_reach_the_live_backend() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/companies")
                .header("authorization", "Bearer fresh-token");
            then.status(200).json_body(json!([{"id": 1, "name": "Initech"}]));
        })
        .await;

    let dir = TempDir::new().unwrap();
    let pool = DbPool::in_dir(dir.path()).unwrap();
    let state = AppState::with_settings(pool, service_in(&dir)).unwrap();

    state
        .update_settings(SettingsUpdateInput {
            api_base_url: Some(server.base_url()),
            api_token: Some(Some("fresh-token".into())),
            notification_poll_secs: Some(90),
            ..Default::default()
        })
        .unwrap();

    let companies = state.directory().companies().await.unwrap();
    assert_eq!(companies[0].name, "Initech");
    mock.assert_async().await;
    assert_eq!(state.notifications().interval(), Duration::from_secs(90));

    let cleared = state.clear_api_token().unwrap();
    assert!(cleared.api_token.is_none());
    assert!(state.backend().config().unwrap().api_token.is_none());
}

#[tokio::test]
async fn list_page_size_follows_saved_settings() {
    let dir = TempDir::new().unwrap();
    let pool = DbPool::in_dir(dir.path()).unwrap();
    let state = AppState::with_settings(pool, service_in(&dir)).unwrap();
    assert_eq!(state.default_page_size().await.unwrap(), 20);

    state
        .update_settings(SettingsUpdateInput {
            default_page_size: Some(75),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(state.default_page_size().await.unwrap(), 75);

    let reopened = DbPool::in_dir(dir.path()).unwrap();
    let fresh = AppState::with_settings(reopened, service_in(&dir)).unwrap();
    assert_eq!(fresh.default_page_size().await.unwrap(), 75);
}
