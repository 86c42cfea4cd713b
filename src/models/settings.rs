use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub api_base_url: String,
    /// Masked token; the clear value never leaves the settings service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    pub notification_poll_secs: u64,
    pub default_page_size: usize,
    pub updated_at: String,
}
