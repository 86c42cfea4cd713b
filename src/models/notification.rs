use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub items: Vec<Notification>,
    pub unread: usize,
    pub fetched_at: Option<String>,
}

impl NotificationSnapshot {
    pub fn from_items(items: Vec<Notification>, fetched_at: String) -> Self {
        let unread = items.iter().filter(|item| !item.read).count();
        Self {
            items,
            unread,
            fetched_at: Some(fetched_at),
        }
    }
}
