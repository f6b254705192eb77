//! Database schema and persisted record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
///
/// Each row holds one JSON document under a well-known key.
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

pub const KEY_ACCOUNTS: &str = "granxyAccounts";
pub const KEY_CURRENT_USER: &str = "granxyCurrentUser";
pub const KEY_BANNED_USERS: &str = "granxyBannedUsers";
pub const KEY_ADMIN_CHAT_ID: &str = "granxyAdminChatId";
pub const KEY_HOST_USERS: &str = "granxyHostUsers";
pub const KEY_APPS: &str = "granxyApps";

/// A store account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub nickname: String,
    pub email: String,
    pub password: String,
}

impl UserAccount {
    pub fn new(
        nickname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// A committed app listing
///
/// Only listings with both a file and an icon are considered published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub author: String,
    pub description: String,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub icon_id: Option<String>,
    #[serde(default)]
    pub screenshot_ids: Vec<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub size_mb: Option<f64>,
    #[serde(default)]
    pub repeatedly_published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl AppRecord {
    pub fn is_published(&self) -> bool {
        self.file_id.is_some() && self.icon_id.is_some()
    }

    /// Placeholder listing with no uploaded assets
    fn placeholder(name: &str, author: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            author: author.to_string(),
            description: description.to_string(),
            file_id: None,
            icon_id: None,
            screenshot_ids: Vec::new(),
            download_url: None,
            size_mb: None,
            repeatedly_published: false,
            published_at: None,
        }
    }
}

/// Accounts that exist on every fresh install
pub fn seed_accounts() -> Vec<UserAccount> {
    vec![
        UserAccount::new("Admin", "admin@granxy.com", "password123"),
        UserAccount::new("Tester", "tester@granxy.com", "password123"),
        UserAccount::new("JohnDoe", "johndoe@example.com", "password123"),
    ]
}

/// Listings shown before anything has been published
pub fn seed_apps() -> Vec<AppRecord> {
    [
        ("Flappy Bird Clone", "Admin", "A simple bird game."),
        ("Weather Now", "Tester", "Get the latest weather forecast."),
        ("Doodle Jump Ripoff", "JohnDoe", "Jump to the top!"),
        ("Super Note Taker", "Admin", "The best note taking app."),
        ("Granxy Run", "GranxyDev", "An endless runner game."),
        ("Photo Editor Pro", "Tester", "Edit your photos like a pro."),
        ("Space Invaders Classic", "Admin", "Defend the galaxy!"),
        ("Flashlight Free", "JohnDoe", "A very bright flashlight."),
    ]
    .into_iter()
    .map(|(name, author, description)| AppRecord::placeholder(name, author, description))
    .collect()
}
