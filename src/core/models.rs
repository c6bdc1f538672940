use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-team selection of the conversations the bot monitors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub channels: Vec<String>,
    pub groups: Vec<String>,
    pub verbose_channels: Vec<String>,
    pub verbose_groups: Vec<String>,
    pub im: bool,
    pub verbose_im: bool,
    pub regexp: String,
    pub all: bool,
}

/// Lifetime of an OAuth state between redirect and callback.
pub const OAUTH_STATE_TTL_MINUTES: i64 = 5;

/// Anti-CSRF token handed to Slack for one login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthState {
    pub state: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub email_domain: String,
    pub domain: String,
    pub plan: String,
    pub external_id: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Slack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub team: String,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
    pub status: UserStatus,
    pub real_name: String,
    pub email: String,
    pub is_bot: bool,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_primary_owner: bool,
    pub is_restricted: bool,
    pub is_ultra_restricted: bool,
    pub external_id: String,
    pub token: String,
    pub created: DateTime<Utc>,
}

/// Message pushed to the bot whenever a team saves its configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfUpdate {
    pub team: String,
    pub configuration: Configuration,
}
