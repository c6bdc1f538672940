//! All Slack-specific functionality

pub mod client;

// Re-export main types for convenience
pub use client::{ChatPlatform, Conversation, OAuthAccess, SlackClient, TeamInfo, UserInfo};
