use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::core::config::AppConfig;

const SLACK_AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";

/// User-token scopes needed to read identities and list conversations.
const USER_SCOPES: [&str; 5] = [
    "channels:read",
    "groups:read",
    "team:read",
    "users:read",
    "users:read.email",
];

#[must_use]
pub fn build_authorize_url(config: &AppConfig, state: &str) -> String {
    let scopes = utf8_percent_encode(&USER_SCOPES.join(","), NON_ALPHANUMERIC).to_string();
    let client_id = utf8_percent_encode(&config.slack_client_id, NON_ALPHANUMERIC).to_string();
    let state = utf8_percent_encode(state, NON_ALPHANUMERIC).to_string();

    let mut url =
        format!("{SLACK_AUTHORIZE_URL}?client_id={client_id}&user_scope={scopes}&state={state}");
    if let Some(redirect_url) = &config.slack_redirect_url {
        let redirect_uri = utf8_percent_encode(redirect_url, NON_ALPHANUMERIC).to_string();
        url.push_str(&format!("&redirect_uri={redirect_uri}"));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(redirect: Option<&str>) -> AppConfig {
        AppConfig {
            slack_client_id: "123.456".into(),
            slack_client_secret: "s".into(),
            slack_redirect_url: redirect.map(str::to_string),
            slack_invite_token: "t".into(),
            join_channel_id: "C1".into(),
            session_key: "k".into(),
            session_timeout_minutes: 60,
            recaptcha_secret: "r".into(),
            environment: "DEV".into(),
            store_param_prefix: "/p/".into(),
            conf_queue_url: "q".into(),
        }
    }

    #[test]
    fn authorize_url_carries_state_and_scopes() {
        let url = build_authorize_url(&config(None), "abc");
        assert!(url.starts_with("https://slack.com/oauth/v2/authorize?client_id=123%2E456"));
        assert!(url.contains("&state=abc"));
        assert!(url.contains("users%3Aread%2Eemail"));
        assert!(!url.contains("redirect_uri"));
    }

    #[test]
    fn authorize_url_encodes_redirect() {
        let url = build_authorize_url(&config(Some("https://x.example/auth")), "abc");
        assert!(url.ends_with("&redirect_uri=https%3A%2F%2Fx%2Eexample%2Fauth"));
    }
}
