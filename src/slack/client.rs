//! Slack API client module
//!
//! Encapsulates the Slack Web API calls the handlers need, with retry on
//! transport failures and uniform handling of `ok: false` responses.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::{SlackApiToken, SlackApiTokenValue};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{info, warn};

use crate::errors::ServiceError;

const SLACK_API_BASE: &str = "https://slack.com/api";

/// Page size requested from `conversations.list`.
const LIST_PAGE_LIMIT: &str = "200";

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a ServiceError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Result of exchanging an OAuth code for a user token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthAccess {
    pub access_token: String,
    pub user_id: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TeamInfo {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub email_domain: String,
    pub plan: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    pub email: Option<String>,
    pub real_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub real_name: Option<String>,
    pub profile: UserProfile,
    pub is_bot: bool,
    pub is_admin: bool,
    pub is_owner: bool,
    pub is_primary_owner: bool,
    pub is_restricted: bool,
    pub is_ultra_restricted: bool,
}

impl UserInfo {
    #[must_use]
    pub fn display_real_name(&self) -> String {
        self.real_name
            .clone()
            .or_else(|| self.profile.real_name.clone())
            .unwrap_or_default()
    }
}

/// A public channel or private group as listed by `conversations.list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub is_member: bool,
}

#[derive(Debug, Deserialize)]
struct ConversationsPage {
    #[serde(default)]
    channels: Vec<Conversation>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

#[derive(Debug, Deserialize)]
struct TeamInfoResponse {
    team: TeamInfo,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    user: UserInfo,
}

/// Operations the handlers perform against the chat platform.
///
/// Every call except `oauth_access` runs with the token passed in, so a
/// single client serves all users.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn oauth_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<OAuthAccess, ServiceError>;

    /// Slack user ID the token belongs to.
    async fn auth_test(&self, token: &str) -> Result<String, ServiceError>;

    async fn team_info(&self, token: &str) -> Result<TeamInfo, ServiceError>;

    async fn user_info(&self, token: &str, user_id: &str) -> Result<UserInfo, ServiceError>;

    async fn list_channels(&self, token: &str) -> Result<Vec<Conversation>, ServiceError>;

    async fn list_groups(&self, token: &str) -> Result<Vec<Conversation>, ServiceError>;

    /// Invite `email` into the workspace with access to `channel_id`.
    async fn invite_email(
        &self,
        token: &str,
        email: &str,
        channel_id: &str,
    ) -> Result<(), ServiceError>;
}

/// Slack API client with retry logic and error handling
#[derive(Debug, Default, Clone)]
pub struct SlackClient;

impl SlackClient {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ServiceError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        // Slack-level errors (invalid_auth, missing_scope, ...) will not fix themselves.
        RetryIf::spawn(strategy, operation, |e: &ServiceError| {
            matches!(e, ServiceError::HttpError(_))
        })
        .await
    }

    /// Issue a Web API call and return the body once Slack reports `ok: true`.
    ///
    /// Transport errors and 5xx/429 responses are retried unless the method
    /// must not be sent twice.
    async fn call(
        &self,
        method: &str,
        token: Option<&str>,
        form: &[(&str, &str)],
    ) -> Result<Value, ServiceError> {
        if !retries_allowed(method) {
            return self.call_once(method, token, form).await;
        }
        self.with_retry(|| self.call_once(method, token, form)).await
    }

    async fn call_once(
        &self,
        method: &str,
        token: Option<&str>,
        form: &[(&str, &str)],
    ) -> Result<Value, ServiceError> {
        let mut req = HTTP_CLIENT
            .post(format!("{SLACK_API_BASE}/{method}"))
            .form(form);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ServiceError::HttpError(format!("{method} request: {e}")))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let wait = parse_retry_after(resp.headers());
            warn!(
                "Slack rate limited {} (429), waiting {}s before retry",
                method,
                wait.as_secs()
            );
            tokio::time::sleep(wait).await;
            return Err(ServiceError::HttpError(format!("{method} rate limited")));
        }
        if resp.status().is_server_error() {
            return Err(ServiceError::HttpError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }
        if !resp.status().is_success() {
            return Err(ServiceError::ApiError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ServiceError::ParseError(format!("{method} parse: {e}")))?;

        check_ok(method, body)
    }

    async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        token: Option<&str>,
        form: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let body = self.call(method, token, form).await?;
        serde_json::from_value(body)
            .map_err(|e| ServiceError::ParseError(format!("{method} shape: {e}")))
    }

    async fn list_conversations(
        &self,
        token: &str,
        types: &str,
    ) -> Result<Vec<Conversation>, ServiceError> {
        let mut all = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut form = vec![
                ("types", types),
                ("exclude_archived", "true"),
                ("limit", LIST_PAGE_LIMIT),
            ];
            if !cursor.is_empty() {
                form.push(("cursor", cursor.as_str()));
            }

            let page: ConversationsPage = self
                .call_as("conversations.list", Some(token), &form)
                .await?;
            all.extend(page.channels);

            match page.response_metadata {
                Some(meta) if !meta.next_cursor.is_empty() => cursor = meta.next_cursor,
                _ => break,
            }
        }
        Ok(all)
    }
}

/// OAuth codes are single-use: a replayed exchange fails with `invalid_code`.
fn retries_allowed(method: &str) -> bool {
    method != "oauth.v2.access"
}

/// Wait requested by a 429 response, one second when absent or unreadable.
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Duration {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map_or(Duration::from_secs(1), Duration::from_secs)
}

/// Map Slack's `{ "ok": false, "error": ... }` envelope to an error.
fn check_ok(method: &str, body: Value) -> Result<Value, ServiceError> {
    if body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
        return Ok(body);
    }
    Err(ServiceError::ApiError(format!(
        "{method} error: {}",
        body.get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
    )))
}

/// Pull the user token out of an `oauth.v2.access` response.
fn parse_oauth_access(body: &Value) -> Result<OAuthAccess, ServiceError> {
    let authed_user = body
        .get("authed_user")
        .ok_or_else(|| ServiceError::ParseError("oauth: missing authed_user".to_string()))?;
    let user_id = authed_user
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| ServiceError::ParseError("oauth: missing authed_user.id".to_string()))?;
    let access_token = authed_user
        .get("access_token")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ServiceError::ParseError("oauth: missing authed_user.access_token".to_string())
        })?;

    Ok(OAuthAccess {
        access_token: access_token.to_string(),
        user_id: user_id.to_string(),
        scope: authed_user
            .get("scope")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

#[async_trait]
impl ChatPlatform for SlackClient {
    async fn oauth_access(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<OAuthAccess, ServiceError> {
        let mut form = vec![
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        if let Some(uri) = redirect_uri {
            form.push(("redirect_uri", uri));
        }

        let body = self.call("oauth.v2.access", None, &form).await?;
        parse_oauth_access(&body)
    }

    async fn auth_test(&self, token: &str) -> Result<String, ServiceError> {
        let token = SlackApiToken::new(SlackApiTokenValue::new(token.to_string()));
        self.with_retry(|| async {
            let session = SLACK_CLIENT
                .as_ref()
                .ok_or_else(|| {
                    ServiceError::GeneralError("Slack HTTP connector not initialized".to_string())
                })?
                .open_session(&token);

            let test_resp = session.auth_test().await?;
            Ok(test_resp.user_id.0)
        })
        .await
    }

    async fn team_info(&self, token: &str) -> Result<TeamInfo, ServiceError> {
        let resp: TeamInfoResponse = self.call_as("team.info", Some(token), &[]).await?;
        Ok(resp.team)
    }

    async fn user_info(&self, token: &str, user_id: &str) -> Result<UserInfo, ServiceError> {
        let resp: UserInfoResponse = self
            .call_as("users.info", Some(token), &[("user", user_id)])
            .await?;
        Ok(resp.user)
    }

    async fn list_channels(&self, token: &str) -> Result<Vec<Conversation>, ServiceError> {
        self.list_conversations(token, "public_channel").await
    }

    async fn list_groups(&self, token: &str) -> Result<Vec<Conversation>, ServiceError> {
        self.list_conversations(token, "private_channel").await
    }

    async fn invite_email(
        &self,
        token: &str,
        email: &str,
        channel_id: &str,
    ) -> Result<(), ServiceError> {
        let form = [("email", email), ("channels", channel_id), ("resend", "true")];
        match self.call("users.admin.invite", Some(token), &form).await {
            Ok(_) => Ok(()),
            Err(ServiceError::ApiError(msg))
                if msg.ends_with("already_in_team") || msg.ends_with("already_invited") =>
            {
                info!("Invite skipped: {}", msg);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
