use std::env;

const DEFAULT_SESSION_TIMEOUT_MINUTES: i64 = 24 * 60;
const DEFAULT_STORE_PARAM_PREFIX: &str = "/watchbot/";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_client_id: String,
    pub slack_client_secret: String,
    pub slack_redirect_url: Option<String>,
    pub slack_invite_token: String,
    pub join_channel_id: String,
    pub session_key: String,
    pub session_timeout_minutes: i64,
    pub recaptcha_secret: String,
    pub environment: String,
    pub store_param_prefix: String,
    pub conf_queue_url: String,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns the name of the first missing or malformed variable.
    pub fn from_env() -> Result<Self, String> {
        let session_timeout_minutes = match env::var("SESSION_TIMEOUT_MINUTES") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| format!("SESSION_TIMEOUT_MINUTES: invalid value '{raw}'"))?,
            Err(_) => DEFAULT_SESSION_TIMEOUT_MINUTES,
        };

        Ok(Self {
            slack_client_id: env::var("SLACK_CLIENT_ID")
                .map_err(|e| format!("SLACK_CLIENT_ID: {}", e))?,
            slack_client_secret: env::var("SLACK_CLIENT_SECRET")
                .map_err(|e| format!("SLACK_CLIENT_SECRET: {}", e))?,
            slack_redirect_url: env::var("SLACK_REDIRECT_URL").ok(),
            slack_invite_token: env::var("SLACK_INVITE_TOKEN")
                .map_err(|e| format!("SLACK_INVITE_TOKEN: {}", e))?,
            join_channel_id: env::var("SLACK_JOIN_CHANNEL")
                .map_err(|e| format!("SLACK_JOIN_CHANNEL: {}", e))?,
            session_key: env::var("SESSION_KEY").map_err(|e| format!("SESSION_KEY: {}", e))?,
            session_timeout_minutes,
            recaptcha_secret: env::var("RECAPTCHA_SECRET")
                .map_err(|e| format!("RECAPTCHA_SECRET: {}", e))?,
            environment: env::var("APP_ENV").unwrap_or_else(|_| "DEV".to_string()),
            store_param_prefix: env::var("STORE_PARAM_PREFIX")
                .unwrap_or_else(|_| DEFAULT_STORE_PARAM_PREFIX.to_string()),
            conf_queue_url: env::var("CONF_QUEUE_URL")
                .map_err(|e| format!("CONF_QUEUE_URL: {}", e))?,
        })
    }

    /// Cookies carry the `Secure` attribute outside of local development.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment == "PROD" || self.environment == "TEST"
    }
}
