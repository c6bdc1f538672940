use std::sync::Arc;

use crate::clients::{CaptchaVerifier, Recaptcha};
use crate::core::config::AppConfig;
use crate::core::queue::{ConfQueue, SqsConfQueue};
use crate::core::store::{Repository, SsmRepository};
use crate::slack::{ChatPlatform, SlackClient};

/// Everything a handler needs, built once per Lambda cold start.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub repo: Arc<dyn Repository>,
    pub slack: Arc<dyn ChatPlatform>,
    pub captcha: Arc<dyn CaptchaVerifier>,
    pub queue: Arc<dyn ConfQueue>,
}

impl AppContext {
    /// Wire the AWS- and Slack-backed implementations from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required environment variable is missing.
    pub async fn from_env() -> Result<Self, String> {
        let config = AppConfig::from_env()?;
        let shared = aws_config::from_env().load().await;

        Ok(Self {
            repo: Arc::new(SsmRepository::new(&shared, &config.store_param_prefix)),
            slack: Arc::new(SlackClient::new()),
            captcha: Arc::new(Recaptcha::new(config.recaptcha_secret.clone())),
            queue: Arc::new(SqsConfQueue::new(&shared, &config.conf_queue_url)),
            config,
        })
    }
}
