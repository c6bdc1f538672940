use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use tracing::info;

use super::models::{ConfUpdate, Configuration};
use crate::errors::ServiceError;

/// Notifies the bot that a team changed its monitoring configuration.
#[async_trait]
pub trait ConfQueue: Send + Sync {
    async fn push_conf(&self, team: &str, conf: &Configuration) -> Result<(), ServiceError>;
}

pub struct SqsConfQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsConfQueue {
    #[must_use]
    pub fn new(shared: &aws_config::SdkConfig, queue_url: &str) -> Self {
        Self {
            client: SqsClient::new(shared),
            queue_url: queue_url.to_string(),
        }
    }
}

#[async_trait]
impl ConfQueue for SqsConfQueue {
    /// # Errors
    ///
    /// Returns an error if serialization fails or the message cannot be sent to SQS.
    async fn push_conf(&self, team: &str, conf: &Configuration) -> Result<(), ServiceError> {
        let update = ConfUpdate {
            team: team.to_string(),
            configuration: conf.clone(),
        };
        let message_body = serde_json::to_string(&update)
            .map_err(|e| ServiceError::ParseError(format!("Failed to serialize update: {e}")))?;

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| ServiceError::AwsError(format!("Failed to send message to SQS: {e}")))?;

        info!(team = %team, "Queued configuration update");
        Ok(())
    }
}
