use slack_morphism::errors::SlackClientError;
use thiserror::Error;

/// Failures from the datastore, queue, Slack or captcha services.
///
/// These never reach the caller verbatim: the router logs them and answers
/// with a generic 500.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Failed to parse payload: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to interact with AWS services: {0}")]
    AwsError(String),

    #[error("Failed to process session: {0}")]
    CryptoError(String),

    #[error("{0}")]
    GeneralError(String),
}

impl From<SlackClientError> for ServiceError {
    fn from(error: SlackClientError) -> Self {
        ServiceError::ApiError(error.to_string())
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(error: reqwest::Error) -> Self {
        ServiceError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        ServiceError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(error: anyhow::Error) -> Self {
        ServiceError::GeneralError(error.to_string())
    }
}

impl From<openssl::error::ErrorStack> for ServiceError {
    fn from(error: openssl::error::ErrorStack) -> Self {
        ServiceError::CryptoError(error.to_string())
    }
}
