//! Errors returned to API callers.
//!
//! Only input validation and authentication problems become structured
//! 4xx bodies. Everything else is an internal fault answered with a bare 500.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::error;

use crate::errors::ServiceError;

/// One entry of the `errors` array in an error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{status} {title}: {detail}")]
pub struct HttpError {
    pub id: String,
    pub status: u16,
    pub title: String,
    pub detail: String,
}

impl HttpError {
    #[must_use]
    pub fn new(id: &str, status: u16, title: &str, detail: &str) -> Self {
        Self {
            id: id.to_string(),
            status,
            title: title.to_string(),
            detail: detail.to_string(),
        }
    }

    #[must_use]
    pub fn bad_request() -> Self {
        Self::new(
            "bad_request",
            400,
            "Bad request",
            "Request body is not well-formed. It must be JSON.",
        )
    }

    /// A 400 carrying a caller-specific explanation, e.g. a regexp syntax error.
    #[must_use]
    pub fn bad_request_detail(detail: &str) -> Self {
        Self::new("bad_request", 400, "Bad Request", detail)
    }

    #[must_use]
    pub fn bad_content() -> Self {
        Self::new(
            "bad_content",
            400,
            "Bad content",
            "Request body contains bad content.",
        )
    }

    #[must_use]
    pub fn bad_captcha() -> Self {
        Self::new(
            "bad_captcha",
            400,
            "Bad captcha",
            "The captcha response could not be verified.",
        )
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            "unauthorized",
            401,
            "Unauthorized",
            "The request requires authorization.",
        )
    }

    #[must_use]
    pub fn oauth_err(detail: &str) -> Self {
        Self::new("oauth_err", 401, "Slack OAuth Error", detail)
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self::new(
            "not_found",
            404,
            "Not found",
            "The requested resource does not exist.",
        )
    }

    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(
            "method_not_allowed",
            405,
            "Method not allowed",
            "The request method is not supported for this resource.",
        )
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::new(
            "internal_server_error",
            500,
            "Internal Server Error",
            "Something went wrong.",
        )
    }

    /// Render as an API Gateway proxy response.
    #[must_use]
    pub fn to_response(&self) -> Value {
        json!({
            "statusCode": self.status,
            "headers": { "Content-Type": "application/json" },
            "body": json!({ "errors": [self] }).to_string()
        })
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Client(#[from] HttpError),

    #[error(transparent)]
    Internal(#[from] ServiceError),
}

impl HandlerError {
    /// Internal faults are logged here and never leak their details.
    #[must_use]
    pub fn into_response(self) -> Value {
        match self {
            HandlerError::Client(e) => e.to_response(),
            HandlerError::Internal(e) => {
                error!("Request failed: {}", e);
                HttpError::internal().to_response()
            }
        }
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(error: serde_json::Error) -> Self {
        HandlerError::Internal(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_wraps_entry_in_errors_array() {
        let resp = HttpError::bad_captcha().to_response();
        assert_eq!(resp["statusCode"], 400);
        let body: Value = serde_json::from_str(resp["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["errors"][0]["id"], "bad_captcha");
        assert_eq!(body["errors"][0]["status"], 400);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = HandlerError::from(ServiceError::AwsError("ssm exploded".to_string()));
        let resp = err.into_response();
        assert_eq!(resp["statusCode"], 500);
        assert!(!resp["body"].as_str().unwrap().contains("ssm exploded"));
    }
}
