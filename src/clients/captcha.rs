//! reCAPTCHA verification client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::errors::ServiceError;

const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Answer from the siteverify endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptchaVerdict {
    #[serde(default)]
    pub success: bool,
    #[serde(default, rename = "error-codes")]
    pub error_codes: Vec<String>,
}

#[async_trait]
pub trait CaptchaVerifier: Send + Sync {
    async fn verify(&self, response: &str) -> Result<CaptchaVerdict, ServiceError>;
}

pub struct Recaptcha {
    http: Client,
    secret: String,
}

impl Recaptcha {
    #[must_use]
    pub fn new(secret: String) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, secret }
    }
}

#[async_trait]
impl CaptchaVerifier for Recaptcha {
    async fn verify(&self, response: &str) -> Result<CaptchaVerdict, ServiceError> {
        let form = [("secret", self.secret.as_str()), ("response", response)];
        let resp = self
            .http
            .post(RECAPTCHA_VERIFY_URL)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                debug!("Recaptcha error - {}", e);
                ServiceError::HttpError(format!("recaptcha request: {e}"))
            })?;

        let verdict: CaptchaVerdict = resp.json().await.map_err(|e| {
            debug!("Recaptcha body parse error - {}", e);
            ServiceError::ParseError(format!("recaptcha response: {e}"))
        })?;

        if !verdict.success {
            debug!(error_codes = ?verdict.error_codes, "Recaptcha rejected response");
        }
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_failed_verdict_with_error_codes() {
        let v: CaptchaVerdict = serde_json::from_str(
            r#"{"success": false, "error-codes": ["invalid-input-response"]}"#,
        )
        .unwrap();
        assert!(!v.success);
        assert_eq!(v.error_codes, vec!["invalid-input-response".to_string()]);
    }

    #[test]
    fn parses_successful_verdict() {
        let v: CaptchaVerdict = serde_json::from_str(
            r#"{"success": true, "challenge_ts": "2026-01-01T00:00:00Z", "hostname": "example.com"}"#,
        )
        .unwrap();
        assert!(v.success);
        assert!(v.error_codes.is_empty());
    }
}
