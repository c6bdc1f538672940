//! Common helper functions for API handlers.
//!
//! Responses are API Gateway (HTTP API, payload 2.0) proxy results built as
//! plain JSON values.

use serde::Serialize;
use serde_json::{Value, json};

use crate::errors::ServiceError;

// ============================================================================
// Response Builders
// ============================================================================

/// Returns a 200 OK response with `body` serialized as JSON.
///
/// # Errors
///
/// Returns an error if `body` cannot be serialized.
pub fn ok_json<T: Serialize>(body: &T) -> Result<Value, ServiceError> {
    Ok(json!({
        "statusCode": 200,
        "headers": { "Content-Type": "application/json" },
        "body": serde_json::to_string(body)?
    }))
}

/// Returns a 204 No Content response.
#[must_use]
pub fn no_content() -> Value {
    json!({ "statusCode": 204, "body": "" })
}

/// Returns a 302 redirect response.
#[must_use]
pub fn redirect(url: &str) -> Value {
    json!({
        "statusCode": 302,
        "headers": { "Location": url },
        "body": ""
    })
}

/// Attach a `Set-Cookie` value to a response.
#[must_use]
pub fn with_cookie(mut response: Value, cookie: String) -> Value {
    match response.get_mut("cookies").and_then(Value::as_array_mut) {
        Some(cookies) => cookies.push(Value::String(cookie)),
        None => response["cookies"] = json!([cookie]),
    }
    response
}

/// Status code of a built response, used for logging.
#[must_use]
pub fn status_of(response: &Value) -> u64 {
    response
        .get("statusCode")
        .and_then(Value::as_u64)
        .unwrap_or(200)
}
