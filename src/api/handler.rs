//! API Lambda handler - thin router that delegates to specialized handlers.
//!
//! This module handles:
//! - Request parsing (method, path, query, cookies, body)
//! - Session authentication for protected routes
//! - Mapping handler failures to error responses

use lambda_runtime::{Error, LambdaEvent};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use super::context::AppContext;
use super::error::{HandlerError, HttpError};
use super::parsing::ApiRequest;
use super::{conf_handlers, helpers, security_handlers, session};
use crate::core::models::{Configuration, User};

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Never fails in practice: every outcome, including internal faults, is
/// rendered as an HTTP response.
pub async fn function_handler(
    ctx: &AppContext,
    event: LambdaEvent<Value>,
) -> Result<Value, Error> {
    let request_id = event.context.request_id.clone();
    let req = match ApiRequest::from_event(&event.payload) {
        Ok(r) => r,
        Err(e) => return Ok(e.to_response()),
    };

    let response = route(ctx, &req).await;
    info!(
        request_id = %request_id,
        method = %req.method,
        path = %req.path,
        status = helpers::status_of(&response),
        "Handled request"
    );
    Ok(response)
}

/// Dispatch a parsed request and render the outcome.
pub async fn route(ctx: &AppContext, req: &ApiRequest) -> Value {
    let method = req.method.as_str();
    let result = match (req.route(), method) {
        ("login", "GET") => security_handlers::initiate_oauth(ctx).await,
        ("auth", "GET") => security_handlers::login_oauth(ctx, req).await,
        ("logout", "POST" | "GET") => Ok(security_handlers::logout(ctx)),
        ("join", "POST") => match req.json_body() {
            Ok(body) => conf_handlers::join_slack(ctx, &body).await,
            Err(e) => Err(e.into()),
        },
        ("user", "GET") => {
            authenticated(ctx, req, |user| async move { security_handlers::curr_user(&user) })
                .await
        }
        ("info", "GET") => {
            authenticated(ctx, req, |user| async move {
                conf_handlers::info(ctx, &user).await
            })
            .await
        }
        ("match", "POST") => {
            with_body(ctx, req, |user, body: conf_handlers::RegexpMatch| async move {
                conf_handlers::match_channels(ctx, &user, &body).await
            })
            .await
        }
        ("save", "POST") => {
            with_body(ctx, req, |user, body: Configuration| async move {
                conf_handlers::save(ctx, &user, &body).await
            })
            .await
        }
        ("login" | "auth" | "logout" | "join" | "user" | "info" | "match" | "save", _) => {
            Err(HttpError::method_not_allowed().into())
        }
        _ => Err(HttpError::not_found().into()),
    };

    result.unwrap_or_else(HandlerError::into_response)
}

/// Run `handler` for the session's user and attach the refreshed session cookie.
async fn authenticated<F, Fut>(
    ctx: &AppContext,
    req: &ApiRequest,
    handler: F,
) -> Result<Value, HandlerError>
where
    F: FnOnce(User) -> Fut,
    Fut: std::future::Future<Output = Result<Value, HandlerError>>,
{
    let (user, cookie) = session::authenticate(ctx, req).await?;
    let response = handler(user).await?;
    Ok(helpers::with_cookie(response, cookie))
}

/// Like `authenticated`, but decodes the JSON body first.
async fn with_body<T, F, Fut>(
    ctx: &AppContext,
    req: &ApiRequest,
    handler: F,
) -> Result<Value, HandlerError>
where
    T: DeserializeOwned,
    F: FnOnce(User, T) -> Fut,
    Fut: std::future::Future<Output = Result<Value, HandlerError>>,
{
    authenticated(ctx, req, |user| async move {
        match req.json_body::<T>() {
            Ok(body) => handler(user, body).await,
            Err(e) => {
                warn!(path = %req.path, "Rejected request body");
                Err(e.into())
            }
        }
    })
    .await
}
