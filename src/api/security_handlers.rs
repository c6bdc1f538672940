//! Slack OAuth login, logout and the current-user endpoint.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use super::context::AppContext;
use super::error::{HandlerError, HttpError};
use super::parsing::ApiRequest;
use super::session::{Session, clear_cookie, session_cookie};
use super::{helpers, oauth};
use crate::core::models::{
    OAUTH_STATE_TTL_MINUTES, OAuthState, Team, User, UserStatus, UserType,
};
use crate::slack::{TeamInfo, UserInfo};

/// Where the browser lands after a successful login.
pub const POST_LOGIN_REDIRECT: &str = "/conf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleUser {
    pub name: String,
    pub email: String,
    pub real_name: String,
}

#[must_use]
pub fn state_expired(saved: &OAuthState, now: DateTime<Utc>) -> bool {
    now.signed_duration_since(saved.timestamp) > Duration::minutes(OAUTH_STATE_TTL_MINUTES)
}

/// Mirror Slack's team and user as local records.
///
/// Local IDs are prefixed (`T`/`U`) UUIDs, generated on first login and kept
/// from `existing_*` afterwards.
#[must_use]
pub fn build_records(
    team_info: TeamInfo,
    user_info: UserInfo,
    token: &str,
    existing_team: Option<&Team>,
    existing_user: Option<&User>,
    now: DateTime<Utc>,
) -> (Team, User) {
    let team_id = existing_team
        .map(|t| t.id.clone())
        .unwrap_or_else(|| format!("T{}", Uuid::new_v4()));
    let user_id = existing_user
        .map(|u| u.id.clone())
        .unwrap_or_else(|| format!("U{}", Uuid::new_v4()));

    let team = Team {
        id: team_id.clone(),
        name: team_info.name,
        email_domain: team_info.email_domain,
        domain: team_info.domain,
        plan: team_info.plan,
        external_id: team_info.id,
        created: existing_team.map_or(now, |t| t.created),
    };

    let real_name = user_info.display_real_name();
    let user = User {
        id: user_id,
        team: team_id,
        name: user_info.name,
        user_type: UserType::Slack,
        status: UserStatus::Active,
        real_name,
        email: user_info.profile.email.unwrap_or_default(),
        is_bot: user_info.is_bot,
        is_admin: user_info.is_admin,
        is_owner: user_info.is_owner,
        is_primary_owner: user_info.is_primary_owner,
        is_restricted: user_info.is_restricted,
        is_ultra_restricted: user_info.is_ultra_restricted,
        external_id: user_info.id,
        token: token.to_string(),
        created: existing_user.map_or(now, |u| u.created),
    };

    (team, user)
}

/// Start the OAuth dance: remember a fresh state and send the browser to Slack.
///
/// # Errors
///
/// Fails with an internal error if the state cannot be stored.
#[tracing::instrument(level = "info", skip_all)]
pub async fn initiate_oauth(ctx: &AppContext) -> Result<Value, HandlerError> {
    let state = Uuid::new_v4().to_string();
    ctx.repo
        .set_oauth_state(&OAuthState {
            state: state.clone(),
            timestamp: Utc::now(),
        })
        .await?;

    Ok(helpers::redirect(&oauth::build_authorize_url(
        &ctx.config,
        &state,
    )))
}

/// OAuth callback: validate state, exchange the code, mirror the identity
/// and issue a session cookie.
///
/// # Errors
///
/// 401 when Slack reports an error or refuses the code, 400 for a missing,
/// unknown or expired state; internal errors for store or Slack failures.
#[tracing::instrument(level = "info", skip_all)]
pub async fn login_oauth(ctx: &AppContext, req: &ApiRequest) -> Result<Value, HandlerError> {
    if let Some(err) = req.query_param("error") {
        return Err(HttpError::oauth_err(err).into());
    }

    let (Some(state), Some(code)) = (req.query_param("state"), req.query_param("code")) else {
        return Err(HttpError::bad_content().into());
    };

    let Some(saved) = ctx.repo.take_oauth_state(state).await? else {
        warn!("OAuth callback with unknown state");
        return Err(HttpError::bad_content().into());
    };

    let now = Utc::now();
    if state_expired(&saved, now) {
        warn!("OAuth callback with expired state");
        return Err(HttpError::bad_request().into());
    }

    let access = match ctx
        .slack
        .oauth_access(
            &ctx.config.slack_client_id,
            &ctx.config.slack_client_secret,
            code,
            ctx.config.slack_redirect_url.as_deref(),
        )
        .await
    {
        Ok(a) => a,
        Err(e) => {
            warn!("OAuth code exchange failed: {}", e);
            return Err(HttpError::oauth_err(&e.to_string()).into());
        }
    };
    let token = access.access_token.as_str();

    let slack_user_id = ctx.slack.auth_test(token).await?;
    let team_info = ctx.slack.team_info(token).await?;
    let user_info = ctx.slack.user_info(token, &slack_user_id).await?;

    let existing_team = ctx.repo.team_by_external_id(&team_info.id).await?;
    let existing_user = ctx.repo.user_by_external_id(&user_info.id).await?;
    let (team, user) = build_records(
        team_info,
        user_info,
        token,
        existing_team.as_ref(),
        existing_user.as_ref(),
        now,
    );
    ctx.repo.set_team_and_user(&team, &user).await?;
    info!(user = %user.name, team = %team.id, "User logged in");

    let sealed = Session::new(&user.name, &user.id).encrypt(&ctx.config.session_key)?;
    Ok(helpers::with_cookie(
        helpers::redirect(POST_LOGIN_REDIRECT),
        session_cookie(sealed, &ctx.config),
    ))
}

#[must_use]
pub fn logout(ctx: &AppContext) -> Value {
    helpers::with_cookie(helpers::no_content(), clear_cookie(&ctx.config))
}

/// # Errors
///
/// Returns an error if the response cannot be serialized.
pub fn curr_user(user: &User) -> Result<Value, HandlerError> {
    Ok(helpers::ok_json(&SimpleUser {
        name: user.name.clone(),
        email: user.email.clone(),
        real_name: user.real_name.clone(),
    })?)
}
