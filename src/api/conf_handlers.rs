//! Handlers for reading and saving a team's monitoring configuration, plus
//! the captcha-gated community join.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::info;

use super::context::AppContext;
use super::error::{HandlerError, HttpError};
use super::helpers;
use crate::core::models::{Configuration, User};
use crate::slack::Conversation;

/// Upper bound on the email length, in bytes.
const MAX_EMAIL_LEN: usize = 128;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[\p{L}\p{N}.!#$%&'*+/=?^_`{|}~-]+@[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?(?:\.[\p{L}\p{N}](?:[\p{L}\p{N}-]{0,61}[\p{L}\p{N}])?)+$",
    )
    .expect("static regex compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdName {
    pub id: String,
    pub name: String,
    pub selected: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoResponse {
    pub channels: Vec<IdName>,
    pub groups: Vec<IdName>,
    pub im: bool,
    pub verbose_im: bool,
    pub regexp: String,
    pub all: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegexpMatch {
    #[serde(default)]
    pub regexp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "captcharesponse")]
    pub captcha_response: String,
}

/// Compile a user-supplied filter, turning syntax errors into a 400.
///
/// # Errors
///
/// Returns a `bad_request` error whose detail carries the parser message.
pub fn compile_filter(pattern: &str) -> Result<Regex, HttpError> {
    Regex::new(pattern).map_err(|e| {
        HttpError::bad_request_detail(&format!("Error parsing regexp - {e}"))
    })
}

/// Mark listed conversations against the saved selection.
///
/// Public channels the user has not joined are left out.
#[must_use]
pub fn build_info(
    saved: &Configuration,
    channels: &[Conversation],
    groups: &[Conversation],
) -> InfoResponse {
    let selected_channels: HashSet<&str> = saved.channels.iter().map(String::as_str).collect();
    let verbose_channels: HashSet<&str> =
        saved.verbose_channels.iter().map(String::as_str).collect();
    let selected_groups: HashSet<&str> = saved.groups.iter().map(String::as_str).collect();
    let verbose_groups: HashSet<&str> = saved.verbose_groups.iter().map(String::as_str).collect();

    InfoResponse {
        channels: channels
            .iter()
            .filter(|c| c.is_member)
            .map(|c| IdName {
                id: c.id.clone(),
                name: c.name.clone(),
                selected: selected_channels.contains(c.id.as_str()),
                verbose: verbose_channels.contains(c.id.as_str()),
            })
            .collect(),
        groups: groups
            .iter()
            .map(|g| IdName {
                id: g.id.clone(),
                name: g.name.clone(),
                selected: selected_groups.contains(g.id.as_str()),
                verbose: verbose_groups.contains(g.id.as_str()),
            })
            .collect(),
        im: saved.im,
        verbose_im: saved.verbose_im,
        regexp: saved.regexp.clone(),
        all: saved.all,
    }
}

/// Names of joined channels, then groups, that `re` matches.
#[must_use]
pub fn matching_names(re: &Regex, channels: &[Conversation], groups: &[Conversation]) -> Vec<String> {
    channels
        .iter()
        .filter(|c| c.is_member)
        .chain(groups.iter())
        .filter(|c| re.is_match(&c.name))
        .map(|c| c.name.clone())
        .collect()
}

/// Email shape and captcha presence, checked before any outbound call.
#[must_use]
pub fn is_valid_join(req: &JoinRequest) -> bool {
    !req.captcha_response.is_empty()
        && req.email.len() <= MAX_EMAIL_LEN
        && EMAIL_RE.is_match(&req.email)
}

/// # Errors
///
/// Fails with an internal error if the store or Slack cannot be reached.
#[tracing::instrument(level = "info", skip_all, fields(team = %user.team))]
pub async fn info(ctx: &AppContext, user: &User) -> Result<Value, HandlerError> {
    let saved = ctx.repo.channels_and_groups(&user.team).await?;
    let channels = ctx.slack.list_channels(&user.token).await?;
    let groups = ctx.slack.list_groups(&user.token).await?;

    let res = build_info(&saved, &channels, &groups);
    Ok(helpers::ok_json(&res)?)
}

/// # Errors
///
/// Returns 400 for an invalid pattern; internal errors for Slack failures.
#[tracing::instrument(level = "info", skip_all, fields(team = %user.team))]
pub async fn match_channels(
    ctx: &AppContext,
    user: &User,
    req: &RegexpMatch,
) -> Result<Value, HandlerError> {
    if req.regexp.is_empty() {
        return Ok(helpers::ok_json(&Vec::<String>::new())?);
    }

    let re = compile_filter(&req.regexp)?;
    let channels = ctx.slack.list_channels(&user.token).await?;
    let groups = ctx.slack.list_groups(&user.token).await?;

    Ok(helpers::ok_json(&matching_names(&re, &channels, &groups))?)
}

/// # Errors
///
/// Returns 400 for an invalid pattern; internal errors for store or queue failures.
#[tracing::instrument(level = "info", skip_all, fields(team = %user.team))]
pub async fn save(
    ctx: &AppContext,
    user: &User,
    conf: &Configuration,
) -> Result<Value, HandlerError> {
    if !conf.regexp.is_empty() {
        compile_filter(&conf.regexp)?;
    }

    ctx.repo.set_channels_and_groups(&user.team, conf).await?;
    ctx.queue.push_conf(&user.team, conf).await?;
    info!(
        channels = conf.channels.len(),
        groups = conf.groups.len(),
        "Saved configuration"
    );
    Ok(helpers::no_content())
}

/// # Errors
///
/// Returns 400 for malformed input or a rejected captcha; internal errors for
/// captcha or Slack transport failures.
#[tracing::instrument(level = "info", skip_all)]
pub async fn join_slack(ctx: &AppContext, req: &JoinRequest) -> Result<Value, HandlerError> {
    if !is_valid_join(req) {
        return Err(HttpError::bad_request().into());
    }

    let verdict = ctx.captcha.verify(&req.captcha_response).await?;
    if !verdict.success {
        return Err(HttpError::bad_captcha().into());
    }

    ctx.slack
        .invite_email(
            &ctx.config.slack_invite_token,
            &req.email,
            &ctx.config.join_channel_id,
        )
        .await?;
    info!("Invited new member to the join channel");
    Ok(helpers::no_content())
}
