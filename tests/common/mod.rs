//! In-memory stand-ins for the store, queue, Slack and captcha services.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use watchbot::ServiceError;
use watchbot::api::AppContext;
use watchbot::api::parsing::ApiRequest;
use watchbot::api::session::Session;
use watchbot::clients::{CaptchaVerdict, CaptchaVerifier};
use watchbot::core::config::AppConfig;
use watchbot::core::models::{Configuration, OAuthState, Team, User, UserStatus, UserType};
use watchbot::core::queue::ConfQueue;
use watchbot::core::store::Repository;
use watchbot::slack::{ChatPlatform, Conversation, OAuthAccess, TeamInfo, UserInfo};

pub const SESSION_KEY: &str = "test-session-key";

#[derive(Default)]
pub struct MemoryRepository {
    pub confs: Mutex<HashMap<String, Configuration>>,
    pub states: Mutex<HashMap<String, OAuthState>>,
    pub teams: Mutex<HashMap<String, Team>>,
    pub users: Mutex<HashMap<String, User>>,
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn channels_and_groups(&self, team: &str) -> Result<Configuration, ServiceError> {
        Ok(self
            .confs
            .lock()
            .unwrap()
            .get(team)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_channels_and_groups(
        &self,
        team: &str,
        conf: &Configuration,
    ) -> Result<(), ServiceError> {
        self.confs
            .lock()
            .unwrap()
            .insert(team.to_string(), conf.clone());
        Ok(())
    }

    async fn set_oauth_state(&self, state: &OAuthState) -> Result<(), ServiceError> {
        self.states
            .lock()
            .unwrap()
            .insert(state.state.clone(), state.clone());
        Ok(())
    }

    async fn take_oauth_state(&self, state: &str) -> Result<Option<OAuthState>, ServiceError> {
        Ok(self.states.lock().unwrap().remove(state))
    }

    async fn team_by_external_id(&self, external_id: &str) -> Result<Option<Team>, ServiceError> {
        Ok(self
            .teams
            .lock()
            .unwrap()
            .values()
            .find(|t| t.external_id == external_id)
            .cloned())
    }

    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.external_id == external_id)
            .cloned())
    }

    async fn user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn set_team_and_user(&self, team: &Team, user: &User) -> Result<(), ServiceError> {
        self.teams
            .lock()
            .unwrap()
            .insert(team.id.clone(), team.clone());
        self.users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(())
    }
}

pub struct FakeSlack {
    pub channels: Vec<Conversation>,
    pub groups: Vec<Conversation>,
    pub team: TeamInfo,
    pub user: UserInfo,
    pub oauth_error: Option<String>,
    pub fail_listing: bool,
    pub list_calls: AtomicUsize,
    pub invites: Mutex<Vec<(String, String)>>,
}

impl Default for FakeSlack {
    fn default() -> Self {
        Self {
            channels: vec![
                conversation("C1", "general", true),
                conversation("C2", "dev-backend", true),
                conversation("C3", "dev-frontend", false),
            ],
            groups: vec![
                conversation("G1", "dev-secret", false),
                conversation("G2", "leadership", false),
            ],
            team: TeamInfo {
                id: "T0SLACK".into(),
                name: "Ghostbusters".into(),
                domain: "ghostbusters".into(),
                email_domain: "ghostbusters.example.com".into(),
                plan: String::new(),
            },
            user: UserInfo {
                id: "W0SLACK".into(),
                name: "spengler".into(),
                real_name: Some("Egon Spengler".into()),
                ..UserInfo::default()
            },
            oauth_error: None,
            fail_listing: false,
            list_calls: AtomicUsize::new(0),
            invites: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatPlatform for FakeSlack {
    async fn oauth_access(
        &self,
        _client_id: &str,
        _client_secret: &str,
        code: &str,
        _redirect_uri: Option<&str>,
    ) -> Result<OAuthAccess, ServiceError> {
        if let Some(err) = &self.oauth_error {
            return Err(ServiceError::ApiError(format!("oauth.v2.access error: {err}")));
        }
        Ok(OAuthAccess {
            access_token: format!("xoxp-{code}"),
            user_id: self.user.id.clone(),
            scope: None,
        })
    }

    async fn auth_test(&self, _token: &str) -> Result<String, ServiceError> {
        Ok(self.user.id.clone())
    }

    async fn team_info(&self, _token: &str) -> Result<TeamInfo, ServiceError> {
        Ok(self.team.clone())
    }

    async fn user_info(&self, _token: &str, _user_id: &str) -> Result<UserInfo, ServiceError> {
        Ok(self.user.clone())
    }

    async fn list_channels(&self, _token: &str) -> Result<Vec<Conversation>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(ServiceError::ApiError(
                "conversations.list error: invalid_auth".into(),
            ));
        }
        Ok(self.channels.clone())
    }

    async fn list_groups(&self, _token: &str) -> Result<Vec<Conversation>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.clone())
    }

    async fn invite_email(
        &self,
        _token: &str,
        email: &str,
        channel_id: &str,
    ) -> Result<(), ServiceError> {
        self.invites
            .lock()
            .unwrap()
            .push((email.to_string(), channel_id.to_string()));
        Ok(())
    }
}

pub struct FakeCaptcha {
    pub success: bool,
    pub calls: AtomicUsize,
}

impl FakeCaptcha {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptchaVerifier for FakeCaptcha {
    async fn verify(&self, _response: &str) -> Result<CaptchaVerdict, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CaptchaVerdict {
            success: self.success,
            error_codes: if self.success {
                Vec::new()
            } else {
                vec!["invalid-input-response".into()]
            },
        })
    }
}

#[derive(Default)]
pub struct FakeQueue {
    pub pushed: Mutex<Vec<(String, Configuration)>>,
}

#[async_trait]
impl ConfQueue for FakeQueue {
    async fn push_conf(&self, team: &str, conf: &Configuration) -> Result<(), ServiceError> {
        self.pushed
            .lock()
            .unwrap()
            .push((team.to_string(), conf.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub ctx: AppContext,
    pub repo: Arc<MemoryRepository>,
    pub slack: Arc<FakeSlack>,
    pub captcha: Arc<FakeCaptcha>,
    pub queue: Arc<FakeQueue>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        slack_client_id: "client-id".into(),
        slack_client_secret: "client-secret".into(),
        slack_redirect_url: Some("https://watchbot.example.com/auth".into()),
        slack_invite_token: "xoxa-invite".into(),
        join_channel_id: "CJOIN".into(),
        session_key: SESSION_KEY.into(),
        session_timeout_minutes: 60,
        recaptcha_secret: "captcha-secret".into(),
        environment: "PROD".into(),
        store_param_prefix: "/watchbot-test/".into(),
        conf_queue_url: "https://sqs.example.com/queue".into(),
    }
}

pub fn harness_with(slack: FakeSlack, captcha_success: bool) -> Harness {
    let repo = Arc::new(MemoryRepository::default());
    let slack = Arc::new(slack);
    let captcha = Arc::new(FakeCaptcha {
        success: captcha_success,
        calls: AtomicUsize::new(0),
    });
    let queue = Arc::new(FakeQueue::default());

    let ctx = AppContext {
        config: test_config(),
        repo: repo.clone(),
        slack: slack.clone(),
        captcha: captcha.clone(),
        queue: queue.clone(),
    };

    Harness {
        ctx,
        repo,
        slack,
        captcha,
        queue,
    }
}

pub fn harness() -> Harness {
    harness_with(FakeSlack::default(), true)
}

pub fn conversation(id: &str, name: &str, is_member: bool) -> Conversation {
    Conversation {
        id: id.to_string(),
        name: name.to_string(),
        is_member,
    }
}

impl Harness {
    /// Store a user and return a request cookie holding a valid session for them.
    pub fn login(&self) -> (User, String) {
        let user = User {
            id: "Ulocal-1".into(),
            team: "Tlocal-1".into(),
            name: "spengler".into(),
            user_type: UserType::Slack,
            status: UserStatus::Active,
            real_name: "Egon Spengler".into(),
            email: "spengler@ghostbusters.example.com".into(),
            is_bot: false,
            is_admin: true,
            is_owner: false,
            is_primary_owner: false,
            is_restricted: false,
            is_ultra_restricted: false,
            external_id: "W0SLACK".into(),
            token: "xoxp-existing".into(),
            created: Utc::now(),
        };
        self.repo
            .users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());

        let sealed = Session::new(&user.name, &user.id)
            .encrypt(SESSION_KEY)
            .unwrap();
        (user, format!("SES={sealed}"))
    }
}

pub fn request(method: &str, path: &str) -> ApiRequest {
    ApiRequest {
        method: method.to_string(),
        path: path.to_string(),
        ..ApiRequest::default()
    }
}

pub fn authed(method: &str, path: &str, cookie: &str, body: Option<&str>) -> ApiRequest {
    ApiRequest {
        cookies: vec![cookie.to_string()],
        body: body.map(str::to_string),
        ..request(method, path)
    }
}

pub fn status(resp: &Value) -> u64 {
    resp["statusCode"].as_u64().unwrap()
}

pub fn body_json(resp: &Value) -> Value {
    serde_json::from_str(resp["body"].as_str().unwrap()).unwrap()
}

pub fn first_error(resp: &Value) -> Value {
    body_json(resp)["errors"][0].clone()
}

pub fn set_cookies(resp: &Value) -> Vec<String> {
    resp["cookies"]
        .as_array()
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
