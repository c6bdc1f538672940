//! Persistence of teams, users, configurations and OAuth states.
//!
//! Records are JSON documents kept as SSM `SecureString` parameters under a
//! common prefix. Parameters use the intelligent tier so that large
//! configurations (up to 8 KB) fit and OAuth states carry an expiration policy.

use async_trait::async_trait;
use aws_sdk_ssm::Client as SsmClient;
use aws_sdk_ssm::operation::put_parameter::builders::PutParameterFluentBuilder;
use aws_sdk_ssm::types::{ParameterTier, ParameterType};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use super::models::{Configuration, OAUTH_STATE_TTL_MINUTES, OAuthState, Team, User};
use crate::errors::ServiceError;

#[async_trait]
pub trait Repository: Send + Sync {
    /// Stored configuration for `team`, or the empty default when none was saved.
    async fn channels_and_groups(&self, team: &str) -> Result<Configuration, ServiceError>;

    async fn set_channels_and_groups(
        &self,
        team: &str,
        conf: &Configuration,
    ) -> Result<(), ServiceError>;

    async fn set_oauth_state(&self, state: &OAuthState) -> Result<(), ServiceError>;

    /// Fetch and delete a state so it cannot be replayed.
    async fn take_oauth_state(&self, state: &str) -> Result<Option<OAuthState>, ServiceError>;

    async fn team_by_external_id(&self, external_id: &str) -> Result<Option<Team>, ServiceError>;

    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, ServiceError>;

    async fn user(&self, id: &str) -> Result<Option<User>, ServiceError>;

    async fn set_team_and_user(&self, team: &Team, user: &User) -> Result<(), ServiceError>;
}

fn key_for(prefix: &str, kind: &str, id: &str) -> String {
    let mut p = prefix.to_string();
    if !p.ends_with('/') {
        p.push('/');
    }
    format!("{p}{kind}/{id}")
}

/// SSM policy that deletes an OAuth state once it can no longer be used.
fn oauth_state_policy(issued: DateTime<Utc>) -> String {
    let expires = issued + Duration::minutes(OAUTH_STATE_TTL_MINUTES);
    json!([{
        "Type": "Expiration",
        "Version": "1.0",
        "Attributes": {
            "Timestamp": expires.to_rfc3339_opts(SecondsFormat::Millis, true)
        }
    }])
    .to_string()
}

pub struct SsmRepository {
    client: SsmClient,
    prefix: String,
}

impl SsmRepository {
    #[must_use]
    pub fn new(shared: &aws_config::SdkConfig, prefix: &str) -> Self {
        Self {
            client: SsmClient::new(shared),
            prefix: prefix.to_string(),
        }
    }

    fn put_request(&self, name: &str, value: String) -> PutParameterFluentBuilder {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::SecureString)
            .tier(ParameterTier::IntelligentTiering)
            .overwrite(true)
    }

    async fn put<T: Serialize + Sync>(
        &self,
        kind: &str,
        id: &str,
        value: &T,
        policies: Option<String>,
    ) -> Result<(), ServiceError> {
        let name = key_for(&self.prefix, kind, id);
        let value = serde_json::to_string(value)
            .map_err(|e| ServiceError::GeneralError(format!("{kind} serialize: {e}")))?;

        self.put_request(&name, value)
            .set_policies(policies)
            .send()
            .await
            .map_err(|e| ServiceError::AwsError(format!("ssm put_parameter: {e}")))?;

        debug!(parameter = %name, "Stored record");
        Ok(())
    }

    async fn get<T: DeserializeOwned>(
        &self,
        kind: &str,
        id: &str,
    ) -> Result<Option<T>, ServiceError> {
        let name = key_for(&self.prefix, kind, id);

        match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(resp) => {
                let Some(param) = resp.parameter else {
                    return Ok(None);
                };
                let Some(value) = param.value() else {
                    return Ok(None);
                };
                let record: T = serde_json::from_str(value)
                    .map_err(|e| ServiceError::ParseError(format!("{kind} parse: {e}")))?;
                Ok(Some(record))
            }
            Err(e) => {
                let msg = format!("{e:?}");
                if msg.contains("ParameterNotFound") {
                    Ok(None)
                } else {
                    Err(ServiceError::AwsError(format!("ssm get_parameter: {e}")))
                }
            }
        }
    }

    async fn delete(&self, kind: &str, id: &str) -> Result<(), ServiceError> {
        let name = key_for(&self.prefix, kind, id);
        match self.client.delete_parameter().name(name).send().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let msg = format!("{e:?}");
                if msg.contains("ParameterNotFound") {
                    Ok(())
                } else {
                    Err(ServiceError::AwsError(format!("ssm delete_parameter: {e}")))
                }
            }
        }
    }
}

#[async_trait]
impl Repository for SsmRepository {
    async fn channels_and_groups(&self, team: &str) -> Result<Configuration, ServiceError> {
        Ok(self.get("conf", team).await?.unwrap_or_default())
    }

    async fn set_channels_and_groups(
        &self,
        team: &str,
        conf: &Configuration,
    ) -> Result<(), ServiceError> {
        self.put("conf", team, conf, None).await
    }

    async fn set_oauth_state(&self, state: &OAuthState) -> Result<(), ServiceError> {
        self.put(
            "oauth_state",
            &state.state,
            state,
            Some(oauth_state_policy(state.timestamp)),
        )
        .await
    }

    async fn take_oauth_state(&self, state: &str) -> Result<Option<OAuthState>, ServiceError> {
        let saved: Option<OAuthState> = self.get("oauth_state", state).await?;
        if saved.is_some() {
            self.delete("oauth_state", state).await?;
        }
        Ok(saved)
    }

    async fn team_by_external_id(&self, external_id: &str) -> Result<Option<Team>, ServiceError> {
        let local: Option<String> = self.get("external/teams", external_id).await?;
        match local {
            Some(id) => self.get("teams", &id).await,
            None => Ok(None),
        }
    }

    async fn user_by_external_id(&self, external_id: &str) -> Result<Option<User>, ServiceError> {
        let local: Option<String> = self.get("external/users", external_id).await?;
        match local {
            Some(id) => self.user(&id).await,
            None => Ok(None),
        }
    }

    async fn user(&self, id: &str) -> Result<Option<User>, ServiceError> {
        self.get("users", id).await
    }

    async fn set_team_and_user(&self, team: &Team, user: &User) -> Result<(), ServiceError> {
        self.put("teams", &team.id, team, None).await?;
        self.put("external/teams", &team.external_id, &team.id, None)
            .await?;
        self.put("users", &user.id, user, None).await?;
        self.put("external/users", &user.external_id, &user.id, None)
            .await
    }
}
