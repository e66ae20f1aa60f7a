//! # Discord HTTP Transport
//!
//! [`DiscordApi`] over Discord's REST API, plus conversions from the serenity
//! gateway models the bot binary receives.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: true (`serenity-api`)
//!
//! ## Changelog
//! - 1.1.0: Owner access through client credentials, rate limit retries
//! - 1.0.0: Command and interaction endpoints

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use log::{debug, warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serenity::model::application::command::CommandPermission;
use serenity::model::application::interaction::Interaction;
use std::time::Duration;

use crate::api::DiscordApi;
use crate::core::error::{ApiError, ApiResult};
use crate::core::response::ResponseMessage;
use crate::model::{
    ApplicationCommandOptionChoice, ApplicationCommandPermission,
    ApplicationCommandPermissionOverwrite, ApplicationCommandSchema, CommandId, GuildId,
    InteractionEvent, OwnerAccess, RemoteCommand,
};

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const RATE_LIMIT_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 30;

const CALLBACK_CHANNEL_MESSAGE: u8 = 4;
const CALLBACK_AUTOCOMPLETE_RESULT: u8 = 8;

#[derive(Debug, Default, Deserialize)]
struct DiscordErrorBody {
    #[serde(default)]
    code: u32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct RateLimited {
    retry_after: f64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    scope: String,
}

#[derive(Debug, Deserialize)]
struct ApplicationInfo {
    #[serde(default)]
    team: Option<Value>,
}

fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_decode() {
        ApiError::Decode(error.to_string())
    } else {
        ApiError::Connection(error.to_string())
    }
}

/// Converts between two serde representations of the same payload.
fn reshape<T: Serialize, U: DeserializeOwned>(value: &T) -> Result<U, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(value)?)
}

pub fn interaction_event(interaction: &Interaction) -> Result<InteractionEvent, serde_json::Error> {
    reshape(interaction)
}

pub fn command_permission(
    permission: &CommandPermission,
) -> Result<ApplicationCommandPermission, serde_json::Error> {
    reshape(permission)
}

/// Talks to Discord with the bot token. Permission edits additionally need
/// the client secret.
pub struct HttpDiscordApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
    application_id: u64,
    client_secret: Option<String>,
}

impl HttpDiscordApi {
    pub fn new(
        token: impl Into<String>,
        application_id: u64,
        client_secret: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!(
                "DiscordBot (https://github.com/slasher-rs/slasher, ",
                env!("CARGO_PKG_VERSION"),
                ")"
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: DISCORD_API_BASE.to_string(),
            token: token.into(),
            application_id,
            client_secret,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn commands_url(&self, guild_id: Option<GuildId>) -> String {
        match guild_id {
            Some(guild_id) => format!(
                "{}/applications/{}/guilds/{guild_id}/commands",
                self.base_url, self.application_id
            ),
            None => format!("{}/applications/{}/commands", self.base_url, self.application_id),
        }
    }

    fn command_url(&self, guild_id: Option<GuildId>, command_id: CommandId) -> String {
        format!("{}/{command_id}", self.commands_url(guild_id))
    }

    fn bot(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
    }

    /// Sends `request`, waiting out rate limits a few times before giving up.
    async fn execute(&self, request: RequestBuilder) -> ApiResult<Response> {
        let mut attempt = 0;
        loop {
            let current = request
                .try_clone()
                .ok_or_else(|| ApiError::Decode("request cannot be retried".to_string()))?;
            let response = current.send().await.map_err(transport_error)?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < RATE_LIMIT_RETRIES {
                let retry_after = response
                    .json::<RateLimited>()
                    .await
                    .map(|limited| limited.retry_after)
                    .unwrap_or(1.0);
                warn!("⏳ Rate limited, retrying in {retry_after:.2}s");
                tokio::time::sleep(Duration::from_secs_f64(retry_after.max(0.0))).await;
                attempt += 1;
                continue;
            }

            if status.is_success() {
                return Ok(response);
            }

            let body = response.json::<DiscordErrorBody>().await.unwrap_or_default();
            return Err(ApiError::Discord {
                status: status.as_u16(),
                code: body.code,
                message: body.message,
            });
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn list(&self, guild_id: Option<GuildId>) -> ApiResult<Vec<RemoteCommand>> {
        let url = self.commands_url(guild_id);
        self.json(self.bot(self.client.get(url))).await
    }

    async fn create(
        &self,
        guild_id: Option<GuildId>,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        let url = self.commands_url(guild_id);
        self.json(self.bot(self.client.post(url)).json(schema)).await
    }

    async fn edit(
        &self,
        guild_id: Option<GuildId>,
        command_id: CommandId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        let url = self.command_url(guild_id, command_id);
        self.json(self.bot(self.client.patch(url)).json(schema)).await
    }

    async fn delete(&self, guild_id: Option<GuildId>, command_id: CommandId) -> ApiResult<()> {
        let url = self.command_url(guild_id, command_id);
        self.execute(self.bot(self.client.delete(url))).await?;
        Ok(())
    }

    async fn callback(&self, event: &InteractionEvent, body: Value) -> ApiResult<()> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.base_url, event.id, event.token
        );
        self.execute(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

#[async_trait]
impl DiscordApi for HttpDiscordApi {
    async fn list_global_commands(&self) -> ApiResult<Vec<RemoteCommand>> {
        self.list(None).await
    }

    async fn list_guild_commands(&self, guild_id: GuildId) -> ApiResult<Vec<RemoteCommand>> {
        self.list(Some(guild_id)).await
    }

    async fn create_global_command(
        &self,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        self.create(None, schema).await
    }

    async fn create_guild_command(
        &self,
        guild_id: GuildId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        self.create(Some(guild_id), schema).await
    }

    async fn edit_global_command(
        &self,
        command_id: CommandId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        self.edit(None, command_id, schema).await
    }

    async fn edit_guild_command(
        &self,
        guild_id: GuildId,
        command_id: CommandId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        self.edit(Some(guild_id), command_id, schema).await
    }

    async fn delete_global_command(&self, command_id: CommandId) -> ApiResult<()> {
        self.delete(None, command_id).await
    }

    async fn delete_guild_command(&self, guild_id: GuildId, command_id: CommandId) -> ApiResult<()> {
        self.delete(Some(guild_id), command_id).await
    }

    async fn get_guild_permissions(
        &self,
        guild_id: GuildId,
    ) -> ApiResult<Vec<ApplicationCommandPermission>> {
        let url = format!("{}/permissions", self.commands_url(Some(guild_id)));
        self.json(self.bot(self.client.get(url))).await
    }

    async fn edit_permissions(
        &self,
        owner_access: &OwnerAccess,
        guild_id: GuildId,
        command_id: CommandId,
        overwrites: &[ApplicationCommandPermissionOverwrite],
    ) -> ApiResult<ApplicationCommandPermission> {
        let url = format!("{}/permissions", self.command_url(Some(guild_id), command_id));
        let request = self
            .client
            .put(url)
            .bearer_auth(&owner_access.access_token)
            .json(&json!({ "permissions": overwrites }));
        self.json(request).await
    }

    async fn request_owner_access(&self, scopes: &[&str]) -> ApiResult<OwnerAccess> {
        let secret = self
            .client_secret
            .as_deref()
            .ok_or(ApiError::MissingCredentials("client secret"))?;
        let scope = scopes.join(" ");
        let request = self
            .client
            .post(format!("{}/oauth2/token", self.base_url))
            .basic_auth(self.application_id, Some(secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())]);

        let token: TokenResponse = self.json(request).await?;
        debug!("Acquired owner access for scopes `{}`", token.scope);
        Ok(OwnerAccess {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
            scopes: token.scope.split_whitespace().map(str::to_string).collect(),
        })
    }

    async fn application_is_team_owned(&self) -> ApiResult<bool> {
        let url = format!("{}/oauth2/applications/@me", self.base_url);
        let info: ApplicationInfo = self.json(self.bot(self.client.get(url))).await?;
        Ok(info.team.is_some_and(|team| !team.is_null()))
    }

    async fn respond_message(
        &self,
        event: &InteractionEvent,
        message: &ResponseMessage,
    ) -> ApiResult<()> {
        let body = json!({ "type": CALLBACK_CHANNEL_MESSAGE, "data": message.to_data() });
        match self.callback(event, body).await {
            Err(e) if e.is_interaction_gone() => {
                let url = format!(
                    "{}/webhooks/{}/{}",
                    self.base_url, self.application_id, event.token
                );
                self.execute(self.client.post(url).json(&message.to_data()))
                    .await?;
                Ok(())
            }
            result => result,
        }
    }

    async fn respond_auto_complete(
        &self,
        event: &InteractionEvent,
        choices: &[ApplicationCommandOptionChoice],
    ) -> ApiResult<()> {
        let body = json!({
            "type": CALLBACK_AUTOCOMPLETE_RESULT,
            "data": { "choices": choices },
        });
        self.callback(event, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> HttpDiscordApi {
        HttpDiscordApi::new("token", 5, None)
            .unwrap()
            .with_base_url("http://localhost")
    }

    #[test]
    fn test_command_urls() {
        let api = api();
        assert_eq!(api.commands_url(None), "http://localhost/applications/5/commands");
        assert_eq!(
            api.command_url(Some(700), 1001),
            "http://localhost/applications/5/guilds/700/commands/1001"
        );
    }

    #[test]
    fn test_error_body_tolerates_missing_fields() {
        let body: DiscordErrorBody = serde_json::from_str(r#"{"message":"Missing Access"}"#).unwrap();
        assert_eq!(body.code, 0);
        assert_eq!(body.message, "Missing Access");
    }

    #[tokio::test]
    async fn test_owner_access_requires_secret() {
        let error = api().request_owner_access(&["applications.commands.permissions.update"]).await;
        assert!(matches!(error, Err(ApiError::MissingCredentials(_))));
    }
}
