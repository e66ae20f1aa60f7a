//! In-memory Discord API and interaction builders for unit tests

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::api::DiscordApi;
use crate::commands::context::InteractionContext;
use crate::core::error::{ApiError, ApiResult, ERROR_CODE_UNKNOWN_APPLICATION_COMMAND};
use crate::core::response::ResponseMessage;
use crate::model::{
    ApplicationCommandOptionChoice, ApplicationCommandPermission,
    ApplicationCommandPermissionOverwrite, ApplicationCommandSchema, CommandId, GuildId,
    InteractionData, InteractionEvent, InteractionOption, InteractionType, OwnerAccess,
    RemoteCommand,
};
use crate::model::interaction::InteractionUser;

pub const APPLICATION_ID: u64 = 5;
pub const USER_ID: u64 = 42;

#[derive(Default)]
pub struct MockApi {
    commands: Mutex<Vec<RemoteCommand>>,
    permissions: Mutex<Vec<ApplicationCommandPermission>>,
    next_id: AtomicU64,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    delay: Option<Duration>,
    team_owned: AtomicBool,
    responses: Mutex<Vec<ResponseMessage>>,
    auto_complete_responses: Mutex<Vec<Vec<ApplicationCommandOptionChoice>>>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub edit_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub permission_edits: AtomicUsize,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Self::default()
        }
    }

    /// Every call sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unknown_command() -> ApiError {
        ApiError::Discord {
            status: 404,
            code: ERROR_CODE_UNKNOWN_APPLICATION_COMMAND,
            message: "Unknown application command".to_string(),
        }
    }

    /// Makes every call of `operation` fail with `error` until cleared.
    pub fn fail(&self, operation: &'static str, error: ApiError) {
        self.failures.lock().insert(operation, error);
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.failures.lock().remove(operation);
    }

    pub fn set_team_owned(&self, team_owned: bool) {
        self.team_owned.store(team_owned, Ordering::SeqCst);
    }

    fn insert(&self, guild_id: Option<GuildId>, schema: ApplicationCommandSchema) -> RemoteCommand {
        let remote = RemoteCommand {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            guild_id,
            schema,
        };
        self.commands.lock().push(remote.clone());
        remote
    }

    pub fn seed_global(&self, schema: ApplicationCommandSchema) -> CommandId {
        self.insert(None, schema).id
    }

    pub fn seed_guild(&self, guild_id: GuildId, schema: ApplicationCommandSchema) -> CommandId {
        self.insert(Some(guild_id), schema).id
    }

    pub fn global_commands(&self) -> Vec<RemoteCommand> {
        self.scoped(None)
    }

    pub fn guild_commands(&self, guild_id: GuildId) -> Vec<RemoteCommand> {
        self.scoped(Some(guild_id))
    }

    pub fn responses(&self) -> Vec<ResponseMessage> {
        self.responses.lock().clone()
    }

    pub fn auto_complete_responses(&self) -> Vec<Vec<ApplicationCommandOptionChoice>> {
        self.auto_complete_responses.lock().clone()
    }

    fn scoped(&self, guild_id: Option<GuildId>) -> Vec<RemoteCommand> {
        self.commands
            .lock()
            .iter()
            .filter(|remote| remote.guild_id == guild_id)
            .cloned()
            .collect()
    }

    async fn enter(&self, operation: &'static str) -> ApiResult<()> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.failures.lock().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn list(&self, guild_id: Option<GuildId>) -> ApiResult<Vec<RemoteCommand>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("list").await?;
        Ok(self.scoped(guild_id))
    }

    async fn create(
        &self,
        guild_id: Option<GuildId>,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("create").await?;
        Ok(self.insert(guild_id, schema.clone()))
    }

    async fn edit(
        &self,
        guild_id: Option<GuildId>,
        command_id: CommandId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand> {
        self.edit_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("edit").await?;
        let mut commands = self.commands.lock();
        let remote = commands
            .iter_mut()
            .find(|remote| remote.id == command_id && remote.guild_id == guild_id)
            .ok_or_else(Self::unknown_command)?;
        remote.schema = schema.clone();
        Ok(remote.clone())
    }

    async fn delete(&self, guild_id: Option<GuildId>, command_id: CommandId) -> ApiResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.enter("delete").await?;
        let mut commands = self.commands.lock();
        let position = commands
            .iter()
            .position(|remote| remote.id == command_id && remote.guild_id == guild_id)
            .ok_or_else(Self::unknown_command)?;
        commands.remove(position);
        Ok(())
    }
}

#[async_trait]
impl DiscordApi for MockApi {
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
        self.enter("list_permissions").await?;
        Ok(self
            .permissions
            .lock()
            .iter()
            .filter(|permission| permission.guild_id == guild_id)
            .cloned()
            .collect())
    }

    async fn edit_permissions(
        &self,
        _owner_access: &OwnerAccess,
        guild_id: GuildId,
        command_id: CommandId,
        overwrites: &[ApplicationCommandPermissionOverwrite],
    ) -> ApiResult<ApplicationCommandPermission> {
        self.permission_edits.fetch_add(1, Ordering::SeqCst);
        self.enter("edit_permissions").await?;
        let permission = ApplicationCommandPermission {
            application_command_id: command_id,
            application_id: Some(APPLICATION_ID),
            guild_id,
            permission_overwrites: overwrites.to_vec(),
        };
        let mut permissions = self.permissions.lock();
        permissions.retain(|existing| {
            existing.guild_id != guild_id || existing.application_command_id != command_id
        });
        permissions.push(permission.clone());
        Ok(permission)
    }

    async fn request_owner_access(&self, scopes: &[&str]) -> ApiResult<OwnerAccess> {
        self.enter("request_owner_access").await?;
        Ok(OwnerAccess {
            access_token: "owner-token".to_string(),
            expires_at: Utc::now() + ChronoDuration::days(7),
            scopes: scopes.iter().map(|scope| scope.to_string()).collect(),
        })
    }

    async fn application_is_team_owned(&self) -> ApiResult<bool> {
        self.enter("application_info").await?;
        Ok(self.team_owned.load(Ordering::SeqCst))
    }

    async fn respond_message(
        &self,
        _event: &InteractionEvent,
        message: &ResponseMessage,
    ) -> ApiResult<()> {
        self.enter("respond").await?;
        self.responses.lock().push(message.clone());
        Ok(())
    }

    async fn respond_auto_complete(
        &self,
        _event: &InteractionEvent,
        choices: &[ApplicationCommandOptionChoice],
    ) -> ApiResult<()> {
        self.enter("respond").await?;
        self.auto_complete_responses.lock().push(choices.to_vec());
        Ok(())
    }
}

pub fn context(api: Arc<dyn DiscordApi>, event: InteractionEvent) -> InteractionContext {
    InteractionContext::new(api, event)
}

fn event(kind: InteractionType, data: InteractionData) -> InteractionEvent {
    InteractionEvent {
        id: 10,
        application_id: APPLICATION_ID,
        kind,
        data,
        guild_id: None,
        channel_id: Some(900),
        member: None,
        user: Some(InteractionUser {
            id: USER_ID,
            username: "yuuka".to_string(),
        }),
        token: "token".to_string(),
    }
}

pub fn application_command_event(
    command_id: CommandId,
    name: &str,
    options: Vec<InteractionOption>,
) -> InteractionEvent {
    event(
        InteractionType::ApplicationCommand,
        InteractionData {
            id: Some(command_id),
            name: name.to_string(),
            options,
            ..InteractionData::default()
        },
    )
}

pub fn auto_complete_event(
    command_id: CommandId,
    name: &str,
    options: Vec<InteractionOption>,
) -> InteractionEvent {
    InteractionEvent {
        kind: InteractionType::ApplicationCommandAutocomplete,
        ..application_command_event(command_id, name, options)
    }
}

pub fn component_event(custom_id: &str) -> InteractionEvent {
    event(
        InteractionType::MessageComponent,
        InteractionData {
            custom_id: custom_id.to_string(),
            ..InteractionData::default()
        },
    )
}

pub fn form_event(custom_id: &str, components: Vec<serde_json::Value>) -> InteractionEvent {
    event(
        InteractionType::ModalSubmit,
        InteractionData {
            custom_id: custom_id.to_string(),
            components,
            ..InteractionData::default()
        },
    )
}
