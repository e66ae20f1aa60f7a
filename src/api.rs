//! # Discord API
//!
//! The RPC surface the slasher consumes. Transports implement [`DiscordApi`];
//! the crate ships a serenity backed implementation behind the `serenity-api`
//! feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Interaction responses and autocomplete choices
//! - 1.0.0: Command and permission RPCs

use async_trait::async_trait;

use crate::core::error::ApiResult;
use crate::core::response::ResponseMessage;
use crate::model::{
    ApplicationCommandOptionChoice, ApplicationCommandPermission,
    ApplicationCommandPermissionOverwrite, ApplicationCommandSchema, CommandId, GuildId,
    InteractionEvent, OwnerAccess, RemoteCommand,
};

/// Scope requested when acquiring owner access for permission edits.
pub const OWNER_ACCESS_SCOPES: &[&str] = &["applications.commands.permissions.update"];

#[async_trait]
pub trait DiscordApi: Send + Sync {
    async fn list_global_commands(&self) -> ApiResult<Vec<RemoteCommand>>;

    async fn list_guild_commands(&self, guild_id: GuildId) -> ApiResult<Vec<RemoteCommand>>;

    async fn create_global_command(
        &self,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand>;

    async fn create_guild_command(
        &self,
        guild_id: GuildId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand>;

    async fn edit_global_command(
        &self,
        command_id: CommandId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand>;

    async fn edit_guild_command(
        &self,
        guild_id: GuildId,
        command_id: CommandId,
        schema: &ApplicationCommandSchema,
    ) -> ApiResult<RemoteCommand>;

    async fn delete_global_command(&self, command_id: CommandId) -> ApiResult<()>;

    async fn delete_guild_command(&self, guild_id: GuildId, command_id: CommandId)
        -> ApiResult<()>;

    async fn get_guild_permissions(
        &self,
        guild_id: GuildId,
    ) -> ApiResult<Vec<ApplicationCommandPermission>>;

    /// Replaces the overwrites of one command. Needs the owner's bearer access.
    async fn edit_permissions(
        &self,
        owner_access: &OwnerAccess,
        guild_id: GuildId,
        command_id: CommandId,
        overwrites: &[ApplicationCommandPermissionOverwrite],
    ) -> ApiResult<ApplicationCommandPermission>;

    async fn request_owner_access(&self, scopes: &[&str]) -> ApiResult<OwnerAccess>;

    /// Whether the application belongs to a team, in which case owner access is unavailable.
    async fn application_is_team_owned(&self) -> ApiResult<bool>;

    /// Answers the interaction with a message, or sends a follow-up if it was already answered.
    async fn respond_message(
        &self,
        event: &InteractionEvent,
        message: &ResponseMessage,
    ) -> ApiResult<()>;

    async fn respond_auto_complete(
        &self,
        event: &InteractionEvent,
        choices: &[ApplicationCommandOptionChoice],
    ) -> ApiResult<()>;
}
