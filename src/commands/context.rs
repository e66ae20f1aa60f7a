//! Shared context for command callbacks
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Interaction scoped context over the abstract Discord API
//! - 1.0.0: Initial implementation with core shared state

use std::sync::Arc;

use crate::api::DiscordApi;
use crate::core::error::ApiResult;
use crate::core::response::ResponseMessage;
use crate::model::{GuildId, InteractionEvent};

/// Everything a callback needs to answer one interaction.
///
/// Cheap to clone, the event and the API client are shared.
#[derive(Clone)]
pub struct InteractionContext {
    pub api: Arc<dyn DiscordApi>,
    pub event: Arc<InteractionEvent>,
}

impl InteractionContext {
    pub fn new(api: Arc<dyn DiscordApi>, event: InteractionEvent) -> Self {
        Self {
            api,
            event: Arc::new(event),
        }
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.event.guild_id
    }

    pub fn user_id(&self) -> Option<u64> {
        self.event.user_id()
    }

    /// Target user or message of a context menu command.
    pub fn target_id(&self) -> Option<u64> {
        self.event.data.target_id
    }

    pub async fn respond(&self, message: &ResponseMessage) -> ApiResult<()> {
        self.api.respond_message(&self.event, message).await
    }
}
