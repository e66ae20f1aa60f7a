//! Slasher and bot configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Error message pool and permission assertion targets
//! - 1.0.0: YAML slasher config and environment bot config

use anyhow::Result;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::commands::slash::UnloadingBehaviour;
use crate::core::response::MESSAGE_LIMIT;
use crate::model::GuildId;

const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong while running this command.";

fn default_error_messages() -> Vec<String> {
    vec![DEFAULT_ERROR_MESSAGE.to_string()]
}

/// Behaviour of one [`Slasher`](crate::slasher::Slasher).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlasherConfig {
    /// What happens to a command's remote registration once it is removed locally.
    /// `inherit` is not allowed here.
    #[serde(default = "UnloadingBehaviour::slasher_default")]
    pub unloading_behaviour: UnloadingBehaviour,

    /// Push corrected permission overwrites instead of only warning about mismatches.
    #[serde(default)]
    pub enforce_application_command_permissions: bool,

    /// Guilds whose command permission overwrites are compared after each sync.
    #[serde(default)]
    pub assert_application_command_permission_mismatch_at: HashSet<GuildId>,

    /// Generic failure messages, one is picked at random per failure.
    #[serde(default = "default_error_messages")]
    pub error_messages: Vec<String>,
}

impl Default for SlasherConfig {
    fn default() -> Self {
        Self {
            unloading_behaviour: UnloadingBehaviour::slasher_default(),
            enforce_application_command_permissions: false,
            assert_application_command_permission_mismatch_at: HashSet::new(),
            error_messages: default_error_messages(),
        }
    }
}

impl SlasherConfig {
    /// Load slasher configuration from a YAML file
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: SlasherConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.unloading_behaviour == UnloadingBehaviour::Inherit {
            return Err(anyhow::anyhow!(
                "unloading_behaviour must be `keep` or `delete` at slasher level"
            ));
        }

        if self.error_messages.is_empty() {
            return Err(anyhow::anyhow!("error_messages cannot be empty"));
        }

        if let Some(message) = self
            .error_messages
            .iter()
            .find(|message| message.is_empty() || message.len() > MESSAGE_LIMIT)
        {
            return Err(anyhow::anyhow!(
                "Error message must be between 1 and {MESSAGE_LIMIT} bytes: {message:?}"
            ));
        }

        Ok(())
    }

    pub fn asserts_permissions_at(&self, guild_id: GuildId) -> bool {
        self.assert_application_command_permission_mismatch_at
            .contains(&guild_id)
    }

    pub fn pick_error_message(&self) -> String {
        self.error_messages
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
    }
}

/// Process configuration of the bot binary, read from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub application_id: u64,
    pub client_secret: Option<String>,
    pub discord_guild_id: Option<GuildId>,
    pub slasher_config_path: String,
    pub log_level: String,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let discord_token = std::env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN must be set"))?;
        let application_id = std::env::var("DISCORD_APPLICATION_ID")
            .map_err(|_| anyhow::anyhow!("DISCORD_APPLICATION_ID must be set"))?
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("DISCORD_APPLICATION_ID is not a snowflake: {e}"))?;
        let discord_guild_id = match std::env::var("DISCORD_GUILD_ID") {
            Ok(value) if !value.is_empty() => Some(
                value
                    .parse::<u64>()
                    .map_err(|e| anyhow::anyhow!("DISCORD_GUILD_ID is not a snowflake: {e}"))?,
            ),
            _ => None,
        };

        Ok(Self {
            discord_token,
            application_id,
            client_secret: std::env::var("DISCORD_CLIENT_SECRET")
                .ok()
                .filter(|secret| !secret.is_empty()),
            discord_guild_id,
            slasher_config_path: std::env::var("SLASHER_CONFIG")
                .unwrap_or_else(|_| "slasher.yaml".to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
