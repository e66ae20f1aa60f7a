//! Application command permission overwrites and owner access tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{snowflake, CommandId, GuildId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize_repr, Deserialize_repr,
)]
#[repr(u8)]
pub enum PermissionOverwriteTargetType {
    Role = 1,
    User = 2,
    Channel = 3,
}

impl std::fmt::Display for PermissionOverwriteTargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionOverwriteTargetType::Role => write!(f, "role"),
            PermissionOverwriteTargetType::User => write!(f, "user"),
            PermissionOverwriteTargetType::Channel => write!(f, "channel"),
        }
    }
}

/// Allows or denies a command for one role, user or channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationCommandPermissionOverwrite {
    #[serde(rename = "type")]
    pub target_type: PermissionOverwriteTargetType,
    #[serde(rename = "id", with = "snowflake")]
    pub target_id: u64,
    #[serde(rename = "permission")]
    pub allow: bool,
}

impl ApplicationCommandPermissionOverwrite {
    pub fn role(role_id: u64, allow: bool) -> Self {
        Self {
            target_type: PermissionOverwriteTargetType::Role,
            target_id: role_id,
            allow,
        }
    }

    pub fn user(user_id: u64, allow: bool) -> Self {
        Self {
            target_type: PermissionOverwriteTargetType::User,
            target_id: user_id,
            allow,
        }
    }

    pub fn channel(channel_id: u64, allow: bool) -> Self {
        Self {
            target_type: PermissionOverwriteTargetType::Channel,
            target_id: channel_id,
            allow,
        }
    }
}

/// Permission overwrites of one command inside one guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCommandPermission {
    #[serde(rename = "id", with = "snowflake")]
    pub application_command_id: CommandId,
    #[serde(default, with = "snowflake::option")]
    pub application_id: Option<u64>,
    #[serde(with = "snowflake")]
    pub guild_id: GuildId,
    #[serde(default, rename = "permissions")]
    pub permission_overwrites: Vec<ApplicationCommandPermissionOverwrite>,
}

/// Bearer access of the application owner, required to edit command permissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerAccess {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl OwnerAccess {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
