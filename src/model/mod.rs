//! # Model
//!
//! Opaque data carriers exchanged with the transport layer. Only the fields the
//! slash-command subsystem reads or writes are modelled; everything else on the
//! wire is ignored during deserialization.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Integration types and contexts on command schemas
//! - 1.1.0: Permission overwrites and owner access
//! - 1.0.0: Command schemas and interaction events

pub mod command;
pub mod interaction;
pub mod permission;

pub use command::{
    ApplicationCommandOption, ApplicationCommandOptionChoice, ApplicationCommandOptionType,
    ApplicationCommandSchema, ApplicationCommandTargetType, ChoiceValue, CommandKey,
    IntegrationContextType, IntegrationType, RemoteCommand,
};
pub use interaction::{InteractionData, InteractionEvent, InteractionOption, InteractionType};
pub use permission::{
    ApplicationCommandPermission, ApplicationCommandPermissionOverwrite, OwnerAccess,
    PermissionOverwriteTargetType,
};

/// Discord snowflake of a guild.
pub type GuildId = u64;
/// Discord snowflake of a registered application command.
pub type CommandId = u64;
/// Identifier of a synchronization target: a guild id or one of the `SYNC_ID_*` sentinels.
pub type SyncId = u64;

/// Sync id of the global command set.
pub const SYNC_ID_GLOBAL: SyncId = 0;
/// Sync id used to deduplicate concurrent top-level syncs.
pub const SYNC_ID_MAIN: SyncId = 1;
/// Sync id of the non-global template pool.
pub const SYNC_ID_NON_GLOBAL: SyncId = 2;

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

/// Accepts both `null` and a missing field as the default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    use serde::Deserialize;
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Snowflakes travel as strings but some payloads carry plain integers.
pub(crate) mod snowflake {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(u64),
        String(String),
    }

    impl Raw {
        fn into_u64<E: de::Error>(self) -> Result<u64, E> {
            match self {
                Raw::Integer(value) => Ok(value),
                Raw::String(value) => value
                    .parse()
                    .map_err(|_| E::custom(format!("invalid snowflake `{value}`"))),
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        Raw::deserialize(deserializer)?.into_u64()
    }

    pub mod option {
        use super::Raw;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<u64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(value) => serializer.collect_str(value),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<u64>, D::Error> {
            Option::<Raw>::deserialize(deserializer)?
                .map(Raw::into_u64)
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Carrier {
        #[serde(with = "snowflake")]
        id: u64,
        #[serde(default, with = "snowflake::option")]
        guild_id: Option<u64>,
    }

    #[test]
    fn test_snowflake_accepts_strings_and_integers() {
        let from_string: Carrier = serde_json::from_str(r#"{"id":"123","guild_id":"7"}"#).unwrap();
        let from_integer: Carrier = serde_json::from_str(r#"{"id":123,"guild_id":null}"#).unwrap();

        assert_eq!(from_string, Carrier { id: 123, guild_id: Some(7) });
        assert_eq!(from_integer, Carrier { id: 123, guild_id: None });
    }

    #[test]
    fn test_snowflake_serializes_as_string() {
        let json = serde_json::to_value(Carrier { id: 99, guild_id: None }).unwrap();
        assert_eq!(json["id"], "99");
    }

    #[test]
    fn test_sync_ids_are_distinct() {
        assert_ne!(SYNC_ID_GLOBAL, SYNC_ID_MAIN);
        assert_ne!(SYNC_ID_MAIN, SYNC_ID_NON_GLOBAL);
    }
}
