//! Application command schemas as sent to and received from Discord.

use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::{is_false, null_as_default, snowflake, CommandId, GuildId};

/// What an application command is invoked on.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize_repr,
    Deserialize_repr,
)]
#[repr(u8)]
pub enum ApplicationCommandTargetType {
    #[default]
    ChatInput = 1,
    User = 2,
    Message = 3,
}

impl std::fmt::Display for ApplicationCommandTargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationCommandTargetType::ChatInput => write!(f, "chat_input"),
            ApplicationCommandTargetType::User => write!(f, "user"),
            ApplicationCommandTargetType::Message => write!(f, "message"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum ApplicationCommandOptionType {
    SubCommand = 1,
    SubCommandGroup = 2,
    String = 3,
    Integer = 4,
    Boolean = 5,
    User = 6,
    Channel = 7,
    Role = 8,
    Mentionable = 9,
    Number = 10,
    Attachment = 11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum IntegrationContextType {
    Guild = 0,
    BotPrivateChannel = 1,
    PrivateChannel = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum IntegrationType {
    GuildInstall = 0,
    UserInstall = 1,
}

/// Value of a choice. Integers are tried first so whole numbers stay integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceValue {
    Integer(i64),
    Number(f64),
    String(String),
}

impl std::fmt::Display for ChoiceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceValue::Integer(value) => write!(f, "{value}"),
            ChoiceValue::Number(value) => write!(f, "{value}"),
            ChoiceValue::String(value) => write!(f, "{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCommandOptionChoice {
    pub name: String,
    pub value: ChoiceValue,
}

impl ApplicationCommandOptionChoice {
    pub fn new(name: impl Into<String>, value: ChoiceValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Choice whose value is its own name.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            value: ChoiceValue::String(name.clone()),
            name,
        }
    }
}

/// One entry of a command's `options` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCommandOption {
    #[serde(rename = "type")]
    pub kind: ApplicationCommandOptionType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Local routing hint, Discord does not echo it back.
    #[serde(default, skip_serializing_if = "is_false")]
    pub default: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub autocomplete: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub choices: Vec<ApplicationCommandOptionChoice>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<ApplicationCommandOption>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub channel_types: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u16>,
}

impl ApplicationCommandOption {
    pub fn new(
        kind: ApplicationCommandOptionType,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
            default: false,
            autocomplete: false,
            choices: Vec::new(),
            options: Vec::new(),
            channel_types: Vec::new(),
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
        }
    }

    fn normalized(&self) -> Self {
        let mut option = self.clone();
        option.default = false;
        option.options = self.options.iter().map(Self::normalized).collect();
        option
    }
}

/// Key identifying a command within one sync target.
pub type CommandKey = (String, ApplicationCommandTargetType);

/// The payload describing one application command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationCommandSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub target: ApplicationCommandTargetType,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<ApplicationCommandOption>,
    #[serde(
        default,
        with = "snowflake::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_member_permissions: Option<u64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub nsfw: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub contexts: Vec<IntegrationContextType>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub integration_types: Vec<IntegrationType>,
}

impl ApplicationCommandSchema {
    pub fn key(&self) -> CommandKey {
        (self.name.clone(), self.target)
    }

    /// Full schema equality between a local schema and a remote listing.
    ///
    /// Fields Discord fills in on its own (integration types and contexts when
    /// left unset locally) and the local-only `default` hint are ignored.
    pub fn matches(&self, remote: &ApplicationCommandSchema) -> bool {
        if self.name != remote.name
            || self.description != remote.description
            || self.target != remote.target
            || self.default_member_permissions != remote.default_member_permissions
            || self.nsfw != remote.nsfw
        {
            return false;
        }

        if !self.contexts.is_empty() && self.contexts != remote.contexts {
            return false;
        }

        if !self.integration_types.is_empty() && self.integration_types != remote.integration_types
        {
            return false;
        }

        let local: Vec<_> = self
            .options
            .iter()
            .map(ApplicationCommandOption::normalized)
            .collect();
        let remote: Vec<_> = remote
            .options
            .iter()
            .map(ApplicationCommandOption::normalized)
            .collect();
        local == remote
    }
}

/// An application command as registered on Discord's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCommand {
    #[serde(with = "snowflake")]
    pub id: CommandId,
    #[serde(default, with = "snowflake::option")]
    pub guild_id: Option<GuildId>,
    #[serde(flatten)]
    pub schema: ApplicationCommandSchema,
}

impl RemoteCommand {
    pub fn key(&self) -> CommandKey {
        self.schema.key()
    }
}
