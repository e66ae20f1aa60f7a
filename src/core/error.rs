//! Error types shared by the command tree, the dispatcher and the sync engine
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Distinguish connectivity failures from Discord API errors
//! - 1.0.0: Initial error taxonomy

use thiserror::Error;

use crate::model::SyncId;

pub const ERROR_CODE_UNKNOWN_WEBHOOK: u32 = 10015;
pub const ERROR_CODE_UNKNOWN_INTERACTION: u32 = 10062;
pub const ERROR_CODE_UNKNOWN_APPLICATION_COMMAND: u32 = 10063;
pub const ERROR_CODE_INTERACTION_ALREADY_ACKNOWLEDGED: u32 = 40060;

/// Failure of one RPC issued through [`DiscordApi`](crate::api::DiscordApi).
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transient transport failure. Never reported, the operation is retried on the next sync.
    #[error("connection failure: {0}")]
    Connection(String),
    #[error("discord responded with status {status} (code {code}): {message}")]
    Discord {
        status: u16,
        code: u32,
        message: String,
    },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}

impl ApiError {
    pub fn is_connection(&self) -> bool {
        matches!(self, ApiError::Connection(_))
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            ApiError::Discord { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_unknown_application_command(&self) -> bool {
        self.code() == Some(ERROR_CODE_UNKNOWN_APPLICATION_COMMAND)
    }

    /// The interaction can no longer be answered through its initial response.
    pub fn is_interaction_gone(&self) -> bool {
        matches!(
            self.code(),
            Some(ERROR_CODE_UNKNOWN_INTERACTION | ERROR_CODE_INTERACTION_ALREADY_ACKNOWLEDGED)
        )
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Violations detected while declaring commands.
#[derive(Debug, Error)]
pub enum CommandBuildError {
    #[error("name `{name}` must be between 1 and 32 characters long")]
    NameLength { name: String },
    #[error("description of `{name}` must be between 2 and 100 characters long")]
    DescriptionLength { name: String },
    #[error("`{parent}` cannot have more than {limit} sub commands")]
    TooManySubCommands { parent: String, limit: usize },
    #[error("`{name}` cannot have more than {limit} parameters")]
    TooManyParameters { name: String, limit: usize },
    #[error("cannot add `{name}` under `{parent}`: sub categories cannot be nested any deeper")]
    TooDeep { name: String, parent: String },
    #[error("cannot add default sub command `{name}` to `{parent}`, `{existing}` is already the default")]
    DuplicateDefault {
        name: String,
        parent: String,
        existing: String,
    },
    #[error("`{name}` has a command function, sub commands cannot be added to it")]
    NotACategory { name: String },
    #[error("required parameter `{parameter}` of `{name}` follows an optional one")]
    RequiredAfterOptional { name: String, parameter: String },
    #[error("context command `{name}` cannot have sub commands or parameters")]
    ContextCommandShape { name: String },
    #[error("auto completer must name at least one parameter")]
    EmptyAutoCompleter,
    #[error("node {index} does not exist in `{command}`")]
    UnknownNode { command: String, index: usize },
    #[error("invalid custom id pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("custom id command `{name}` needs at least one custom id or pattern")]
    NoCustomId { name: String },
}

/// What a parameter would have accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionExpectation {
    /// A value of the named type.
    Type(String),
    /// One of the listed values, such as choice names or sub command names.
    OneOf(Vec<String>),
}

impl std::fmt::Display for ConversionExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionExpectation::Type(kind) => write!(f, "{kind}"),
            ConversionExpectation::OneOf(values) => {
                let rendered: Vec<String> = values.iter().map(|value| format!("`{value}`")).collect();
                write!(f, "one of {}", rendered.join(", "))
            }
        }
    }
}

/// An interaction carried a value its parameter (or sub command slot) cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid value for `{parameter}`: expected {expected}, received {}", .received.as_deref().unwrap_or("nothing"))]
pub struct SlashCommandParameterConversionError {
    pub parameter: String,
    pub expected: ConversionExpectation,
    pub received: Option<String>,
}

impl SlashCommandParameterConversionError {
    pub fn new(
        parameter: impl Into<String>,
        expected: ConversionExpectation,
        received: Option<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            expected,
            received,
        }
    }

    /// Message shown to the invoking user.
    pub fn user_message(&self) -> String {
        match &self.received {
            Some(received) => format!(
                "Invalid value for `{}`. Expected {}, got `{received}`.",
                self.parameter, self.expected
            ),
            None => format!(
                "Missing value for `{}`. Expected {}.",
                self.parameter, self.expected
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOperation {
    List,
    Create,
    Edit,
    Delete,
    ListPermissions,
    EditPermissions,
    RequestOwnerAccess,
    ApplicationInfo,
}

impl std::fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncOperation::List => "list commands",
            SyncOperation::Create => "create command",
            SyncOperation::Edit => "edit command",
            SyncOperation::Delete => "delete command",
            SyncOperation::ListPermissions => "list permissions",
            SyncOperation::EditPermissions => "edit permissions",
            SyncOperation::RequestOwnerAccess => "request owner access",
            SyncOperation::ApplicationInfo => "fetch application info",
        };
        f.write_str(name)
    }
}

/// A failed sync operation. `command` is `None` for orphan deletions and listings.
#[derive(Debug, Clone, Error)]
#[error("failed to {operation} (sync target {sync_id}, command {}): {source}", .command.as_deref().unwrap_or("-"))]
pub struct SlasherSyncError {
    pub sync_id: SyncId,
    pub command: Option<String>,
    pub operation: SyncOperation,
    #[source]
    pub source: ApiError,
}

impl SlasherSyncError {
    pub fn new(
        sync_id: SyncId,
        command: Option<String>,
        operation: SyncOperation,
        source: ApiError,
    ) -> Self {
        Self {
            sync_id,
            command,
            operation,
            source,
        }
    }
}
