//! Slash command parameters and value conversion
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.4.0
//!
//! ## Changelog
//! - 1.2.0: Pluggable value converters
//! - 1.1.0: Choice validation
//! - 1.0.0: Typed parameters with display names

use serde_json::Value;
use std::sync::Arc;

use super::auto_complete::SlashCommandParameterAutoCompleter;
use crate::core::error::{
    CommandBuildError, ConversionExpectation, SlashCommandParameterConversionError,
};
use crate::model::{
    ApplicationCommandOption, ApplicationCommandOptionChoice, ApplicationCommandOptionType,
    ChoiceValue, InteractionOption,
};

/// Converts a Python style or spaced name into the form Discord accepts for
/// chat input names: lowercase words joined by hyphens.
pub fn raw_name_to_display(raw_name: &str) -> String {
    raw_name
        .trim_matches(|c: char| c == '_' || c == ' ')
        .to_lowercase()
        .split(|c: char| c == '_' || c == ' ' || c == '-')
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// A converted parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(String),
    Integer(i64),
    Number(f64),
    Boolean(bool),
    /// User, channel, role, mentionable or attachment id.
    Snowflake(u64),
}

impl ParameterValue {
    fn matches_choice(&self, choice: &ChoiceValue) -> bool {
        match (self, choice) {
            (ParameterValue::String(value), ChoiceValue::String(choice)) => value == choice,
            (ParameterValue::Integer(value), ChoiceValue::Integer(choice)) => value == choice,
            (ParameterValue::Integer(value), ChoiceValue::Number(choice)) => {
                (*value as f64 - choice).abs() < f64::EPSILON
            }
            (ParameterValue::Number(value), ChoiceValue::Number(choice)) => {
                (value - choice).abs() < f64::EPSILON
            }
            (ParameterValue::Number(value), ChoiceValue::Integer(choice)) => {
                (value - *choice as f64).abs() < f64::EPSILON
            }
            _ => false,
        }
    }
}

/// Turns a raw option value into a [`ParameterValue`].
pub trait ValueConverter: Send + Sync {
    /// Human readable description of accepted values, used in error messages.
    fn expected(&self) -> String;

    fn convert(&self, value: &Value) -> Option<ParameterValue>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Role,
    Mentionable,
    Number,
    Attachment,
}

impl ParameterType {
    pub fn option_type(&self) -> ApplicationCommandOptionType {
        match self {
            ParameterType::String => ApplicationCommandOptionType::String,
            ParameterType::Integer => ApplicationCommandOptionType::Integer,
            ParameterType::Boolean => ApplicationCommandOptionType::Boolean,
            ParameterType::User => ApplicationCommandOptionType::User,
            ParameterType::Channel => ApplicationCommandOptionType::Channel,
            ParameterType::Role => ApplicationCommandOptionType::Role,
            ParameterType::Mentionable => ApplicationCommandOptionType::Mentionable,
            ParameterType::Number => ApplicationCommandOptionType::Number,
            ParameterType::Attachment => ApplicationCommandOptionType::Attachment,
        }
    }

    /// Only free text and numeric parameters can be auto-completed.
    pub fn can_auto_complete(&self) -> bool {
        matches!(
            self,
            ParameterType::String | ParameterType::Integer | ParameterType::Number
        )
    }
}

impl ValueConverter for ParameterType {
    fn expected(&self) -> String {
        match self {
            ParameterType::String => "a text",
            ParameterType::Integer => "an integer",
            ParameterType::Boolean => "true or false",
            ParameterType::User => "a user",
            ParameterType::Channel => "a channel",
            ParameterType::Role => "a role",
            ParameterType::Mentionable => "a user or role",
            ParameterType::Number => "a number",
            ParameterType::Attachment => "an attachment",
        }
        .to_string()
    }

    fn convert(&self, value: &Value) -> Option<ParameterValue> {
        match self {
            ParameterType::String => value.as_str().map(|s| ParameterValue::String(s.to_string())),
            ParameterType::Integer => value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .map(ParameterValue::Integer),
            ParameterType::Number => value
                .as_f64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .map(ParameterValue::Number),
            ParameterType::Boolean => value.as_bool().map(ParameterValue::Boolean),
            ParameterType::User
            | ParameterType::Channel
            | ParameterType::Role
            | ParameterType::Mentionable
            | ParameterType::Attachment => value
                .as_str()
                .and_then(|s| s.parse().ok())
                .or_else(|| value.as_u64())
                .map(ParameterValue::Snowflake),
        }
    }
}

fn render_received(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// One declared parameter of a slash command function.
#[derive(Clone)]
pub struct ParameterConverter {
    pub raw_name: String,
    /// Name shown to users and used on the wire.
    pub name: String,
    pub description: String,
    pub kind: ParameterType,
    pub required: bool,
    pub default: Option<ParameterValue>,
    pub choices: Vec<ApplicationCommandOptionChoice>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub min_length: Option<u16>,
    pub max_length: Option<u16>,
    converter: Arc<dyn ValueConverter>,
    pub(crate) auto_completer: Option<SlashCommandParameterAutoCompleter>,
}

impl ParameterConverter {
    /// Creates a required parameter.
    pub fn new(
        raw_name: impl Into<String>,
        kind: ParameterType,
        description: impl Into<String>,
    ) -> Result<Self, CommandBuildError> {
        let raw_name = raw_name.into();
        let name = raw_name_to_display(&raw_name);
        let description = description.into();

        if name.is_empty() || name.chars().count() > 32 {
            return Err(CommandBuildError::NameLength { name: raw_name });
        }
        let description_length = description.chars().count();
        if !(2..=100).contains(&description_length) {
            return Err(CommandBuildError::DescriptionLength { name });
        }

        Ok(Self {
            raw_name,
            name,
            description,
            kind,
            required: true,
            default: None,
            choices: Vec::new(),
            min_value: None,
            max_value: None,
            min_length: None,
            max_length: None,
            converter: Arc::new(kind),
            auto_completer: None,
        })
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the option is omitted. Makes the parameter optional.
    pub fn with_default(mut self, default: ParameterValue) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    pub fn choices(mut self, choices: Vec<ApplicationCommandOptionChoice>) -> Self {
        self.choices = choices;
        self
    }

    pub fn value_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_value = min;
        self.max_value = max;
        self
    }

    pub fn length_range(mut self, min: Option<u16>, max: Option<u16>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn auto_completer(&self) -> Option<&SlashCommandParameterAutoCompleter> {
        self.auto_completer.as_ref()
    }

    /// Whether a completer may be attached to this parameter.
    pub fn is_auto_completable(&self) -> bool {
        self.kind.can_auto_complete() && self.choices.is_empty()
    }

    pub fn as_option(&self) -> ApplicationCommandOption {
        let mut option =
            ApplicationCommandOption::new(self.kind.option_type(), &self.name, &self.description);
        option.required = self.required;
        option.autocomplete = self.auto_completer.is_some();
        option.choices = self.choices.clone();
        option.min_value = self.min_value;
        option.max_value = self.max_value;
        option.min_length = self.min_length;
        option.max_length = self.max_length;
        option
    }

    /// Converts the option addressed to this parameter, if the interaction carried one.
    pub fn convert(
        &self,
        option: Option<&InteractionOption>,
    ) -> Result<Option<ParameterValue>, SlashCommandParameterConversionError> {
        let Some(value) = option.and_then(|option| option.value.as_ref()) else {
            if self.required {
                return Err(self.conversion_error(None));
            }
            return Ok(self.default.clone());
        };

        let converted = self
            .converter
            .convert(value)
            .ok_or_else(|| self.conversion_error(Some(render_received(value))))?;

        if !self.choices.is_empty()
            && !self
                .choices
                .iter()
                .any(|choice| converted.matches_choice(&choice.value))
        {
            return Err(SlashCommandParameterConversionError::new(
                &self.name,
                ConversionExpectation::OneOf(
                    self.choices.iter().map(|choice| choice.name.clone()).collect(),
                ),
                Some(render_received(value)),
            ));
        }

        Ok(Some(converted))
    }

    fn conversion_error(&self, received: Option<String>) -> SlashCommandParameterConversionError {
        SlashCommandParameterConversionError::new(
            &self.name,
            ConversionExpectation::Type(self.converter.expected()),
            received,
        )
    }
}

impl std::fmt::Debug for ParameterConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterConverter")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("auto_complete", &self.auto_completer.is_some())
            .finish()
    }
}

/// Converted parameters passed to a command callback, keyed by raw name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Option<ParameterValue>)>,
}

impl Arguments {
    pub(crate) fn push(&mut self, raw_name: &str, value: Option<ParameterValue>) {
        self.values.push((raw_name.to_string(), value));
    }

    pub fn get(&self, raw_name: &str) -> Option<&ParameterValue> {
        self.values
            .iter()
            .find(|(name, _)| name == raw_name)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn string(&self, raw_name: &str) -> Option<&str> {
        match self.get(raw_name)? {
            ParameterValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn integer(&self, raw_name: &str) -> Option<i64> {
        match self.get(raw_name)? {
            ParameterValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn number(&self, raw_name: &str) -> Option<f64> {
        match self.get(raw_name)? {
            ParameterValue::Number(value) => Some(*value),
            ParameterValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn boolean(&self, raw_name: &str) -> Option<bool> {
        match self.get(raw_name)? {
            ParameterValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn snowflake(&self, raw_name: &str) -> Option<u64> {
        match self.get(raw_name)? {
            ParameterValue::Snowflake(value) => Some(*value),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
