//! Inbound interaction events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_repr::{Deserialize_repr, Serialize_repr};

use super::command::{ApplicationCommandOptionType, ApplicationCommandTargetType};
use super::{is_false, null_as_default, snowflake, CommandId, GuildId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum InteractionType {
    Ping = 1,
    ApplicationCommand = 2,
    MessageComponent = 3,
    ApplicationCommandAutocomplete = 4,
    ModalSubmit = 5,
}

/// One (possibly nested) option of an application command interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ApplicationCommandOptionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub options: Vec<InteractionOption>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub focused: bool,
}

impl InteractionOption {
    pub fn sub_command(name: impl Into<String>, options: Vec<InteractionOption>) -> Self {
        Self {
            name: name.into(),
            kind: ApplicationCommandOptionType::SubCommand,
            value: None,
            options,
            focused: false,
        }
    }

    pub fn value(
        name: impl Into<String>,
        kind: ApplicationCommandOptionType,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value: Some(value.into()),
            options: Vec::new(),
            focused: false,
        }
    }

    pub fn focused(mut self) -> Self {
        self.focused = true;
        self
    }
}

/// `data` payload. Which fields are populated depends on the interaction type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionData {
    #[serde(
        default,
        with = "snowflake::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<CommandId>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub command_type: Option<ApplicationCommandTargetType>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub options: Vec<InteractionOption>,
    #[serde(
        default,
        with = "snowflake::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_id: Option<u64>,
    #[serde(default)]
    pub custom_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub values: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub components: Vec<Value>,
}

impl InteractionData {
    /// Flattens the text inputs of a submitted modal into `(custom_id, value)` pairs.
    pub fn form_values(&self) -> Vec<(String, String)> {
        self.components
            .iter()
            .flat_map(|row| {
                row.get("components")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default()
            })
            .filter_map(|component| {
                let custom_id = component.get("custom_id")?.as_str()?.to_string();
                let value = component.get("value")?.as_str()?.to_string();
                Some((custom_id, value))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionUser {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMember {
    pub user: InteractionUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(with = "snowflake")]
    pub id: u64,
    #[serde(with = "snowflake")]
    pub application_id: u64,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default)]
    pub data: InteractionData,
    #[serde(
        default,
        with = "snowflake::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub guild_id: Option<GuildId>,
    #[serde(
        default,
        with = "snowflake::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub channel_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member: Option<InteractionMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<InteractionUser>,
    pub token: String,
}

impl InteractionEvent {
    /// The invoking user, whether the interaction happened in a guild or not.
    pub fn user_id(&self) -> Option<u64> {
        self.member
            .as_ref()
            .map(|member| member.user.id)
            .or_else(|| self.user.as_ref().map(|user| user.id))
    }

    /// The application command id, for command and autocomplete interactions.
    pub fn command_id(&self) -> Option<CommandId> {
        match self.kind {
            InteractionType::ApplicationCommand
            | InteractionType::ApplicationCommandAutocomplete => self.data.id,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_application_command_event_from_wire() {
        let event: InteractionEvent = serde_json::from_value(json!({
            "id": "10",
            "application_id": "5",
            "type": 2,
            "token": "token",
            "guild_id": "700",
            "member": {"user": {"id": "42", "username": "yuuka"}, "roles": []},
            "data": {
                "id": "1001",
                "name": "yuuka",
                "type": 1,
                "options": [{"type": 1, "name": "wriggle"}]
            }
        }))
        .unwrap();

        assert_eq!(event.kind, InteractionType::ApplicationCommand);
        assert_eq!(event.command_id(), Some(1001));
        assert_eq!(event.user_id(), Some(42));
        assert_eq!(event.data.options[0].name, "wriggle");
        assert!(event.data.options[0].options.is_empty());
    }

    #[test]
    fn test_component_event_has_no_command_id() {
        let event: InteractionEvent = serde_json::from_value(json!({
            "id": "11",
            "application_id": "5",
            "type": 3,
            "token": "token",
            "user": {"id": "42"},
            "data": {"custom_id": "page_2", "component_type": 2}
        }))
        .unwrap();

        assert_eq!(event.command_id(), None);
        assert_eq!(event.data.custom_id, "page_2");
    }

    #[test]
    fn test_form_values_flatten_rows() {
        let data: InteractionData = serde_json::from_value(json!({
            "custom_id": "feedback",
            "components": [
                {"type": 1, "components": [{"type": 4, "custom_id": "title", "value": "Sunflowers"}]},
                {"type": 1, "components": [{"type": 4, "custom_id": "body", "value": "Tall"}]}
            ]
        }))
        .unwrap();

        assert_eq!(
            data.form_values(),
            vec![
                ("title".to_string(), "Sunflowers".to_string()),
                ("body".to_string(), "Tall".to_string())
            ]
        );
    }
}
