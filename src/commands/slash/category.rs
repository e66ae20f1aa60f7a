//! Sub command groups

use std::collections::BTreeMap;
use std::sync::Arc;

use super::auto_complete::SlashCommandParameterAutoCompleter;
use super::parameter::raw_name_to_display;
use super::{validate_description, validate_name, NodeId};
use crate::commands::handler::ExceptionHandler;
use crate::core::error::CommandBuildError;

/// A sub command group. Only reachable through the [`SlashCommand`](super::SlashCommand)
/// owning it; [`SlashCommand::add_category`](super::SlashCommand::add_category)
/// inserts one and returns its [`NodeId`].
#[derive(Clone)]
pub struct SlashCommandCategory {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) default: bool,
    /// Root is at 0, so a category directly under it is at 1.
    pub(crate) deepness: u8,
    pub(crate) parent: Option<NodeId>,
    pub(crate) sub_commands: BTreeMap<String, NodeId>,
    pub(crate) exception_handlers: Vec<Arc<dyn ExceptionHandler>>,
    pub(crate) auto_completers: Vec<SlashCommandParameterAutoCompleter>,
}

impl SlashCommandCategory {
    pub fn new(name: &str, description: impl Into<String>) -> Result<Self, CommandBuildError> {
        let name = raw_name_to_display(name);
        let description = description.into();
        validate_name(&name)?;
        validate_description(&name, &description)?;

        Ok(Self {
            name,
            description,
            default: false,
            deepness: 1,
            parent: None,
            sub_commands: BTreeMap::new(),
            exception_handlers: Vec::new(),
            auto_completers: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn deepness(&self) -> u8 {
        self.deepness
    }

    pub fn sub_command_names(&self) -> impl Iterator<Item = &str> {
        self.sub_commands.keys().map(String::as_str)
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handlers.push(handler);
        self
    }
}

impl std::fmt::Debug for SlashCommandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlashCommandCategory")
            .field("name", &self.name)
            .field("deepness", &self.deepness)
            .field("sub_commands", &self.sub_commands)
            .finish()
    }
}
