//! Custom id registry
//!
//! Message components and modal forms are routed by their `custom_id`, either
//! verbatim or through an anchored regular expression.
//!
//! - **Version**: 2.0.0
//! - **Since**: 3.38.0
//!
//! ## Changelog
//! - 2.0.0: Route component and form interactions by custom id and pattern
//! - 1.0.0: Initial implementation for handler dispatch

use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use super::context::InteractionContext;
use super::handler::{ComponentCallback, ExceptionHandler};
use crate::core::error::CommandBuildError;
use crate::core::response::{ResponseMessage, ResponseModifier};

/// A component or form handler addressed by custom id.
#[derive(Clone)]
pub struct CustomIdCommand {
    name: String,
    custom_ids: Vec<String>,
    patterns: Vec<Regex>,
    callback: Arc<dyn ComponentCallback>,
    pub(crate) exception_handlers: Vec<Arc<dyn ExceptionHandler>>,
    response_modifier: ResponseModifier,
}

impl CustomIdCommand {
    pub fn new<C>(name: impl Into<String>, callback: C) -> Self
    where
        C: ComponentCallback + 'static,
    {
        Self {
            name: name.into(),
            custom_ids: Vec::new(),
            patterns: Vec::new(),
            callback: Arc::new(callback),
            exception_handlers: Vec::new(),
            response_modifier: ResponseModifier::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn custom_id(mut self, custom_id: impl Into<String>) -> Self {
        self.custom_ids.push(custom_id.into());
        self
    }

    /// Matches the whole custom id. Capture groups are handed to the callback.
    pub fn pattern(mut self, pattern: &str) -> Result<Self, CommandBuildError> {
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            CommandBuildError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        self.patterns.push(regex);
        Ok(self)
    }

    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handlers.push(handler);
        self
    }

    pub fn response_modifier(mut self, modifier: ResponseModifier) -> Self {
        self.response_modifier = modifier;
        self
    }

    fn captures(&self, custom_id: &str) -> Option<Vec<String>> {
        self.patterns.iter().find_map(|pattern| {
            pattern.captures(custom_id).map(|captures| {
                captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default())
                    .collect()
            })
        })
    }

    pub(crate) async fn invoke(
        &self,
        ctx: InteractionContext,
        captures: Vec<String>,
    ) -> Result<Option<ResponseMessage>> {
        let content = self.callback.call(ctx, captures).await?;
        Ok(content.map(|content| self.response_modifier.apply(content)))
    }
}

impl std::fmt::Debug for CustomIdCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomIdCommand")
            .field("name", &self.name)
            .field("custom_ids", &self.custom_ids)
            .field("patterns", &self.patterns)
            .finish()
    }
}

/// Registry resolving custom ids to handlers
///
/// Exact ids are looked up first. Patterns are tried in registration order.
#[derive(Clone, Default)]
pub struct CustomIdRegistry {
    exact: HashMap<String, Arc<CustomIdCommand>>,
    patterned: Vec<Arc<CustomIdCommand>>,
}

impl CustomIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command`, replacing any handler with the same name.
    pub fn register(&mut self, command: CustomIdCommand) -> Result<Arc<CustomIdCommand>, CommandBuildError> {
        if command.custom_ids.is_empty() && command.patterns.is_empty() {
            return Err(CommandBuildError::NoCustomId { name: command.name });
        }

        self.remove(&command.name);
        let command = Arc::new(command);
        for custom_id in &command.custom_ids {
            self.exact.insert(custom_id.clone(), Arc::clone(&command));
        }
        if !command.patterns.is_empty() {
            self.patterned.push(Arc::clone(&command));
        }
        Ok(command)
    }

    /// Returns whether a handler was registered under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.len();
        self.exact.retain(|_, command| command.name != name);
        self.patterned.retain(|command| command.name != name);
        before != self.len()
    }

    /// Handler for `custom_id` together with its capture groups.
    pub fn find(&self, custom_id: &str) -> Option<(Arc<CustomIdCommand>, Vec<String>)> {
        if let Some(command) = self.exact.get(custom_id) {
            return Some((Arc::clone(command), Vec::new()));
        }
        self.patterned.iter().find_map(|command| {
            command
                .captures(custom_id)
                .map(|captures| (Arc::clone(command), captures))
        })
    }

    /// Number of routes, exact ids and pattern handlers counted separately.
    pub fn len(&self) -> usize {
        self.exact.len() + self.patterned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterned.is_empty()
    }
}
