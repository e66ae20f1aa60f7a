//! Slash command functions, the leaves of a command tree

use anyhow::Result;
use std::sync::Arc;

use super::auto_complete::SlashCommandParameterAutoCompleter;
use super::parameter::{raw_name_to_display, Arguments, ParameterConverter};
use super::{validate_description, validate_name, NodeId, APPLICATION_COMMAND_OPTIONS_MAX};
use crate::commands::context::InteractionContext;
use crate::commands::handler::{CommandCallback, ExceptionHandler};
use crate::core::error::CommandBuildError;
use crate::core::response::{ResponseMessage, ResponseModifier};
use crate::model::{
    ApplicationCommandOption, ApplicationCommandOptionChoice, ApplicationCommandOptionType,
    InteractionOption,
};

#[derive(Clone)]
pub struct SlashCommandFunction {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) default: bool,
    pub(crate) parent: Option<NodeId>,
    callback: Arc<dyn CommandCallback>,
    pub(crate) parameters: Vec<ParameterConverter>,
    response_modifier: ResponseModifier,
    pub(crate) exception_handlers: Vec<Arc<dyn ExceptionHandler>>,
}

impl SlashCommandFunction {
    pub fn new<C>(
        name: &str,
        description: impl Into<String>,
        callback: C,
    ) -> Result<Self, CommandBuildError>
    where
        C: CommandCallback + 'static,
    {
        let name = raw_name_to_display(name);
        let description = description.into();
        validate_name(&name)?;
        validate_description(&name, &description)?;
        Ok(Self::unchecked(name, description, Arc::new(callback)))
    }

    /// Context commands keep their name verbatim and carry no description.
    pub(crate) fn unchecked(
        name: String,
        description: String,
        callback: Arc<dyn CommandCallback>,
    ) -> Self {
        Self {
            name,
            description,
            default: false,
            parent: None,
            callback,
            parameters: Vec::new(),
            response_modifier: ResponseModifier::default(),
            exception_handlers: Vec::new(),
        }
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

    pub fn parameters(&self) -> &[ParameterConverter] {
        &self.parameters
    }

    /// Marks the function as the default sub command of its category.
    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }

    pub fn response_modifier(mut self, modifier: ResponseModifier) -> Self {
        self.response_modifier = modifier;
        self
    }

    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handlers.push(handler);
        self
    }

    /// Appends a parameter. Required parameters cannot follow optional ones.
    pub fn parameter(mut self, parameter: ParameterConverter) -> Result<Self, CommandBuildError> {
        if self.parameters.len() >= APPLICATION_COMMAND_OPTIONS_MAX {
            return Err(CommandBuildError::TooManyParameters {
                name: self.name,
                limit: APPLICATION_COMMAND_OPTIONS_MAX,
            });
        }
        if parameter.required && self.parameters.iter().any(|existing| !existing.required) {
            return Err(CommandBuildError::RequiredAfterOptional {
                name: self.name,
                parameter: parameter.name,
            });
        }
        self.parameters.retain(|existing| existing.name != parameter.name);
        self.parameters.push(parameter);
        Ok(self)
    }

    pub(crate) fn apply_auto_completer(
        &mut self,
        completer: &SlashCommandParameterAutoCompleter,
    ) -> usize {
        completer.apply_to(&mut self.parameters)
    }

    pub fn as_option(&self) -> ApplicationCommandOption {
        let mut option = ApplicationCommandOption::new(
            ApplicationCommandOptionType::SubCommand,
            &self.name,
            &self.description,
        );
        option.default = self.default;
        option.options = self.options();
        option
    }

    /// Parameters in declared order.
    pub(crate) fn options(&self) -> Vec<ApplicationCommandOption> {
        self.parameters.iter().map(ParameterConverter::as_option).collect()
    }

    pub(crate) async fn invoke(
        &self,
        ctx: &InteractionContext,
        options: &[InteractionOption],
    ) -> Result<Option<ResponseMessage>> {
        let mut arguments = Arguments::default();
        for parameter in &self.parameters {
            let option = options.iter().find(|option| option.name == parameter.name);
            let value = parameter.convert(option)?;
            arguments.push(&parameter.raw_name, value);
        }

        let content = self.callback.call(ctx.clone(), arguments).await?;
        Ok(content.map(|content| self.response_modifier.apply(content)))
    }

    /// Runs the completer of the focused option. `None` when nothing is focused
    /// or the focused parameter has no completer.
    pub(crate) async fn invoke_auto_completion(
        &self,
        ctx: &InteractionContext,
        options: &[InteractionOption],
    ) -> Result<Option<Vec<ApplicationCommandOptionChoice>>> {
        let Some(focused) = options.iter().find(|option| option.focused) else {
            return Ok(None);
        };
        let Some(completer) = self
            .parameters
            .iter()
            .find(|parameter| parameter.name == focused.name)
            .and_then(ParameterConverter::auto_completer)
        else {
            return Ok(None);
        };

        let value = match &focused.value {
            Some(serde_json::Value::String(value)) => value.clone(),
            Some(value) => value.to_string(),
            None => String::new(),
        };
        completer.invoke(ctx.clone(), value).await.map(Some)
    }
}

impl std::fmt::Debug for SlashCommandFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlashCommandFunction")
            .field("name", &self.name)
            .field("default", &self.default)
            .field("parameters", &self.parameters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::slash::parameter::ParameterType;

    fn function(name: &str) -> SlashCommandFunction {
        SlashCommandFunction::new(
            name,
            "Tends the garden",
            |_ctx: InteractionContext, _args: Arguments| async move { anyhow::Ok(None::<String>) },
        )
        .unwrap()
    }

    fn parameter(name: &str) -> ParameterConverter {
        ParameterConverter::new(name, ParameterType::String, "A flower").unwrap()
    }

    #[test]
    fn test_as_option_lists_parameters_in_order() {
        let function = function("plant")
            .parameter(parameter("flower_name"))
            .unwrap()
            .parameter(parameter("bed").optional())
            .unwrap();
        let option = function.as_option();

        assert_eq!(option.kind, ApplicationCommandOptionType::SubCommand);
        assert_eq!(option.options.len(), 2);
        assert_eq!(option.options[0].name, "flower-name");
        assert_eq!(option.options[1].name, "bed");
        assert!(!option.default);
    }

    #[test]
    fn test_required_after_optional_rejected() {
        let result = function("plant")
            .parameter(parameter("bed").optional())
            .unwrap()
            .parameter(parameter("flower"));

        assert!(matches!(
            result,
            Err(CommandBuildError::RequiredAfterOptional { .. })
        ));
    }

    #[test]
    fn test_parameter_limit() {
        let mut function = function("plant");
        for index in 0..APPLICATION_COMMAND_OPTIONS_MAX {
            function = function
                .parameter(parameter(&format!("flower_{index}")).optional())
                .unwrap();
        }

        assert!(function.parameter(parameter("one_too_many").optional()).is_err());
    }

    #[test]
    fn test_names_are_normalized() {
        assert_eq!(function("Sun_Flower").name(), "sun-flower");
        let unnamed = SlashCommandFunction::new(
            "",
            "Tends the garden",
            |_ctx: InteractionContext, _args: Arguments| async move { anyhow::Ok(None::<String>) },
        );
        assert!(unnamed.is_err());
    }
}
