//! Parameter auto-completers
//!
//! A completer is registered once and bound to every matching parameter below
//! the node it was registered at. Completers registered closer to a function
//! win over the ones registered further up.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.5.0
//!
//! ## Changelog
//! - 1.1.0: Parent binding with detached copies
//! - 1.0.0: Initial implementation

use anyhow::Result;
use std::borrow::Cow;
use std::sync::Arc;
use uuid::Uuid;

use super::parameter::{raw_name_to_display, ParameterConverter};
use super::NodeId;
use crate::commands::context::InteractionContext;
use crate::commands::handler::AutoCompleteCallback;
use crate::core::error::CommandBuildError;
use crate::model::ApplicationCommandOptionChoice;

/// Where a completer was registered. Variant order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompleterDeepness {
    /// Registered on the slasher itself.
    Root,
    /// Registered on a command (0) or a category (1).
    Level(u8),
    /// Registered on the function owning the parameter.
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompleterParent {
    Slasher,
    Command { identity: Uuid, node: Option<NodeId> },
}

#[derive(Clone)]
pub struct SlashCommandParameterAutoCompleter {
    callback: Arc<dyn AutoCompleteCallback>,
    /// `(raw, display)` pairs.
    parameter_names: Vec<(String, String)>,
    deepness: CompleterDeepness,
    parent: Option<CompleterParent>,
}

impl SlashCommandParameterAutoCompleter {
    pub fn new<C>(callback: C, parameter_names: &[&str]) -> Result<Self, CommandBuildError>
    where
        C: AutoCompleteCallback + 'static,
    {
        if parameter_names.is_empty() {
            return Err(CommandBuildError::EmptyAutoCompleter);
        }

        Ok(Self {
            callback: Arc::new(callback),
            parameter_names: parameter_names
                .iter()
                .map(|name| (name.to_string(), raw_name_to_display(name)))
                .collect(),
            deepness: CompleterDeepness::Function,
            parent: None,
        })
    }

    pub fn deepness(&self) -> CompleterDeepness {
        self.deepness
    }

    pub(crate) fn set_deepness(&mut self, deepness: CompleterDeepness) {
        self.deepness = deepness;
    }

    pub fn parent(&self) -> Option<CompleterParent> {
        self.parent
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameter_names.iter().map(|(raw, _)| raw.as_str())
    }

    pub fn is_deeper_than(&self, other: &Self) -> bool {
        self.deepness > other.deepness
    }

    /// Binds the completer to `parent`.
    ///
    /// An unbound completer (or one already bound to `parent`) is bound in
    /// place. A completer bound elsewhere is left untouched and a detached copy
    /// bound to `parent` is returned instead.
    pub fn bind_to(&mut self, parent: CompleterParent) -> Cow<'_, Self> {
        match self.parent {
            None => {
                self.parent = Some(parent);
                Cow::Borrowed(&*self)
            }
            Some(existing) if existing == parent => Cow::Borrowed(&*self),
            Some(_) => {
                let mut copy = self.clone();
                copy.parent = Some(parent);
                Cow::Owned(copy)
            }
        }
    }

    /// Claims the candidates this completer names, display names first, then
    /// raw names. Matched candidates are removed from `candidates`.
    pub fn difference_match_parameters<'a>(
        &self,
        candidates: &mut Vec<&'a mut ParameterConverter>,
    ) -> Vec<&'a mut ParameterConverter> {
        let mut names = self.parameter_names.clone();
        let mut matched = Vec::new();

        names.retain(|(_, display)| {
            match candidates.iter().position(|candidate| &candidate.name == display) {
                Some(position) => {
                    matched.push(candidates.remove(position));
                    false
                }
                None => true,
            }
        });

        names.retain(|(raw, _)| {
            match candidates
                .iter()
                .position(|candidate| &candidate.raw_name == raw)
            {
                Some(position) => {
                    matched.push(candidates.remove(position));
                    false
                }
                None => true,
            }
        });

        matched
    }

    /// Attaches a copy of this completer to each matching parameter, unless a
    /// deeper completer is already attached. Returns how many were claimed.
    pub(crate) fn apply_to(&self, parameters: &mut [ParameterConverter]) -> usize {
        let mut candidates: Vec<&mut ParameterConverter> = parameters
            .iter_mut()
            .filter(|parameter| parameter.is_auto_completable())
            .filter(|parameter| {
                parameter
                    .auto_completer
                    .as_ref()
                    .map_or(true, |existing| !existing.is_deeper_than(self))
            })
            .collect();

        let matched = self.difference_match_parameters(&mut candidates);
        let count = matched.len();
        for parameter in matched {
            parameter.auto_completer = Some(self.clone());
        }
        count
    }

    pub async fn invoke(
        &self,
        ctx: InteractionContext,
        value: String,
    ) -> Result<Vec<ApplicationCommandOptionChoice>> {
        self.callback.complete(ctx, value).await
    }
}

impl std::fmt::Debug for SlashCommandParameterAutoCompleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlashCommandParameterAutoCompleter")
            .field("parameter_names", &self.parameter_names)
            .field("deepness", &self.deepness)
            .field("parent", &self.parent)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::slash::parameter::ParameterType;

    fn completer(names: &[&str]) -> SlashCommandParameterAutoCompleter {
        SlashCommandParameterAutoCompleter::new(
            |_ctx: InteractionContext, value: String| async move {
                anyhow::Ok(vec![ApplicationCommandOptionChoice::named(value)])
            },
            names,
        )
        .unwrap()
    }

    fn parameter(raw_name: &str) -> ParameterConverter {
        ParameterConverter::new(raw_name, ParameterType::String, "A flower").unwrap()
    }

    #[test]
    fn test_empty_completer_rejected() {
        let result = SlashCommandParameterAutoCompleter::new(
            |_ctx: InteractionContext, _value: String| async move { anyhow::Ok(Vec::new()) },
            &[],
        );
        assert!(matches!(result, Err(CommandBuildError::EmptyAutoCompleter)));
    }

    #[test]
    fn test_difference_match_never_repeats() {
        let completer = completer(&["flower_name", "garden"]);
        let mut parameters = vec![parameter("flower_name"), parameter("garden"), parameter("season")];
        let mut candidates: Vec<&mut ParameterConverter> = parameters.iter_mut().collect();

        let first = completer.difference_match_parameters(&mut candidates);
        let first_names: Vec<String> = first.iter().map(|p| p.name.clone()).collect();
        let second = completer.difference_match_parameters(&mut candidates);

        assert_eq!(first_names, vec!["flower-name".to_string(), "garden".to_string()]);
        assert!(second.is_empty());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "season");
    }

    #[test]
    fn test_difference_match_falls_back_to_raw_name() {
        let completer = completer(&["Flower"]);
        let mut parameters = vec![parameter("flower")];
        parameters[0].name = "bloom".to_string();
        parameters[0].raw_name = "Flower".to_string();
        let mut candidates: Vec<&mut ParameterConverter> = parameters.iter_mut().collect();

        let matched = completer.difference_match_parameters(&mut candidates);
        assert_eq!(matched.len(), 1);
    }

    #[test]
    fn test_deepness_ordering() {
        assert!(CompleterDeepness::Root < CompleterDeepness::Level(0));
        assert!(CompleterDeepness::Level(0) < CompleterDeepness::Level(1));
        assert!(CompleterDeepness::Level(1) < CompleterDeepness::Function);

        let mut shallow = completer(&["flower"]);
        shallow.set_deepness(CompleterDeepness::Root);
        let deep = completer(&["flower"]);
        assert!(deep.is_deeper_than(&shallow));
        assert!(!shallow.is_deeper_than(&deep));
    }

    #[test]
    fn test_deeper_completer_is_not_overridden() {
        let function_level = completer(&["flower"]);
        let mut root_level = completer(&["flower"]);
        root_level.set_deepness(CompleterDeepness::Root);
        let mut parameters = vec![parameter("flower")];

        assert_eq!(function_level.apply_to(&mut parameters), 1);
        assert_eq!(root_level.apply_to(&mut parameters), 0);
        assert_eq!(
            parameters[0].auto_completer().map(|c| c.deepness()),
            Some(CompleterDeepness::Function)
        );
    }

    #[test]
    fn test_bind_to_copies_when_bound_elsewhere() {
        let first = CompleterParent::Command {
            identity: Uuid::new_v4(),
            node: None,
        };
        let second = CompleterParent::Command {
            identity: Uuid::new_v4(),
            node: None,
        };
        let mut completer = completer(&["flower"]);

        assert!(matches!(completer.bind_to(first), Cow::Borrowed(_)));
        assert!(matches!(completer.bind_to(first), Cow::Borrowed(_)));

        let copy = completer.bind_to(second).into_owned();
        assert_eq!(copy.parent(), Some(second));
        assert_eq!(completer.parent(), Some(first));
    }
}
