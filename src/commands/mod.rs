//! # Command System
//!
//! Application command trees, component and form routes, and the callbacks
//! they run.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Command trees with categories, context commands and custom id routes
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod handler;
pub mod registry;
pub mod slash;

pub use context::InteractionContext;
pub use handler::{AutoCompleteCallback, CommandCallback, ComponentCallback, ExceptionHandler};
pub use registry::{CustomIdCommand, CustomIdRegistry};
pub use slash::{
    Arguments, CommandBody, CommandFailure, CommandNode, CompleterDeepness, CompleterParent,
    NodeId, ParameterConverter, ParameterType, ParameterValue, SlashCommand, SlashCommandCategory,
    SlashCommandFunction, SlashCommandParameterAutoCompleter, UnloadingBehaviour,
};
