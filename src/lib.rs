// Model layer - data carriers exchanged with the transport
pub mod model;

// Core layer - configuration, errors and response payloads
pub mod core;

// Transport seam
pub mod api;

// Command trees, custom id routes and callbacks
pub mod commands;

// Sync engine and dispatcher
pub mod slasher;

// REST transport and serenity gateway conversions (optional feature)
#[cfg(feature = "serenity-api")]
pub mod serenity_api;

#[cfg(test)]
pub(crate) mod testing;

pub use api::DiscordApi;
pub use core::{BotConfig, SlasherConfig};

pub use commands::{
    Arguments, CustomIdCommand, ExceptionHandler, InteractionContext, ParameterConverter,
    ParameterType, SlashCommand, SlashCommandCategory, SlashCommandFunction,
    SlashCommandParameterAutoCompleter, UnloadingBehaviour,
};
pub use slasher::Slasher;

#[cfg(feature = "serenity-api")]
pub use serenity_api::HttpDiscordApi;
