//! # Core Module
//!
//! Configuration, error taxonomy and response payloads shared by every layer.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Error taxonomy for sync and parameter conversion
//! - 1.1.0: Add response module with Discord message limits
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod error;
pub mod response;

// Re-export commonly used items
pub use config::{BotConfig, SlasherConfig};
pub use error::{
    ApiError, ApiResult, CommandBuildError, ConversionExpectation,
    SlashCommandParameterConversionError, SlasherSyncError, SyncOperation,
};
pub use response::{truncate_for_message, ResponseMessage, ResponseModifier, MESSAGE_LIMIT};
