//! Callback traits invoked by the command tree
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 2.0.0: Split into command, auto-complete, component and exception handler traits
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;

use super::context::InteractionContext;
use super::slash::parameter::Arguments;
use crate::model::ApplicationCommandOptionChoice;

/// Body of a slash command function.
///
/// The returned string, if any, is sent as the interaction response after the
/// function's [`ResponseModifier`](crate::core::ResponseModifier) is applied.
///
/// Any `Fn(InteractionContext, Arguments) -> impl Future` closure implements it:
///
/// ```ignore
/// let function = SlashCommandFunction::new("wriggle", "Calls a firefly", |ctx, args| async move {
///     anyhow::Ok(Some(format!("Hello {}", args.string("name").unwrap_or("there"))))
/// })?;
/// ```
#[async_trait]
pub trait CommandCallback: Send + Sync {
    async fn call(&self, ctx: InteractionContext, arguments: Arguments) -> Result<Option<String>>;
}

#[async_trait]
impl<F, Fut> CommandCallback for F
where
    F: Fn(InteractionContext, Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>>> + Send + 'static,
{
    async fn call(&self, ctx: InteractionContext, arguments: Arguments) -> Result<Option<String>> {
        (self)(ctx, arguments).await
    }
}

/// Supplies choices for the focused parameter. Receives the partially typed value.
#[async_trait]
pub trait AutoCompleteCallback: Send + Sync {
    async fn complete(
        &self,
        ctx: InteractionContext,
        value: String,
    ) -> Result<Vec<ApplicationCommandOptionChoice>>;
}

#[async_trait]
impl<F, Fut> AutoCompleteCallback for F
where
    F: Fn(InteractionContext, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<ApplicationCommandOptionChoice>>> + Send + 'static,
{
    async fn complete(
        &self,
        ctx: InteractionContext,
        value: String,
    ) -> Result<Vec<ApplicationCommandOptionChoice>> {
        (self)(ctx, value).await
    }
}

/// Body of a component or form command. `captures` holds the capture groups of
/// the custom id pattern that matched, and is empty for exact matches.
#[async_trait]
pub trait ComponentCallback: Send + Sync {
    async fn call(&self, ctx: InteractionContext, captures: Vec<String>) -> Result<Option<String>>;
}

#[async_trait]
impl<F, Fut> ComponentCallback for F
where
    F: Fn(InteractionContext, Vec<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>>> + Send + 'static,
{
    async fn call(&self, ctx: InteractionContext, captures: Vec<String>) -> Result<Option<String>> {
        (self)(ctx, captures).await
    }
}

/// Receives errors raised while running a command.
///
/// Handlers are consulted from the failing node upwards, then at slasher
/// level. Returning `true` marks the error as handled and stops propagation.
#[async_trait]
pub trait ExceptionHandler: Send + Sync {
    async fn handle(&self, ctx: &InteractionContext, command: &str, error: &anyhow::Error) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the traits are object-safe (can be used with dyn)
    fn _assert_object_safe(
        _: &dyn CommandCallback,
        _: &dyn AutoCompleteCallback,
        _: &dyn ComponentCallback,
        _: &dyn ExceptionHandler,
    ) {
    }

    #[test]
    fn test_closures_implement_callbacks() {
        fn assert_command<C: CommandCallback>(_: C) {}
        fn assert_component<C: ComponentCallback>(_: C) {}

        assert_command(|_ctx: InteractionContext, _args: Arguments| async move {
            anyhow::Ok(Some("ok".to_string()))
        });
        assert_component(|_ctx: InteractionContext, captures: Vec<String>| async move {
            anyhow::Ok(captures.first().cloned())
        });
    }
}
