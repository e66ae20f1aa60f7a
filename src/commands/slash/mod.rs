//! # Slash Commands (/)
//!
//! Command trees: a [`SlashCommand`] root owning its categories and functions
//! in an arena, addressed by [`NodeId`].
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Arena backed command trees with categories, completers and context commands
//! - 2.0.0: Consolidate plugins into single /plugins command with subcommands
//! - 1.0.0: Reorganized from monolithic slash_commands.rs

pub mod auto_complete;
pub mod category;
pub mod function;
pub mod parameter;

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use uuid::Uuid;

pub use auto_complete::{CompleterDeepness, CompleterParent, SlashCommandParameterAutoCompleter};
pub use category::SlashCommandCategory;
pub use function::SlashCommandFunction;
pub use parameter::{
    raw_name_to_display, Arguments, ParameterConverter, ParameterType, ParameterValue,
    ValueConverter,
};

use crate::commands::context::InteractionContext;
use crate::commands::handler::{AutoCompleteCallback, CommandCallback, ExceptionHandler};
use crate::core::error::{
    CommandBuildError, ConversionExpectation, SlashCommandParameterConversionError,
};
use crate::core::response::ResponseMessage;
use crate::model::{
    ApplicationCommandOption, ApplicationCommandOptionChoice, ApplicationCommandOptionType,
    ApplicationCommandPermissionOverwrite, ApplicationCommandSchema,
    ApplicationCommandTargetType, CommandId, CommandKey, GuildId, IntegrationContextType,
    IntegrationType, InteractionOption, SyncId, SYNC_ID_GLOBAL, SYNC_ID_NON_GLOBAL,
};

/// Discord's limit of options (sub commands or parameters) per level.
pub const APPLICATION_COMMAND_OPTIONS_MAX: usize = 25;
/// Nodes cannot be nested at or below this deepness.
pub const APPLICATION_COMMAND_CATEGORY_DEEPNESS_MAX: u8 = 2;

pub(crate) fn validate_name(name: &str) -> Result<(), CommandBuildError> {
    let length = name.chars().count();
    if length == 0 || length > 32 {
        return Err(CommandBuildError::NameLength {
            name: name.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_description(name: &str, description: &str) -> Result<(), CommandBuildError> {
    if !(2..=100).contains(&description.chars().count()) {
        return Err(CommandBuildError::DescriptionLength {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Index of a node inside the arena of its root command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// What happens to a command's remote registration when it is removed locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnloadingBehaviour {
    /// Use the slasher's behaviour.
    #[default]
    Inherit,
    Delete,
    Keep,
}

impl UnloadingBehaviour {
    pub fn slasher_default() -> Self {
        UnloadingBehaviour::Delete
    }

    pub fn resolve(self, slasher_behaviour: UnloadingBehaviour) -> UnloadingBehaviour {
        match self {
            UnloadingBehaviour::Inherit => slasher_behaviour,
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CommandNode {
    Function(SlashCommandFunction),
    Category(SlashCommandCategory),
}

impl CommandNode {
    pub fn name(&self) -> &str {
        match self {
            CommandNode::Function(function) => &function.name,
            CommandNode::Category(category) => &category.name,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        match self {
            CommandNode::Function(function) => function.parent,
            CommandNode::Category(category) => category.parent,
        }
    }

    pub fn is_default(&self) -> bool {
        match self {
            CommandNode::Function(function) => function.default,
            CommandNode::Category(category) => category.default,
        }
    }

    fn exception_handlers(&self) -> &[Arc<dyn ExceptionHandler>] {
        match self {
            CommandNode::Function(function) => &function.exception_handlers,
            CommandNode::Category(category) => &category.exception_handlers,
        }
    }
}

/// A root either runs one function or groups sub commands, never both.
#[derive(Debug, Clone)]
pub enum CommandBody {
    Function(NodeId),
    SubCommands(BTreeMap<String, NodeId>),
}

/// An error raised while invoking a command, with the node it surfaced at.
/// `origin` is `None` when the root itself failed.
#[derive(Debug)]
pub struct CommandFailure {
    pub origin: Option<NodeId>,
    pub error: anyhow::Error,
}

pub struct SlashCommand {
    identity: Uuid,
    name: String,
    description: String,
    target: ApplicationCommandTargetType,
    guild_ids: Option<BTreeSet<GuildId>>,
    is_global: bool,
    nsfw: bool,
    required_permissions: Option<u64>,
    integration_context_types: Vec<IntegrationContextType>,
    integration_types: Vec<IntegrationType>,
    permission_overwrites: BTreeMap<GuildId, Vec<ApplicationCommandPermissionOverwrite>>,
    unloading_behaviour: UnloadingBehaviour,
    body: CommandBody,
    nodes: Vec<CommandNode>,
    exception_handlers: Vec<Arc<dyn ExceptionHandler>>,
    auto_completers: Vec<SlashCommandParameterAutoCompleter>,
    registered_ids: Mutex<HashMap<SyncId, CommandId>>,
}

impl SlashCommand {
    fn with_body(
        name: String,
        description: String,
        target: ApplicationCommandTargetType,
        body: CommandBody,
        nodes: Vec<CommandNode>,
    ) -> Self {
        Self {
            identity: Uuid::new_v4(),
            name,
            description,
            target,
            guild_ids: None,
            is_global: false,
            nsfw: false,
            required_permissions: None,
            integration_context_types: Vec::new(),
            integration_types: Vec::new(),
            permission_overwrites: BTreeMap::new(),
            unloading_behaviour: UnloadingBehaviour::Inherit,
            body,
            nodes,
            exception_handlers: Vec::new(),
            auto_completers: Vec::new(),
            registered_ids: Mutex::new(HashMap::new()),
        }
    }

    /// A chat input command grouping sub commands. Starts without any.
    pub fn new(name: &str, description: impl Into<String>) -> Result<Self, CommandBuildError> {
        let name = raw_name_to_display(name);
        let description = description.into();
        validate_name(&name)?;
        validate_description(&name, &description)?;

        Ok(Self::with_body(
            name,
            description,
            ApplicationCommandTargetType::ChatInput,
            CommandBody::SubCommands(BTreeMap::new()),
            Vec::new(),
        ))
    }

    /// A chat input command running `function` directly.
    pub fn from_function(mut function: SlashCommandFunction) -> Self {
        function.parent = None;
        function.default = false;
        Self::with_body(
            function.name.clone(),
            function.description.clone(),
            ApplicationCommandTargetType::ChatInput,
            CommandBody::Function(NodeId(0)),
            vec![CommandNode::Function(function)],
        )
    }

    /// A user or message context menu command.
    pub fn context<C>(
        target: ApplicationCommandTargetType,
        name: &str,
        callback: C,
    ) -> Result<Self, CommandBuildError>
    where
        C: CommandCallback + 'static,
    {
        let name = name.trim().to_string();
        if target == ApplicationCommandTargetType::ChatInput {
            return Err(CommandBuildError::ContextCommandShape { name });
        }
        validate_name(&name)?;

        let function = SlashCommandFunction::unchecked(name.clone(), String::new(), Arc::new(callback));
        Ok(Self::with_body(
            name,
            String::new(),
            target,
            CommandBody::Function(NodeId(0)),
            vec![CommandNode::Function(function)],
        ))
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self.guild_ids = None;
        self
    }

    pub fn guilds(mut self, guild_ids: impl IntoIterator<Item = GuildId>) -> Self {
        self.is_global = false;
        self.guild_ids = Some(guild_ids.into_iter().collect());
        self
    }

    pub fn nsfw(mut self, nsfw: bool) -> Self {
        self.nsfw = nsfw;
        self
    }

    /// Permission bitmask members need to see the command.
    pub fn required_permissions(mut self, permissions: u64) -> Self {
        self.required_permissions = Some(permissions);
        self
    }

    pub fn integration_context_types(mut self, contexts: Vec<IntegrationContextType>) -> Self {
        self.integration_context_types = contexts;
        self
    }

    pub fn integration_types(mut self, integration_types: Vec<IntegrationType>) -> Self {
        self.integration_types = integration_types;
        self
    }

    pub fn unloading_behaviour(mut self, behaviour: UnloadingBehaviour) -> Self {
        self.unloading_behaviour = behaviour;
        self
    }

    /// Expected overwrite for this command inside `guild_id`.
    pub fn permission_overwrite(
        mut self,
        guild_id: GuildId,
        overwrite: ApplicationCommandPermissionOverwrite,
    ) -> Self {
        let overwrites = self.permission_overwrites.entry(guild_id).or_default();
        overwrites.retain(|existing| {
            existing.target_type != overwrite.target_type || existing.target_id != overwrite.target_id
        });
        overwrites.push(overwrite);
        self
    }

    pub fn identity(&self) -> Uuid {
        self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn target(&self) -> ApplicationCommandTargetType {
        self.target
    }

    pub fn key(&self) -> CommandKey {
        (self.name.clone(), self.target)
    }

    pub fn is_global(&self) -> bool {
        self.is_global
    }

    pub fn guild_ids(&self) -> Option<&BTreeSet<GuildId>> {
        self.guild_ids.as_ref()
    }

    pub fn get_unloading_behaviour(&self) -> UnloadingBehaviour {
        self.unloading_behaviour
    }

    pub fn permission_overwrites_at(&self, guild_id: GuildId) -> &[ApplicationCommandPermissionOverwrite] {
        self.permission_overwrites
            .get(&guild_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn body(&self) -> &CommandBody {
        &self.body
    }

    pub fn node(&self, id: NodeId) -> Option<&CommandNode> {
        self.nodes.get(id.0)
    }

    /// Sync targets the command is registered under.
    pub fn sync_ids(&self) -> Vec<SyncId> {
        if self.is_global {
            return vec![SYNC_ID_GLOBAL];
        }
        match &self.guild_ids {
            Some(guild_ids) => guild_ids.iter().copied().collect(),
            None => vec![SYNC_ID_NON_GLOBAL],
        }
    }

    fn children(&self, parent: Option<NodeId>) -> Result<(&BTreeMap<String, NodeId>, u8, &str), CommandBuildError> {
        match parent {
            None => match &self.body {
                CommandBody::SubCommands(children) => Ok((children, 0, &self.name)),
                CommandBody::Function(_) if self.target != ApplicationCommandTargetType::ChatInput => {
                    Err(CommandBuildError::ContextCommandShape {
                        name: self.name.clone(),
                    })
                }
                CommandBody::Function(_) => Err(CommandBuildError::NotACategory {
                    name: self.name.clone(),
                }),
            },
            Some(id) => match self.nodes.get(id.0) {
                Some(CommandNode::Category(category)) => {
                    Ok((&category.sub_commands, category.deepness, &category.name))
                }
                Some(CommandNode::Function(function)) => Err(CommandBuildError::NotACategory {
                    name: function.name.clone(),
                }),
                None => Err(CommandBuildError::UnknownNode {
                    command: self.name.clone(),
                    index: id.0,
                }),
            },
        }
    }

    fn children_mut(&mut self, parent: Option<NodeId>) -> Option<&mut BTreeMap<String, NodeId>> {
        match parent {
            None => match &mut self.body {
                CommandBody::SubCommands(children) => Some(children),
                CommandBody::Function(_) => None,
            },
            Some(id) => match self.nodes.get_mut(id.0) {
                Some(CommandNode::Category(category)) => Some(&mut category.sub_commands),
                _ => None,
            },
        }
    }

    /// Validates inserting a child named `name` under `parent` and returns the parent's deepness.
    fn check_insertion(
        &self,
        parent: Option<NodeId>,
        name: &str,
        is_default: bool,
    ) -> Result<u8, CommandBuildError> {
        let (children, deepness, parent_name) = self.children(parent)?;

        if !children.contains_key(name) && children.len() >= APPLICATION_COMMAND_OPTIONS_MAX {
            return Err(CommandBuildError::TooManySubCommands {
                parent: parent_name.to_string(),
                limit: APPLICATION_COMMAND_OPTIONS_MAX,
            });
        }

        if is_default {
            let existing = children.iter().find(|(child_name, id)| {
                child_name.as_str() != name
                    && self.nodes.get(id.0).is_some_and(CommandNode::is_default)
            });
            if let Some((existing, _)) = existing {
                return Err(CommandBuildError::DuplicateDefault {
                    name: name.to_string(),
                    parent: parent_name.to_string(),
                    existing: existing.clone(),
                });
            }
        }

        Ok(deepness)
    }

    /// Completers registered on `parent` and its ancestors, shallowest first.
    fn inherited_completers(&self, parent: Option<NodeId>) -> Vec<SlashCommandParameterAutoCompleter> {
        let mut completers = Vec::new();
        let mut current = parent;
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.0) else {
                break;
            };
            if let CommandNode::Category(category) = node {
                completers.extend(category.auto_completers.iter().rev().cloned());
            }
            current = node.parent();
        }
        completers.extend(self.auto_completers.iter().rev().cloned());
        completers.reverse();
        completers
    }

    pub fn add_function(
        &mut self,
        parent: Option<NodeId>,
        mut function: SlashCommandFunction,
    ) -> Result<NodeId, CommandBuildError> {
        self.check_insertion(parent, &function.name, function.default)?;

        let id = NodeId(self.nodes.len());
        function.parent = parent;
        for completer in self.inherited_completers(parent) {
            function.apply_auto_completer(&completer);
        }

        let name = function.name.clone();
        self.nodes.push(CommandNode::Function(function));
        if let Some(children) = self.children_mut(parent) {
            children.insert(name, id);
        }
        Ok(id)
    }

    pub fn add_category(
        &mut self,
        parent: Option<NodeId>,
        mut category: SlashCommandCategory,
    ) -> Result<NodeId, CommandBuildError> {
        let parent_deepness = self.check_insertion(parent, &category.name, category.default)?;
        let deepness = parent_deepness + 1;
        if deepness >= APPLICATION_COMMAND_CATEGORY_DEEPNESS_MAX {
            let (_, _, parent_name) = self.children(parent)?;
            return Err(CommandBuildError::TooDeep {
                name: category.name,
                parent: parent_name.to_string(),
            });
        }

        let id = NodeId(self.nodes.len());
        category.deepness = deepness;
        category.parent = parent;
        category.sub_commands.clear();

        let name = category.name.clone();
        self.nodes.push(CommandNode::Category(category));
        if let Some(children) = self.children_mut(parent) {
            children.insert(name, id);
        }
        Ok(id)
    }

    /// Registers a handler consulted when `node` (or anything below it) fails.
    /// `None` targets the root.
    pub fn add_exception_handler(
        &mut self,
        node: Option<NodeId>,
        handler: Arc<dyn ExceptionHandler>,
    ) -> Result<(), CommandBuildError> {
        match node {
            None => self.exception_handlers.push(handler),
            Some(id) => match self.nodes.get_mut(id.0) {
                Some(CommandNode::Function(function)) => function.exception_handlers.push(handler),
                Some(CommandNode::Category(category)) => category.exception_handlers.push(handler),
                None => {
                    return Err(CommandBuildError::UnknownNode {
                        command: self.name.clone(),
                        index: id.0,
                    })
                }
            },
        }
        Ok(())
    }

    pub fn exception_handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.exception_handlers.push(handler);
        self
    }

    fn functions_under(&self, node: Option<NodeId>) -> Vec<NodeId> {
        let roots: Vec<NodeId> = match node {
            None => match &self.body {
                CommandBody::Function(id) => vec![*id],
                CommandBody::SubCommands(children) => children.values().copied().collect(),
            },
            Some(id) => vec![id],
        };

        let mut functions = Vec::new();
        let mut pending = roots;
        while let Some(id) = pending.pop() {
            match self.nodes.get(id.0) {
                Some(CommandNode::Function(_)) => functions.push(id),
                Some(CommandNode::Category(category)) => {
                    pending.extend(category.sub_commands.values().copied())
                }
                None => {}
            }
        }
        functions
    }

    /// Binds `completer` at `node` and attaches it to every matching parameter
    /// below. Functions added later under a category inherit its completers.
    /// Returns how many parameters were claimed.
    pub fn add_auto_completer(
        &mut self,
        node: Option<NodeId>,
        mut completer: SlashCommandParameterAutoCompleter,
    ) -> Result<usize, CommandBuildError> {
        let deepness = match node {
            None => match &self.body {
                CommandBody::Function(_) => CompleterDeepness::Function,
                CommandBody::SubCommands(_) => CompleterDeepness::Level(0),
            },
            Some(id) => match self.nodes.get(id.0) {
                Some(CommandNode::Function(_)) => CompleterDeepness::Function,
                Some(CommandNode::Category(category)) => CompleterDeepness::Level(category.deepness),
                None => {
                    return Err(CommandBuildError::UnknownNode {
                        command: self.name.clone(),
                        index: id.0,
                    })
                }
            },
        };

        let mut completer = completer
            .bind_to(CompleterParent::Command {
                identity: self.identity,
                node,
            })
            .into_owned();
        completer.set_deepness(deepness);

        let mut claimed = 0;
        for id in self.functions_under(node) {
            if let Some(CommandNode::Function(function)) = self.nodes.get_mut(id.0) {
                claimed += function.apply_auto_completer(&completer);
            }
        }

        match node {
            None => self.auto_completers.push(completer),
            Some(id) => {
                if let Some(CommandNode::Category(category)) = self.nodes.get_mut(id.0) {
                    category.auto_completers.push(completer);
                }
            }
        }
        Ok(claimed)
    }

    /// Shorthand for building and registering a completer.
    pub fn auto_complete<C>(
        &mut self,
        node: Option<NodeId>,
        parameter_names: &[&str],
        callback: C,
    ) -> Result<usize, CommandBuildError>
    where
        C: AutoCompleteCallback + 'static,
    {
        let completer = SlashCommandParameterAutoCompleter::new(callback, parameter_names)?;
        self.add_auto_completer(node, completer)
    }

    /// Applies a slasher level completer. Never overrides completers bound on the command.
    pub(crate) fn apply_slasher_auto_completer(
        &mut self,
        completer: &SlashCommandParameterAutoCompleter,
    ) -> usize {
        let mut claimed = 0;
        for id in self.functions_under(None) {
            if let Some(CommandNode::Function(function)) = self.nodes.get_mut(id.0) {
                claimed += function.apply_auto_completer(completer);
            }
        }
        claimed
    }

    pub fn schema(&self) -> ApplicationCommandSchema {
        let (description, options) = match self.target {
            ApplicationCommandTargetType::ChatInput => (self.description.clone(), self.root_options()),
            _ => (String::new(), Vec::new()),
        };

        ApplicationCommandSchema {
            name: self.name.clone(),
            description,
            target: self.target,
            options,
            default_member_permissions: self.required_permissions,
            nsfw: self.nsfw,
            contexts: self.integration_context_types.clone(),
            integration_types: self.integration_types.clone(),
        }
    }

    fn root_options(&self) -> Vec<ApplicationCommandOption> {
        match &self.body {
            CommandBody::Function(id) => match self.nodes.get(id.0) {
                Some(CommandNode::Function(function)) => function.options(),
                _ => Vec::new(),
            },
            CommandBody::SubCommands(children) => children
                .values()
                .filter_map(|id| self.as_option(*id))
                .collect(),
        }
    }

    /// Wire shape of one node. Sub commands come out sorted by name.
    pub fn as_option(&self, node: NodeId) -> Option<ApplicationCommandOption> {
        match self.nodes.get(node.0)? {
            CommandNode::Function(function) => Some(function.as_option()),
            CommandNode::Category(category) => {
                let mut option = ApplicationCommandOption::new(
                    ApplicationCommandOptionType::SubCommandGroup,
                    &category.name,
                    &category.description,
                );
                option.default = category.default;
                option.options = category
                    .sub_commands
                    .values()
                    .filter_map(|id| self.as_option(*id))
                    .collect();
                Some(option)
            }
        }
    }

    /// Structural copy with a fresh identity and no registered ids. Completers
    /// bound to this command are rebound to the copy.
    pub fn copy(&self) -> Self {
        let identity = Uuid::new_v4();
        let previous = self.identity;

        let mut nodes = self.nodes.clone();
        for node in &mut nodes {
            match node {
                CommandNode::Function(function) => {
                    for parameter in &mut function.parameters {
                        if let Some(completer) = parameter.auto_completer.as_mut() {
                            rebind_completer(completer, previous, identity);
                        }
                    }
                }
                CommandNode::Category(category) => {
                    for completer in &mut category.auto_completers {
                        rebind_completer(completer, previous, identity);
                    }
                }
            }
        }

        let mut auto_completers = self.auto_completers.clone();
        for completer in &mut auto_completers {
            rebind_completer(completer, previous, identity);
        }

        Self {
            identity,
            name: self.name.clone(),
            description: self.description.clone(),
            target: self.target,
            guild_ids: self.guild_ids.clone(),
            is_global: self.is_global,
            nsfw: self.nsfw,
            required_permissions: self.required_permissions,
            integration_context_types: self.integration_context_types.clone(),
            integration_types: self.integration_types.clone(),
            permission_overwrites: self.permission_overwrites.clone(),
            unloading_behaviour: self.unloading_behaviour,
            body: self.body.clone(),
            nodes,
            exception_handlers: self.exception_handlers.clone(),
            auto_completers,
            registered_ids: Mutex::new(HashMap::new()),
        }
    }

    pub fn registered_id(&self, sync_id: SyncId) -> Option<CommandId> {
        self.registered_ids.lock().get(&sync_id).copied()
    }

    pub fn registered_ids(&self) -> Vec<(SyncId, CommandId)> {
        let ids = self.registered_ids.lock();
        let mut ids: Vec<_> = ids.iter().map(|(sync_id, id)| (*sync_id, *id)).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the id previously registered under `sync_id`.
    pub(crate) fn register_id(&self, sync_id: SyncId, command_id: CommandId) -> Option<CommandId> {
        self.registered_ids.lock().insert(sync_id, command_id)
    }

    pub(crate) fn unregister_id(&self, sync_id: SyncId) -> Option<CommandId> {
        self.registered_ids.lock().remove(&sync_id)
    }

    fn path(&self, node: Option<NodeId>) -> String {
        let mut names = Vec::new();
        let mut current = match (&self.body, node) {
            (CommandBody::Function(root), Some(id)) if *root == id => None,
            _ => node,
        };
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.0) else {
                break;
            };
            names.push(node.name());
            current = node.parent();
        }
        names.push(&self.name);
        names.reverse();
        names.join(" ")
    }

    fn preferred_id(&self, guild_id: Option<GuildId>) -> Option<CommandId> {
        let ids = self.registered_ids.lock();
        if let Some(guild_id) = guild_id {
            if let Some(id) = ids.get(&guild_id) {
                return Some(*id);
            }
            return ids.get(&SYNC_ID_GLOBAL).copied();
        }
        ids.get(&SYNC_ID_GLOBAL).copied().or_else(|| {
            ids.iter()
                .min_by_key(|(sync_id, _)| **sync_id)
                .map(|(_, id)| *id)
        })
    }

    fn render_mention(&self, node: Option<NodeId>, command_id: Option<CommandId>) -> String {
        let path = self.path(node);
        match command_id {
            Some(command_id) => format!("</{path}:{command_id}>"),
            None => format!("/{path}"),
        }
    }

    /// `/name` until the command is synced, then a clickable `</name:id>`.
    pub fn mention(&self) -> String {
        self.render_mention(None, self.preferred_id(None))
    }

    pub fn mention_at(&self, guild_id: GuildId) -> String {
        self.render_mention(None, self.preferred_id(Some(guild_id)))
    }

    pub fn mention_node(&self, node: NodeId, guild_id: Option<GuildId>) -> String {
        self.render_mention(Some(node), self.preferred_id(guild_id))
    }

    fn node_name(&self, node: Option<NodeId>) -> &str {
        node.and_then(|id| self.nodes.get(id.0))
            .map(CommandNode::name)
            .unwrap_or(&self.name)
    }

    /// Handlers to consult for a failure at `origin`, innermost first.
    pub fn exception_handlers_from(&self, origin: Option<NodeId>) -> Vec<Arc<dyn ExceptionHandler>> {
        let mut handlers = Vec::new();
        let mut current = origin;
        while let Some(id) = current {
            let Some(node) = self.nodes.get(id.0) else {
                break;
            };
            handlers.extend(node.exception_handlers().iter().cloned());
            current = node.parent();
        }
        handlers.extend(self.exception_handlers.iter().cloned());
        handlers
    }

    /// Walks down by option name and runs the function found there.
    pub async fn invoke(
        &self,
        ctx: &InteractionContext,
        options: &[InteractionOption],
    ) -> Result<Option<ResponseMessage>, CommandFailure> {
        let mut children = match &self.body {
            CommandBody::Function(id) => return self.invoke_function(*id, ctx, options).await,
            CommandBody::SubCommands(children) => children,
        };
        let mut current: Option<NodeId> = None;
        let mut options = options;

        loop {
            let [option] = options else {
                return Ok(None);
            };
            let Some(&child) = children.get(&option.name) else {
                if children.is_empty() {
                    return Ok(None);
                }
                let error = SlashCommandParameterConversionError::new(
                    self.node_name(current),
                    ConversionExpectation::OneOf(children.keys().cloned().collect()),
                    Some(option.name.clone()),
                );
                return Err(CommandFailure {
                    origin: current,
                    error: error.into(),
                });
            };

            match self.nodes.get(child.0) {
                Some(CommandNode::Function(_)) => {
                    return self.invoke_function(child, ctx, &option.options).await
                }
                Some(CommandNode::Category(category)) => {
                    current = Some(child);
                    children = &category.sub_commands;
                    options = &option.options;
                }
                None => return Ok(None),
            }
        }
    }

    async fn invoke_function(
        &self,
        id: NodeId,
        ctx: &InteractionContext,
        options: &[InteractionOption],
    ) -> Result<Option<ResponseMessage>, CommandFailure> {
        let Some(CommandNode::Function(function)) = self.nodes.get(id.0) else {
            return Ok(None);
        };
        function.invoke(ctx, options).await.map_err(|error| CommandFailure {
            origin: Some(id),
            error,
        })
    }

    /// Same descent as [`invoke`](Self::invoke), then runs the completer of the
    /// focused parameter. Unknown sub commands are ignored.
    pub async fn invoke_auto_completion(
        &self,
        ctx: &InteractionContext,
        options: &[InteractionOption],
    ) -> Result<Option<Vec<ApplicationCommandOptionChoice>>, CommandFailure> {
        let (mut node, mut options) = match &self.body {
            CommandBody::Function(id) => (*id, options),
            CommandBody::SubCommands(children) => {
                let [option] = options else {
                    return Ok(None);
                };
                let Some(&child) = children.get(&option.name) else {
                    return Ok(None);
                };
                (child, option.options.as_slice())
            }
        };

        loop {
            match self.nodes.get(node.0) {
                Some(CommandNode::Function(function)) => {
                    return function
                        .invoke_auto_completion(ctx, options)
                        .await
                        .map_err(|error| CommandFailure {
                            origin: Some(node),
                            error,
                        });
                }
                Some(CommandNode::Category(category)) => {
                    let [option] = options else {
                        return Ok(None);
                    };
                    let Some(&child) = category.sub_commands.get(&option.name) else {
                        return Ok(None);
                    };
                    node = child;
                    options = option.options.as_slice();
                }
                None => return Ok(None),
            }
        }
    }
}

fn rebind_completer(completer: &mut SlashCommandParameterAutoCompleter, from: Uuid, to: Uuid) {
    if let Some(CompleterParent::Command { identity, node }) = completer.parent() {
        if identity == from {
            let copy = completer
                .bind_to(CompleterParent::Command { identity: to, node })
                .into_owned();
            *completer = copy;
        }
    }
}

impl PartialEq for SlashCommand {
    fn eq(&self, other: &Self) -> bool {
        self.schema() == other.schema()
            && self.guild_ids == other.guild_ids
            && self.is_global == other.is_global
            && self.permission_overwrites == other.permission_overwrites
    }
}

impl std::fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlashCommand")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("is_global", &self.is_global)
            .field("guild_ids", &self.guild_ids)
            .field("body", &self.body)
            .field("registered_ids", &self.registered_ids())
            .finish()
    }
}
