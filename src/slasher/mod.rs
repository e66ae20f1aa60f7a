//! # Slasher
//!
//! Owns every registered command, keeps Discord's registrations in line with
//! them and routes incoming interactions to their callbacks.
//!
//! One `Slasher` per client. The handle is cheap to clone and every clone
//! shares the same state.
//!
//! - **Version**: 1.4.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.4.0: Discard kept commands, guild join hook
//! - 1.3.0: Permission overwrite assertion with owner access
//! - 1.2.0: Deferred mutation while the main sync runs
//! - 1.1.0: Component and form routing
//! - 1.0.0: Initial sync engine and dispatcher

pub mod command_state;
pub mod permission_mismatch;
pub mod sync;

use dashmap::DashMap;
use futures::future::{join_all, BoxFuture, FutureExt, Shared};
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use command_state::{CommandChange, CommandState, CommandStateIdentifier};
pub use permission_mismatch::{
    overwrites_differ, reduce_application_command_permission_overwrites,
    PermissionMismatchWarning,
};
pub use sync::{DesiredCommands, SyncPlan};

use crate::api::{DiscordApi, OWNER_ACCESS_SCOPES};
use crate::commands::context::InteractionContext;
use crate::commands::handler::{AutoCompleteCallback, ExceptionHandler};
use crate::commands::registry::{CustomIdCommand, CustomIdRegistry};
use crate::commands::slash::{
    CompleterDeepness, CompleterParent, SlashCommand, SlashCommandParameterAutoCompleter,
    UnloadingBehaviour,
};
use crate::core::config::SlasherConfig;
use crate::core::error::{
    ApiError, CommandBuildError, SlashCommandParameterConversionError, SlasherSyncError,
    SyncOperation,
};
use crate::core::response::{ResponseMessage, AUTO_COMPLETE_CHOICES_MAX};
use crate::model::{
    ApplicationCommandPermission, ApplicationCommandPermissionOverwrite, CommandId, GuildId,
    InteractionEvent, InteractionType, OwnerAccess, RemoteCommand, SyncId, SYNC_ID_GLOBAL,
    SYNC_ID_MAIN, SYNC_ID_NON_GLOBAL,
};

type SyncTask = Shared<BoxFuture<'static, bool>>;

/// Runs `make`'s future at most once per `key` at a time. Concurrent callers
/// await the same future.
async fn run_single_flight<F>(tasks: &Mutex<HashMap<u64, SyncTask>>, key: u64, make: F) -> bool
where
    F: FnOnce() -> BoxFuture<'static, bool>,
{
    let task = {
        let mut tasks = tasks.lock();
        tasks.entry(key).or_insert_with(|| make().shared()).clone()
    };

    let result = task.clone().await;

    let mut tasks = tasks.lock();
    if tasks.get(&key).is_some_and(|current| current.ptr_eq(&task)) {
        tasks.remove(&key);
    }
    result
}

enum DeferredChange {
    Add(Arc<SlashCommand>),
    Remove(Arc<SlashCommand>),
    DiscardKept,
}

struct SlasherState {
    command_states: HashMap<SyncId, CommandState>,
    command_id_to_command: HashMap<CommandId, Arc<SlashCommand>>,
    /// Dirty sync targets with the generation they were last marked at.
    sync_should: HashMap<SyncId, u64>,
    sync_done: BTreeSet<SyncId>,
    generation: u64,
    call_later: Vec<DeferredChange>,
    unloading_behaviour: UnloadingBehaviour,
    known_guilds: BTreeSet<GuildId>,
    main_sync_running: bool,
    owner_access: Option<OwnerAccess>,
    team_owned: Option<bool>,
}

impl SlasherState {
    fn mark_dirty(&mut self, sync_id: SyncId) {
        if sync_id == SYNC_ID_NON_GLOBAL {
            let guilds: Vec<GuildId> = self.known_guilds.iter().copied().collect();
            for guild_id in guilds {
                self.mark_dirty(guild_id);
            }
            return;
        }

        self.generation += 1;
        self.sync_should.insert(sync_id, self.generation);
        self.sync_done.remove(&sync_id);
    }

    fn is_synced(&self, sync_id: SyncId) -> bool {
        self.sync_done.contains(&sync_id) && !self.sync_should.contains_key(&sync_id)
    }

    fn has_non_global(&self) -> bool {
        self.command_states
            .get(&SYNC_ID_NON_GLOBAL)
            .is_some_and(|state| !state.is_empty())
    }

    fn register(&mut self, sync_id: SyncId, command: &Arc<SlashCommand>, command_id: CommandId) {
        if let Some(previous) = command.register_id(sync_id, command_id) {
            if previous != command_id {
                self.drop_index(previous, command);
            }
        }
        self.command_id_to_command
            .insert(command_id, Arc::clone(command));
    }

    fn unregister(&mut self, sync_id: SyncId, command: &Arc<SlashCommand>) {
        if let Some(command_id) = command.unregister_id(sync_id) {
            self.drop_index(command_id, command);
        }
    }

    fn drop_index(&mut self, command_id: CommandId, command: &Arc<SlashCommand>) {
        if self
            .command_id_to_command
            .get(&command_id)
            .is_some_and(|indexed| Arc::ptr_eq(indexed, command))
        {
            self.command_id_to_command.remove(&command_id);
        }
    }

    fn add(&mut self, command: Arc<SlashCommand>) {
        for sync_id in command.sync_ids() {
            let (existing, tag) = self
                .command_states
                .entry(sync_id)
                .or_insert_with(|| CommandState::new(sync_id == SYNC_ID_NON_GLOBAL))
                .add(Arc::clone(&command));

            match tag {
                CommandStateIdentifier::Added | CommandStateIdentifier::NonGlobal => {
                    self.mark_dirty(sync_id)
                }
                CommandStateIdentifier::Active | CommandStateIdentifier::Kept => {
                    match existing.unregister_id(sync_id) {
                        Some(command_id) => {
                            self.drop_index(command_id, &existing);
                            self.register(sync_id, &command, command_id);
                        }
                        None => self.mark_dirty(sync_id),
                    }
                }
                CommandStateIdentifier::Removed => {}
            }
        }
    }

    fn remove(&mut self, command: &Arc<SlashCommand>) {
        let behaviour = self.unloading_behaviour;
        for sync_id in command.sync_ids() {
            let Some(tag) = self
                .command_states
                .get_mut(&sync_id)
                .map(|state| state.remove(command, behaviour))
            else {
                continue;
            };

            match tag {
                CommandStateIdentifier::Kept => {
                    // registration stays, only dispatch stops
                    if let Some(command_id) = command.registered_id(sync_id) {
                        self.drop_index(command_id, command);
                    }
                }
                CommandStateIdentifier::Removed => self.mark_dirty(sync_id),
                CommandStateIdentifier::NonGlobal => {
                    for (registered_at, _) in command.registered_ids() {
                        self.unregister(registered_at, command);
                    }
                    self.mark_dirty(sync_id);
                }
                CommandStateIdentifier::Active | CommandStateIdentifier::Added => {}
            }
        }
    }

    /// Queues the removal of every kept command.
    fn discard_kept(&mut self) {
        let sync_ids: Vec<SyncId> = self.command_states.keys().copied().collect();
        for sync_id in sync_ids {
            let discarded = self
                .command_states
                .get_mut(&sync_id)
                .map_or(0, CommandState::discard_kept);
            if discarded > 0 {
                self.mark_dirty(sync_id);
            }
        }
    }

    fn has_dirty_targets(&self) -> bool {
        self.sync_should.keys().any(|sync_id| *sync_id != SYNC_ID_NON_GLOBAL)
    }

    fn desired(&self, sync_id: SyncId) -> (DesiredCommands, Vec<CommandChange>) {
        let mut desired = DesiredCommands::default();
        let mut changes = Vec::new();
        if let Some(state) = self.command_states.get(&sync_id) {
            desired.add = state.should_add_commands();
            desired.keep = state.should_keep_commands();
            desired.remove = state.should_remove_commands();
            changes = state.changes().to_vec();
        }
        if sync_id != SYNC_ID_GLOBAL {
            if let Some(pool) = self.command_states.get(&SYNC_ID_NON_GLOBAL) {
                desired.non_global = pool.should_add_commands();
            }
        }
        (desired, changes)
    }

    fn finish_sync(&mut self, sync_id: SyncId, started_at: u64, applied: &[CommandChange]) {
        if let Some(state) = self.command_states.get_mut(&sync_id) {
            state.collapse_changes(applied);
        }
        for change in applied.iter().filter(|change| !change.added) {
            self.unregister(sync_id, &change.command);
        }

        let dirtied_since = self
            .sync_should
            .get(&sync_id)
            .is_some_and(|generation| *generation > started_at);
        if !dirtied_since {
            self.sync_should.remove(&sync_id);
            self.sync_done.insert(sync_id);
        }
    }
}

struct SlasherInner {
    api: Arc<dyn DiscordApi>,
    config: SlasherConfig,
    state: Mutex<SlasherState>,
    sync_tasks: Mutex<HashMap<SyncId, SyncTask>>,
    permission_tasks: Mutex<HashMap<GuildId, SyncTask>>,
    components: RwLock<CustomIdRegistry>,
    forms: RwLock<CustomIdRegistry>,
    exception_handlers: RwLock<Vec<Arc<dyn ExceptionHandler>>>,
    auto_completers: RwLock<Vec<SlashCommandParameterAutoCompleter>>,
    synced_permissions: DashMap<GuildId, HashMap<CommandId, ApplicationCommandPermission>>,
    launched: AtomicBool,
}

#[derive(Clone)]
pub struct Slasher {
    inner: Arc<SlasherInner>,
}

impl Slasher {
    pub fn new(api: Arc<dyn DiscordApi>, config: SlasherConfig) -> Self {
        let mut state = SlasherState {
            command_states: HashMap::new(),
            command_id_to_command: HashMap::new(),
            sync_should: HashMap::new(),
            sync_done: BTreeSet::new(),
            generation: 0,
            call_later: Vec::new(),
            unloading_behaviour: config.unloading_behaviour,
            known_guilds: BTreeSet::new(),
            main_sync_running: false,
            owner_access: None,
            team_owned: None,
        };
        for guild_id in &config.assert_application_command_permission_mismatch_at {
            state.known_guilds.insert(*guild_id);
            state.mark_dirty(*guild_id);
        }

        Self {
            inner: Arc::new(SlasherInner {
                api,
                config,
                state: Mutex::new(state),
                sync_tasks: Mutex::new(HashMap::new()),
                permission_tasks: Mutex::new(HashMap::new()),
                components: RwLock::new(CustomIdRegistry::new()),
                forms: RwLock::new(CustomIdRegistry::new()),
                exception_handlers: RwLock::new(Vec::new()),
                auto_completers: RwLock::new(Vec::new()),
                synced_permissions: DashMap::new(),
                launched: AtomicBool::new(false),
            }),
        }
    }

    pub fn config(&self) -> &SlasherConfig {
        &self.inner.config
    }

    /// Registers a command. Queued until the running main sync finishes, if any.
    pub fn add_command(&self, mut command: SlashCommand) -> Arc<SlashCommand> {
        for completer in self.inner.auto_completers.read().iter() {
            command.apply_slasher_auto_completer(completer);
        }
        let command = Arc::new(command);

        let mut state = self.inner.state.lock();
        if state.main_sync_running {
            state.call_later.push(DeferredChange::Add(Arc::clone(&command)));
        } else {
            state.add(Arc::clone(&command));
        }
        command
    }

    /// Unregisters a command. Its unloading behaviour, or the slasher's,
    /// decides whether the remote registration is deleted.
    pub fn remove_command(&self, command: &Arc<SlashCommand>) {
        let mut state = self.inner.state.lock();
        if state.main_sync_running {
            state.call_later.push(DeferredChange::Remove(Arc::clone(command)));
        } else {
            state.remove(command);
        }
    }

    pub fn add_component_command(
        &self,
        command: CustomIdCommand,
    ) -> Result<Arc<CustomIdCommand>, CommandBuildError> {
        self.inner.components.write().register(command)
    }

    pub fn remove_component_command(&self, name: &str) -> bool {
        self.inner.components.write().remove(name)
    }

    pub fn add_form_command(
        &self,
        command: CustomIdCommand,
    ) -> Result<Arc<CustomIdCommand>, CommandBuildError> {
        self.inner.forms.write().register(command)
    }

    pub fn remove_form_command(&self, name: &str) -> bool {
        self.inner.forms.write().remove(name)
    }

    /// Consulted after every command level handler declined.
    pub fn add_exception_handler(&self, handler: Arc<dyn ExceptionHandler>) {
        self.inner.exception_handlers.write().push(handler);
    }

    /// Completer applied to commands added from now on, never overriding the
    /// ones they bind themselves.
    pub fn add_auto_completer(&self, mut completer: SlashCommandParameterAutoCompleter) {
        completer.bind_to(CompleterParent::Slasher);
        completer.set_deepness(CompleterDeepness::Root);
        self.inner.auto_completers.write().push(completer);
    }

    pub fn auto_complete<C>(&self, parameter_names: &[&str], callback: C) -> Result<(), CommandBuildError>
    where
        C: AutoCompleteCallback + 'static,
    {
        let completer = SlashCommandParameterAutoCompleter::new(callback, parameter_names)?;
        self.add_auto_completer(completer);
        Ok(())
    }

    pub fn command_by_id(&self, command_id: CommandId) -> Option<Arc<SlashCommand>> {
        self.inner
            .state
            .lock()
            .command_id_to_command
            .get(&command_id)
            .cloned()
    }

    pub fn is_synced(&self, sync_id: SyncId) -> bool {
        self.inner.state.lock().is_synced(sync_id)
    }

    fn has_dirty_targets(&self) -> bool {
        self.inner.state.lock().has_dirty_targets()
    }

    pub fn unloading_behaviour(&self) -> UnloadingBehaviour {
        self.inner.state.lock().unloading_behaviour
    }

    fn report(&self, error: SlasherSyncError) {
        if error.source.is_connection() {
            debug!("🔌 {error}");
        } else {
            error!("❌ {error}");
        }
    }

    /// Syncs every dirty target. Concurrent calls share one run, and changes
    /// queued meanwhile trigger another pass.
    pub async fn sync(&self) -> bool {
        let slasher = self.clone();
        run_single_flight(&self.inner.sync_tasks, SYNC_ID_MAIN, move || {
            slasher.main_sync_loop().boxed()
        })
        .await
    }

    async fn main_sync_loop(self) -> bool {
        loop {
            let targets: Vec<SyncId> = {
                let mut state = self.inner.state.lock();
                state.main_sync_running = true;
                state
                    .sync_should
                    .keys()
                    .copied()
                    .filter(|sync_id| *sync_id != SYNC_ID_NON_GLOBAL)
                    .collect()
            };

            let results = join_all(targets.into_iter().map(|sync_id| self.sync_target(sync_id))).await;
            let success = results.into_iter().all(|synced| synced);

            let mut state = self.inner.state.lock();
            let deferred = std::mem::take(&mut state.call_later);
            if deferred.is_empty() {
                state.main_sync_running = false;
                return success;
            }
            debug!("Applying {} changes queued during sync", deferred.len());
            for change in deferred {
                match change {
                    DeferredChange::Add(command) => state.add(command),
                    DeferredChange::Remove(command) => state.remove(&command),
                    DeferredChange::DiscardKept => state.discard_kept(),
                }
            }
        }
    }

    /// Syncs one guild unless it is already up to date.
    pub async fn sync_guild(&self, guild_id: GuildId) -> bool {
        {
            let mut state = self.inner.state.lock();
            state.known_guilds.insert(guild_id);
            if state.is_synced(guild_id) {
                return true;
            }
        }
        self.sync_target(guild_id).await
    }

    pub async fn sync_global(&self) -> bool {
        if self.is_synced(SYNC_ID_GLOBAL) {
            return true;
        }
        self.sync_target(SYNC_ID_GLOBAL).await
    }

    async fn sync_target(&self, sync_id: SyncId) -> bool {
        let slasher = self.clone();
        run_single_flight(&self.inner.sync_tasks, sync_id, move || {
            slasher.sync_target_task(sync_id).boxed()
        })
        .await
    }

    async fn list_remote(&self, sync_id: SyncId) -> Result<Vec<RemoteCommand>, ApiError> {
        if sync_id == SYNC_ID_GLOBAL {
            self.inner.api.list_global_commands().await
        } else {
            self.inner.api.list_guild_commands(sync_id).await
        }
    }

    async fn sync_target_task(self, sync_id: SyncId) -> bool {
        let (started_at, desired, changes) = {
            let state = self.inner.state.lock();
            let (desired, changes) = state.desired(sync_id);
            (state.generation, desired, changes)
        };

        let remote = match self.list_remote(sync_id).await {
            Ok(remote) => remote,
            Err(source) => {
                self.report(SlasherSyncError::new(sync_id, None, SyncOperation::List, source));
                return false;
            }
        };

        let plan = SyncPlan::build(&remote, &desired);
        if plan.is_noop() {
            debug!(
                "Sync {sync_id}: up to date, {} matched, {} kept",
                plan.matched.len(),
                plan.kept.len()
            );
        } else {
            debug!(
                "Sync {sync_id}: {} matched, {} kept, {} edits, {} creates, {} deletes",
                plan.matched.len(),
                plan.kept.len(),
                plan.edits.len(),
                plan.creates.len(),
                plan.deletes.len()
            );
        }
        {
            let mut state = self.inner.state.lock();
            for (command, command_id) in &plan.matched {
                state.register(sync_id, command, *command_id);
            }
        }

        let mut success = true;

        let deletes = plan
            .deletes
            .iter()
            .map(|(command, command_id)| self.delete_remote(sync_id, command.as_ref(), *command_id));
        success &= join_all(deletes).await.into_iter().all(|ok| ok);

        let edits = plan
            .edits
            .iter()
            .map(|(command, command_id)| self.edit_remote(sync_id, command, *command_id));
        success &= join_all(edits).await.into_iter().all(|ok| ok);

        let creates = plan
            .creates
            .iter()
            .map(|command| self.create_remote(sync_id, command));
        success &= join_all(creates).await.into_iter().all(|ok| ok);

        if sync_id != SYNC_ID_GLOBAL && self.inner.config.asserts_permissions_at(sync_id) {
            success &= self.sync_permissions(sync_id).await;
        }

        if success {
            self.inner
                .state
                .lock()
                .finish_sync(sync_id, started_at, &changes);
        }
        success
    }

    async fn delete_remote(
        &self,
        sync_id: SyncId,
        command: Option<&Arc<SlashCommand>>,
        command_id: CommandId,
    ) -> bool {
        let result = if sync_id == SYNC_ID_GLOBAL {
            self.inner.api.delete_global_command(command_id).await
        } else {
            self.inner.api.delete_guild_command(sync_id, command_id).await
        };

        match result {
            Err(source) if !source.is_unknown_application_command() => {
                let name = command.map(|command| command.name().to_string());
                self.report(SlasherSyncError::new(sync_id, name, SyncOperation::Delete, source));
                false
            }
            _ => {
                if let Some(command) = command {
                    self.inner.state.lock().unregister(sync_id, command);
                }
                true
            }
        }
    }

    async fn edit_remote(&self, sync_id: SyncId, command: &Arc<SlashCommand>, command_id: CommandId) -> bool {
        let schema = command.schema();
        let result = if sync_id == SYNC_ID_GLOBAL {
            self.inner.api.edit_global_command(command_id, &schema).await
        } else {
            self.inner
                .api
                .edit_guild_command(sync_id, command_id, &schema)
                .await
        };

        match result {
            Ok(remote) => {
                self.inner.state.lock().register(sync_id, command, remote.id);
                true
            }
            Err(source) if source.is_unknown_application_command() => {
                self.inner.state.lock().unregister(sync_id, command);
                self.create_remote(sync_id, command).await
            }
            Err(source) => {
                self.report(SlasherSyncError::new(
                    sync_id,
                    Some(command.name().to_string()),
                    SyncOperation::Edit,
                    source,
                ));
                false
            }
        }
    }

    async fn create_remote(&self, sync_id: SyncId, command: &Arc<SlashCommand>) -> bool {
        let schema = command.schema();
        let result = if sync_id == SYNC_ID_GLOBAL {
            self.inner.api.create_global_command(&schema).await
        } else {
            self.inner.api.create_guild_command(sync_id, &schema).await
        };

        match result {
            Ok(remote) => {
                self.inner.state.lock().register(sync_id, command, remote.id);
                true
            }
            Err(source) => {
                self.report(SlasherSyncError::new(
                    sync_id,
                    Some(command.name().to_string()),
                    SyncOperation::Create,
                    source,
                ));
                false
            }
        }
    }

    /// Remote overwrites of every command in the guild, fetched once and cached.
    async fn guild_permissions(
        &self,
        guild_id: GuildId,
    ) -> Option<HashMap<CommandId, ApplicationCommandPermission>> {
        if let Some(cached) = self.inner.synced_permissions.get(&guild_id) {
            return Some(cached.value().clone());
        }

        let slasher = self.clone();
        let fetched = run_single_flight(&self.inner.permission_tasks, guild_id, move || {
            async move {
                match slasher.inner.api.get_guild_permissions(guild_id).await {
                    Ok(permissions) => {
                        let permissions = permissions
                            .into_iter()
                            .map(|permission| (permission.application_command_id, permission))
                            .collect();
                        slasher.inner.synced_permissions.insert(guild_id, permissions);
                        true
                    }
                    Err(source) => {
                        slasher.report(SlasherSyncError::new(
                            guild_id,
                            None,
                            SyncOperation::ListPermissions,
                            source,
                        ));
                        false
                    }
                }
            }
            .boxed()
        })
        .await;

        if !fetched {
            return None;
        }
        self.inner
            .synced_permissions
            .get(&guild_id)
            .map(|cached| cached.value().clone())
    }

    async fn sync_permissions(&self, guild_id: GuildId) -> bool {
        let Some(remote) = self.guild_permissions(guild_id).await else {
            return false;
        };

        let expected: Vec<(Arc<SlashCommand>, CommandId, Vec<ApplicationCommandPermissionOverwrite>)> = {
            let state = self.inner.state.lock();
            state
                .command_id_to_command
                .iter()
                .filter_map(|(command_id, command)| {
                    let overwrites = command.permission_overwrites_at(guild_id);
                    let registered_here = command.registered_id(guild_id) == Some(*command_id);
                    let global_with_overwrites =
                        command.registered_id(SYNC_ID_GLOBAL) == Some(*command_id) && !overwrites.is_empty();
                    (registered_here || global_with_overwrites)
                        .then(|| (Arc::clone(command), *command_id, overwrites.to_vec()))
                })
                .collect()
        };

        let checks = expected.iter().filter_map(|(command, command_id, overwrites)| {
            let actual = remote
                .get(command_id)
                .map(|permission| permission.permission_overwrites.clone())
                .unwrap_or_default();
            overwrites_differ(guild_id, overwrites, &actual).then(|| {
                self.resolve_permission_mismatch(guild_id, command, *command_id, overwrites, actual)
            })
        });
        join_all(checks).await;
        true
    }

    async fn resolve_permission_mismatch(
        &self,
        guild_id: GuildId,
        command: &Arc<SlashCommand>,
        command_id: CommandId,
        expected: &[ApplicationCommandPermissionOverwrite],
        actual: Vec<ApplicationCommandPermissionOverwrite>,
    ) {
        if self.inner.config.enforce_application_command_permissions
            && self.application_is_team_owned(guild_id).await == Some(false)
        {
            if let Some(owner_access) = self.owner_access(guild_id).await {
                match self
                    .inner
                    .api
                    .edit_permissions(&owner_access, guild_id, command_id, expected)
                    .await
                {
                    Ok(permission) => {
                        info!("🔐 Updated permissions of `{}` in guild {guild_id}", command.name());
                        self.inner
                            .synced_permissions
                            .entry(guild_id)
                            .or_default()
                            .insert(command_id, permission);
                        return;
                    }
                    Err(source) => self.report(SlasherSyncError::new(
                        guild_id,
                        Some(command.name().to_string()),
                        SyncOperation::EditPermissions,
                        source,
                    )),
                }
            }
        }

        PermissionMismatchWarning::new(guild_id, command.name(), command_id, expected, &actual).emit();
    }

    async fn application_is_team_owned(&self, sync_id: SyncId) -> Option<bool> {
        if let Some(team_owned) = self.inner.state.lock().team_owned {
            return Some(team_owned);
        }
        match self.inner.api.application_is_team_owned().await {
            Ok(team_owned) => {
                self.inner.state.lock().team_owned = Some(team_owned);
                Some(team_owned)
            }
            Err(source) => {
                self.report(SlasherSyncError::new(
                    sync_id,
                    None,
                    SyncOperation::ApplicationInfo,
                    source,
                ));
                None
            }
        }
    }

    async fn owner_access(&self, sync_id: SyncId) -> Option<OwnerAccess> {
        let cached = self.inner.state.lock().owner_access.clone();
        if let Some(owner_access) = cached.filter(|access| !access.is_expired()) {
            return Some(owner_access);
        }
        match self.inner.api.request_owner_access(OWNER_ACCESS_SCOPES).await {
            Ok(owner_access) => {
                self.inner.state.lock().owner_access = Some(owner_access.clone());
                Some(owner_access)
            }
            Err(source) => {
                self.report(SlasherSyncError::new(
                    sync_id,
                    None,
                    SyncOperation::RequestOwnerAccess,
                    source,
                ));
                None
            }
        }
    }

    /// Runs the first sync. Later calls return `None` without doing anything.
    pub async fn on_ready(&self, guild_ids: impl IntoIterator<Item = GuildId>) -> Option<bool> {
        if self.inner.launched.swap(true, Ordering::SeqCst) {
            return None;
        }

        {
            let mut state = self.inner.state.lock();
            state.known_guilds.extend(guild_ids);
            state.mark_dirty(SYNC_ID_GLOBAL);
            let sync_ids: Vec<SyncId> = state.command_states.keys().copied().collect();
            for sync_id in sync_ids {
                state.mark_dirty(sync_id);
            }
        }

        info!("🔄 Syncing application commands");
        let synced = self.sync().await;
        if synced {
            info!("✅ Application commands synced");
        } else {
            warn!("⚠️ Application command sync incomplete, retrying on the next sync");
        }
        Some(synced)
    }

    /// A guild became available. Non-global commands are matched there.
    pub async fn on_guild_join(&self, guild_id: GuildId) -> bool {
        let should_sync = {
            let mut state = self.inner.state.lock();
            let is_new = state.known_guilds.insert(guild_id);
            let relevant = state.has_non_global() || state.command_states.contains_key(&guild_id);
            if is_new && relevant {
                state.mark_dirty(guild_id);
            }
            is_new && relevant
        };

        if should_sync && self.inner.launched.load(Ordering::SeqCst) {
            return self.sync_guild(guild_id).await;
        }
        true
    }

    /// Someone changed the guild's commands outside of this slasher.
    pub async fn on_guild_application_commands_changed(&self, guild_id: GuildId) -> bool {
        let has_non_global = {
            let mut state = self.inner.state.lock();
            state.known_guilds.insert(guild_id);
            state.mark_dirty(guild_id);
            state.has_non_global()
        };

        if has_non_global {
            return self.sync_guild(guild_id).await;
        }
        true
    }

    /// Keeps the permission cache in line with gateway updates.
    pub fn on_application_command_permission_update(&self, permission: ApplicationCommandPermission) {
        if let Some(mut cached) = self.inner.synced_permissions.get_mut(&permission.guild_id) {
            cached.insert(permission.application_command_id, permission);
        }
    }

    /// Deletes every command left registered by a keep unloading behaviour.
    /// Returns once no target is dirty or a pass failed.
    pub async fn discard_kept_commands(&self) -> bool {
        let previous = {
            let mut state = self.inner.state.lock();
            let previous = std::mem::replace(&mut state.unloading_behaviour, UnloadingBehaviour::Delete);
            if state.main_sync_running {
                state.call_later.push(DeferredChange::DiscardKept);
            } else {
                state.discard_kept();
            }
            previous
        };

        let mut synced = self.sync().await;
        while synced && self.has_dirty_targets() {
            synced = self.sync().await;
        }
        self.inner.state.lock().unloading_behaviour = previous;
        synced
    }

    /// Routes one interaction to its command, completer, component or form.
    pub async fn dispatch(&self, event: InteractionEvent) {
        let kind = event.kind;
        let ctx = InteractionContext::new(Arc::clone(&self.inner.api), event);
        match kind {
            InteractionType::Ping => {}
            InteractionType::ApplicationCommand => self.dispatch_command(ctx).await,
            InteractionType::ApplicationCommandAutocomplete => self.dispatch_auto_complete(ctx).await,
            InteractionType::MessageComponent => self.dispatch_custom_id(ctx, false).await,
            InteractionType::ModalSubmit => self.dispatch_custom_id(ctx, true).await,
        }
    }

    async fn resolve_command(&self, event: &InteractionEvent) -> Option<Arc<SlashCommand>> {
        let command_id = event.command_id()?;
        if let Some(command) = self.command_by_id(command_id) {
            return Some(command);
        }

        if let Some(guild_id) = event.guild_id {
            self.sync_guild(guild_id).await;
            if let Some(command) = self.command_by_id(command_id) {
                return Some(command);
            }
        }

        self.sync_global().await;
        let command = self.command_by_id(command_id);
        if command.is_none() {
            error!("❌ No command registered under id {command_id} (`{}`)", event.data.name);
        }
        command
    }

    async fn dispatch_command(&self, ctx: InteractionContext) {
        let Some(command) = self.resolve_command(&ctx.event).await else {
            return;
        };

        match command.invoke(&ctx, &ctx.event.data.options).await {
            Ok(Some(message)) => {
                if let Err(e) = ctx.respond(&message).await {
                    error!("Failed to respond to `{}`: {e}", command.name());
                }
            }
            Ok(None) => {}
            Err(failure) => {
                let handlers = command.exception_handlers_from(failure.origin);
                self.handle_failure(&ctx, command.name(), handlers, failure.error)
                    .await;
            }
        }
    }

    async fn dispatch_auto_complete(&self, ctx: InteractionContext) {
        let Some(command) = self.resolve_command(&ctx.event).await else {
            return;
        };

        match command
            .invoke_auto_completion(&ctx, &ctx.event.data.options)
            .await
        {
            Ok(Some(mut choices)) => {
                choices.truncate(AUTO_COMPLETE_CHOICES_MAX);
                if let Err(e) = ctx.api.respond_auto_complete(&ctx.event, &choices).await {
                    debug!("Failed to send choices for `{}`: {e}", command.name());
                }
            }
            Ok(None) => {}
            Err(failure) => {
                let handlers = command.exception_handlers_from(failure.origin);
                self.handle_failure(&ctx, command.name(), handlers, failure.error)
                    .await;
            }
        }
    }

    async fn dispatch_custom_id(&self, ctx: InteractionContext, is_form: bool) {
        let found = {
            let registry = if is_form {
                self.inner.forms.read()
            } else {
                self.inner.components.read()
            };
            registry.find(&ctx.event.data.custom_id)
        };
        let Some((command, captures)) = found else {
            debug!("No handler for custom id `{}`", ctx.event.data.custom_id);
            return;
        };

        match command.invoke(ctx.clone(), captures).await {
            Ok(Some(message)) => {
                if let Err(e) = ctx.respond(&message).await {
                    error!("Failed to respond to `{}`: {e}", command.name());
                }
            }
            Ok(None) => {}
            Err(error) => {
                self.handle_failure(&ctx, command.name(), command.exception_handlers.clone(), error)
                    .await;
            }
        }
    }

    /// Offers `error` to `handlers`, then to the slasher's handlers, and falls
    /// back to the default rendering when every one of them declines.
    async fn handle_failure(
        &self,
        ctx: &InteractionContext,
        name: &str,
        mut handlers: Vec<Arc<dyn ExceptionHandler>>,
        error: anyhow::Error,
    ) {
        handlers.extend(self.inner.exception_handlers.read().iter().cloned());
        for handler in handlers {
            if handler.handle(ctx, name, &error).await {
                return;
            }
        }
        self.default_exception_handler(ctx, name, &error).await;
    }

    async fn default_exception_handler(
        &self,
        ctx: &InteractionContext,
        name: &str,
        error: &anyhow::Error,
    ) {
        let content = match error.downcast_ref::<SlashCommandParameterConversionError>() {
            Some(conversion) => {
                debug!("Rejected input to `{name}`: {conversion}");
                conversion.user_message()
            }
            None => {
                error!("❌ Error in `{name}`: {error:#}");
                self.inner.config.pick_error_message()
            }
        };

        if ctx.event.kind == InteractionType::ApplicationCommandAutocomplete {
            return;
        }
        if let Err(e) = ctx.respond(&ResponseMessage::new(content).ephemeral(true)).await {
            debug!("Failed to send error message for `{name}`: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::slash::{Arguments, ParameterConverter, ParameterType, SlashCommandFunction};
    use crate::model::{ApplicationCommandOptionChoice, ApplicationCommandOptionType, InteractionOption};
    use crate::testing::{
        application_command_event, auto_complete_event, component_event, form_event, MockApi,
    };
    use serde_json::json;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    const GUILD: GuildId = 700;

    fn slasher(api: &Arc<MockApi>) -> Slasher {
        Slasher::new(api.clone(), SlasherConfig::default())
    }

    fn yuuka(calls: Arc<AtomicUsize>) -> SlashCommand {
        let mut command = SlashCommand::new("yuuka", "Flower garden").unwrap();
        command
            .add_function(
                None,
                SlashCommandFunction::new(
                    "wriggle",
                    "Calls a firefly",
                    move |_ctx: InteractionContext, _args: Arguments| {
                        let calls = calls.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            anyhow::Ok(Some("Wriggle arrives".to_string()))
                        }
                    },
                )
                .unwrap(),
            )
            .unwrap();
        command
    }

    fn simple(name: &str) -> SlashCommand {
        SlashCommand::from_function(
            SlashCommandFunction::new(
                name,
                "Does a thing",
                |_ctx: InteractionContext, _args: Arguments| async move { anyhow::Ok(None::<String>) },
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_sync_creates_then_dispatches() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let calls = Arc::new(AtomicUsize::new(0));
        let command = slasher.add_command(yuuka(calls.clone()).global());

        assert_eq!(slasher.on_ready([]).await, Some(true));
        assert_eq!(slasher.on_ready([]).await, None);

        let command_id = command.registered_id(SYNC_ID_GLOBAL).unwrap();
        assert_eq!(api.global_commands().len(), 1);
        assert!(slasher.is_synced(SYNC_ID_GLOBAL));

        slasher
            .dispatch(application_command_event(
                command_id,
                "yuuka",
                vec![InteractionOption::sub_command("wriggle", Vec::new())],
            ))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.responses()[0].content, "Wriggle arrives");
    }

    #[tokio::test]
    async fn test_existing_registration_is_reused() {
        let api = Arc::new(MockApi::new());
        let existing = api.seed_global(simple("ping").schema());
        let slasher = slasher(&api);
        let command = slasher.add_command(simple("ping").global());

        assert!(slasher.sync().await);

        assert_eq!(command.registered_id(SYNC_ID_GLOBAL), Some(existing));
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
        assert_eq!(api.edit_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_orphans_are_deleted_and_removals_applied() {
        let api = Arc::new(MockApi::new());
        api.seed_global(simple("orphan").schema());
        let slasher = slasher(&api);
        let ping = slasher.add_command(simple("ping").global());
        assert!(slasher.sync().await);
        assert_eq!(api.global_commands().len(), 1);

        slasher.remove_command(&ping);
        assert!(slasher.sync().await);

        assert!(api.global_commands().is_empty());
        assert_eq!(ping.registered_id(SYNC_ID_GLOBAL), None);
    }

    #[tokio::test]
    async fn test_keep_leaves_remote_registration() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let ping = slasher.add_command(
            simple("ping")
                .global()
                .unloading_behaviour(UnloadingBehaviour::Keep),
        );
        assert!(slasher.sync().await);
        let command_id = ping.registered_id(SYNC_ID_GLOBAL).unwrap();

        slasher.remove_command(&ping);
        assert!(slasher.sync().await);
        assert_eq!(api.global_commands().len(), 1);
        assert!(slasher.command_by_id(command_id).is_none());

        let again = slasher.add_command(
            simple("ping")
                .global()
                .unloading_behaviour(UnloadingBehaviour::Keep),
        );
        assert_eq!(again.registered_id(SYNC_ID_GLOBAL), Some(command_id));
        assert!(slasher.command_by_id(command_id).is_some());

        slasher.remove_command(&again);
        assert!(slasher.discard_kept_commands().await);
        assert!(api.global_commands().is_empty());
    }

    #[tokio::test]
    async fn test_keep_before_first_sync_preserves_remote() {
        let api = Arc::new(MockApi::new());
        let existing = api.seed_global(simple("ping").schema());
        let slasher = slasher(&api);
        let ping = slasher.add_command(
            simple("ping")
                .global()
                .unloading_behaviour(UnloadingBehaviour::Keep),
        );

        slasher.remove_command(&ping);
        assert!(slasher.sync().await);

        assert_eq!(api.global_commands().len(), 1);
        assert_eq!(api.global_commands()[0].id, existing);
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_discard_kept_during_running_sync() {
        let api = Arc::new(MockApi::new().with_delay(Duration::from_millis(20)));
        let slasher = slasher(&api);
        let kept = slasher.add_command(
            simple("kept")
                .global()
                .unloading_behaviour(UnloadingBehaviour::Keep),
        );
        assert!(slasher.sync().await);
        slasher.remove_command(&kept);
        slasher.add_command(simple("other").global());

        let background = slasher.clone();
        let running = tokio::spawn(async move { background.sync().await });
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(slasher.discard_kept_commands().await);
        assert!(running.await.unwrap());

        let names: Vec<String> = api
            .global_commands()
            .into_iter()
            .map(|remote| remote.schema.name)
            .collect();
        assert_eq!(names, vec!["other"]);
        assert!(slasher.is_synced(SYNC_ID_GLOBAL));
        assert_eq!(slasher.unloading_behaviour(), UnloadingBehaviour::Delete);
    }

    #[tokio::test]
    async fn test_unknown_command_on_delete_is_success() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let ping = slasher.add_command(simple("ping").global());
        assert!(slasher.sync().await);

        api.fail("delete", MockApi::unknown_command());
        slasher.remove_command(&ping);

        assert!(slasher.sync().await);
        assert_eq!(api.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(ping.registered_id(SYNC_ID_GLOBAL), None);
        assert!(slasher.is_synced(SYNC_ID_GLOBAL));
    }

    #[tokio::test]
    async fn test_changed_command_is_edited() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let first = slasher.add_command(simple("ping").global());
        assert!(slasher.sync().await);
        let command_id = first.registered_id(SYNC_ID_GLOBAL).unwrap();

        let second = slasher.add_command(simple("ping").global().nsfw(true));
        assert!(slasher.sync().await);

        assert_eq!(api.edit_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.registered_id(SYNC_ID_GLOBAL), Some(command_id));
        assert!(Arc::ptr_eq(&slasher.command_by_id(command_id).unwrap(), &second));
    }

    #[tokio::test]
    async fn test_concurrent_guild_sync_lists_once() {
        let api = Arc::new(MockApi::new().with_delay(Duration::from_millis(20)));
        let slasher = slasher(&api);
        slasher.add_command(simple("ping").guilds([GUILD]));

        let (first, second) = tokio::join!(slasher.sync_guild(GUILD), slasher.sync_guild(GUILD));

        assert!(first && second);
        assert_eq!(api.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.guild_commands(GUILD).len(), 1);
    }

    #[tokio::test]
    async fn test_connection_failure_keeps_target_dirty() {
        let api = Arc::new(MockApi::new());
        api.fail("create", ApiError::Connection("reset by peer".to_string()));
        let slasher = slasher(&api);
        let ping = slasher.add_command(simple("ping").global());

        assert!(!slasher.sync().await);
        assert!(!slasher.is_synced(SYNC_ID_GLOBAL));

        api.clear_failure("create");
        assert!(slasher.sync().await);
        assert!(ping.registered_id(SYNC_ID_GLOBAL).is_some());
    }

    #[tokio::test]
    async fn test_unknown_command_on_edit_recreates() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        slasher.add_command(simple("ping").global());
        assert!(slasher.sync().await);

        api.fail("edit", MockApi::unknown_command());
        let second = slasher.add_command(simple("ping").global().nsfw(true));
        assert!(slasher.sync().await);

        assert_eq!(api.create_calls.load(Ordering::SeqCst), 2);
        assert!(second.registered_id(SYNC_ID_GLOBAL).is_some());
    }

    #[tokio::test]
    async fn test_changes_during_main_sync_are_deferred() {
        let api = Arc::new(MockApi::new().with_delay(Duration::from_millis(20)));
        let slasher = slasher(&api);
        slasher.add_command(simple("ping").global());

        let background = slasher.clone();
        let running = tokio::spawn(async move { background.sync().await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let late = slasher.add_command(simple("pong").global());

        assert!(running.await.unwrap());
        assert!(late.registered_id(SYNC_ID_GLOBAL).is_some());
        assert_eq!(api.global_commands().len(), 2);
    }

    #[tokio::test]
    async fn test_non_global_commands_match_in_guilds() {
        let api = Arc::new(MockApi::new());
        let existing = api.seed_guild(GUILD, simple("ping").schema());
        let slasher = slasher(&api);
        let ping = slasher.add_command(simple("ping"));

        assert_eq!(slasher.on_ready([GUILD]).await, Some(true));

        assert_eq!(ping.registered_id(GUILD), Some(existing));
        assert_eq!(api.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_triggers_sync_before_dispatch() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let calls = Arc::new(AtomicUsize::new(0));
        let command = slasher.add_command(yuuka(calls.clone()).global());
        let remote = api.seed_global(command.schema());

        slasher
            .dispatch(application_command_event(
                remote,
                "yuuka",
                vec![InteractionOption::sub_command("wriggle", Vec::new())],
            ))
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    struct Swallow(Arc<AtomicUsize>);

    #[async_trait]
    impl ExceptionHandler for Swallow {
        async fn handle(&self, _ctx: &InteractionContext, _command: &str, _error: &anyhow::Error) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[tokio::test]
    async fn test_conversion_error_reaches_user() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let command = slasher.add_command(yuuka(Arc::new(AtomicUsize::new(0))).global());
        assert!(slasher.sync().await);
        let command_id = command.registered_id(SYNC_ID_GLOBAL).unwrap();

        slasher
            .dispatch(application_command_event(
                command_id,
                "yuuka",
                vec![InteractionOption::sub_command("mystia", Vec::new())],
            ))
            .await;

        let responses = api.responses();
        assert_eq!(responses.len(), 1);
        assert!(responses[0].ephemeral);
        assert!(responses[0].content.contains("mystia"));
    }

    #[tokio::test]
    async fn test_slasher_exception_handler_swallows() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        let handled = Arc::new(AtomicUsize::new(0));
        slasher.add_exception_handler(Arc::new(Swallow(handled.clone())));
        let failing = SlashCommand::from_function(
            SlashCommandFunction::new(
                "explode",
                "Always fails",
                |_ctx: InteractionContext, _args: Arguments| async move {
                    Err::<Option<String>, _>(anyhow::anyhow!("boom"))
                },
            )
            .unwrap(),
        );
        let command = slasher.add_command(failing.global());
        assert!(slasher.sync().await);

        slasher
            .dispatch(application_command_event(
                command.registered_id(SYNC_ID_GLOBAL).unwrap(),
                "explode",
                Vec::new(),
            ))
            .await;

        assert_eq!(handled.load(Ordering::SeqCst), 1);
        assert!(api.responses().is_empty());
    }

    #[tokio::test]
    async fn test_slasher_completer_fills_choices() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        slasher
            .auto_complete(&["flower"], |_ctx: InteractionContext, value: String| async move {
                anyhow::Ok(
                    (0..30)
                        .map(|index| ApplicationCommandOptionChoice::named(format!("{value}{index}")))
                        .collect::<Vec<_>>(),
                )
            })
            .unwrap();
        let bloom = SlashCommand::from_function(
            SlashCommandFunction::new(
                "bloom",
                "Grows a flower",
                |_ctx: InteractionContext, _args: Arguments| async move { anyhow::Ok(None::<String>) },
            )
            .unwrap()
            .parameter(ParameterConverter::new("flower", ParameterType::String, "A flower").unwrap())
            .unwrap(),
        );
        let command = slasher.add_command(bloom.global());
        assert!(command.schema().options[0].autocomplete);
        assert!(slasher.sync().await);

        slasher
            .dispatch(auto_complete_event(
                command.registered_id(SYNC_ID_GLOBAL).unwrap(),
                "bloom",
                vec![InteractionOption::value("flower", ApplicationCommandOptionType::String, "sun").focused()],
            ))
            .await;

        let choices = api.auto_complete_responses();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].len(), AUTO_COMPLETE_CHOICES_MAX);
        assert_eq!(choices[0][0].name, "sun0");
    }

    #[tokio::test]
    async fn test_component_routed_by_pattern() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        slasher
            .add_component_command(
                CustomIdCommand::new("water", |_ctx: InteractionContext, captures: Vec<String>| async move {
                    anyhow::Ok(Some(format!("Watered {}", captures[0])))
                })
                .pattern(r"water:(\w+)")
                .unwrap(),
            )
            .unwrap();

        slasher.dispatch(component_event("water:sunflower")).await;
        slasher.dispatch(component_event("dig:sunflower")).await;

        let responses = api.responses();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].content, "Watered sunflower");
    }

    #[tokio::test]
    async fn test_form_and_component_registries_are_separate() {
        let api = Arc::new(MockApi::new());
        let slasher = slasher(&api);
        slasher
            .add_form_command(
                CustomIdCommand::new("feedback", |ctx: InteractionContext, _captures: Vec<String>| async move {
                    let values = ctx.event.data.form_values();
                    anyhow::Ok(Some(format!("Thanks for {}", values[0].1)))
                })
                .custom_id("feedback"),
            )
            .unwrap();

        slasher.dispatch(component_event("feedback")).await;
        assert!(api.responses().is_empty());

        slasher
            .dispatch(form_event(
                "feedback",
                vec![json!({"type": 1, "components": [{"type": 4, "custom_id": "title", "value": "Sunflowers"}]})],
            ))
            .await;
        assert_eq!(api.responses()[0].content, "Thanks for Sunflowers");

        assert!(slasher.remove_form_command("feedback"));
        assert!(!slasher.remove_form_command("feedback"));
    }

    #[tokio::test]
    async fn test_permission_mismatch_is_enforced() {
        let api = Arc::new(MockApi::new());
        let mut config = SlasherConfig::default();
        config.enforce_application_command_permissions = true;
        config.assert_application_command_permission_mismatch_at.insert(GUILD);
        let slasher = Slasher::new(api.clone(), config);
        slasher.add_command(
            simple("ping")
                .guilds([GUILD])
                .permission_overwrite(GUILD, ApplicationCommandPermissionOverwrite::user(5, false)),
        );

        assert!(slasher.sync().await);
        assert_eq!(api.permission_edits.load(Ordering::SeqCst), 1);

        api.set_team_owned(true);
        let team = Slasher::new(api.clone(), {
            let mut config = SlasherConfig::default();
            config.enforce_application_command_permissions = true;
            config.assert_application_command_permission_mismatch_at.insert(GUILD);
            config
        });
        team.add_command(
            simple("pong")
                .guilds([GUILD])
                .permission_overwrite(GUILD, ApplicationCommandPermissionOverwrite::user(6, false)),
        );
        assert!(team.sync().await);
        assert_eq!(api.permission_edits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permission_mismatch_only_warns_when_not_enforced() {
        let api = Arc::new(MockApi::new());
        let mut config = SlasherConfig::default();
        config.enforce_application_command_permissions = false;
        config.assert_application_command_permission_mismatch_at.insert(GUILD);
        let slasher = Slasher::new(api.clone(), config);
        slasher.add_command(
            simple("ping")
                .guilds([GUILD])
                .permission_overwrite(GUILD, ApplicationCommandPermissionOverwrite::user(5, false)),
        );

        assert!(slasher.sync().await);
        assert_eq!(api.permission_edits.load(Ordering::SeqCst), 0);
        assert!(slasher.is_synced(GUILD));
    }
}
