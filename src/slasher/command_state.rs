//! Per sync target command bookkeeping
//!
//! Commands live in one of three places: `active` (registered or about to be,
//! dispatchable), `kept` (removed locally but left registered remotely) and a
//! stream of pending changes replayed in order on top of them.

use std::sync::Arc;

use crate::commands::slash::{SlashCommand, UnloadingBehaviour};
use crate::model::CommandKey;

#[derive(Debug, Clone)]
pub struct CommandChange {
    pub added: bool,
    pub command: Arc<SlashCommand>,
}

impl CommandChange {
    fn key(&self) -> CommandKey {
        self.command.key()
    }
}

/// Where an [`add`](CommandState::add) or [`remove`](CommandState::remove) landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStateIdentifier {
    Active,
    Kept,
    Added,
    Removed,
    NonGlobal,
}

#[derive(Debug, Default)]
pub struct CommandState {
    is_non_global: bool,
    active: Vec<Arc<SlashCommand>>,
    kept: Vec<Arc<SlashCommand>>,
    changes: Vec<CommandChange>,
}

fn take_key(commands: &mut Vec<Arc<SlashCommand>>, key: &CommandKey) -> Option<Arc<SlashCommand>> {
    let position = commands.iter().position(|command| &command.key() == key)?;
    Some(commands.remove(position))
}

impl CommandState {
    pub fn new(is_non_global: bool) -> Self {
        Self {
            is_non_global,
            ..Self::default()
        }
    }

    pub fn is_non_global(&self) -> bool {
        self.is_non_global
    }

    pub fn active(&self) -> &[Arc<SlashCommand>] {
        &self.active
    }

    pub fn kept(&self) -> &[Arc<SlashCommand>] {
        &self.kept
    }

    pub fn changes(&self) -> &[CommandChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.kept.is_empty() && self.changes.is_empty()
    }

    /// Returns the command now representing the key and where it landed. For
    /// `Active` and `Kept` the returned command is the equal one already known,
    /// whose registration carries over to `command`.
    pub fn add(&mut self, command: Arc<SlashCommand>) -> (Arc<SlashCommand>, CommandStateIdentifier) {
        let key = command.key();

        if self.is_non_global {
            take_key(&mut self.active, &key);
            self.active.push(Arc::clone(&command));
            return (command, CommandStateIdentifier::NonGlobal);
        }

        let mut existing = None;
        if let Some(kept) = take_key(&mut self.kept, &key) {
            if *kept == *command {
                existing = Some((kept, CommandStateIdentifier::Kept));
            }
        }
        if let Some(active) = take_key(&mut self.active, &key) {
            if existing.is_none() && *active == *command {
                existing = Some((active, CommandStateIdentifier::Active));
            }
        }
        self.changes.retain(|change| change.key() != key);

        if let Some(existing) = existing {
            self.active.push(command);
            return existing;
        }

        self.changes.push(CommandChange {
            added: true,
            command: Arc::clone(&command),
        });
        (command, CommandStateIdentifier::Added)
    }

    pub fn remove(
        &mut self,
        command: &Arc<SlashCommand>,
        slasher_behaviour: UnloadingBehaviour,
    ) -> CommandStateIdentifier {
        let key = command.key();

        if self.is_non_global {
            take_key(&mut self.active, &key);
            return CommandStateIdentifier::NonGlobal;
        }

        match command.get_unloading_behaviour().resolve(slasher_behaviour) {
            UnloadingBehaviour::Keep => {
                let pending = self
                    .changes
                    .iter()
                    .rev()
                    .find(|change| change.added && change.key() == key)
                    .map(|change| Arc::clone(&change.command));
                self.changes.retain(|change| change.key() != key);
                // a pending add may already exist remotely, e.g. after a restart
                if let Some(kept) = take_key(&mut self.active, &key).or(pending) {
                    take_key(&mut self.kept, &key);
                    self.kept.push(kept);
                }
                CommandStateIdentifier::Kept
            }
            _ => {
                self.changes.retain(|change| change.key() != key);
                let registered = self
                    .active
                    .iter()
                    .chain(self.kept.iter())
                    .find(|known| known.key() == key)
                    .cloned();
                if let Some(registered) = registered {
                    take_key(&mut self.kept, &key);
                    self.changes.push(CommandChange {
                        added: false,
                        command: registered,
                    });
                }
                CommandStateIdentifier::Removed
            }
        }
    }

    /// Commands that should be registered once every pending change applies.
    pub fn should_add_commands(&self) -> Vec<Arc<SlashCommand>> {
        let mut commands = self.active.clone();
        for change in &self.changes {
            let key = change.key();
            commands.retain(|command| command.key() != key);
            if change.added {
                commands.push(Arc::clone(&change.command));
            }
        }
        commands
    }

    pub fn should_keep_commands(&self) -> Vec<Arc<SlashCommand>> {
        self.kept.clone()
    }

    pub fn should_remove_commands(&self) -> Vec<Arc<SlashCommand>> {
        let mut commands: Vec<Arc<SlashCommand>> = Vec::new();
        for change in &self.changes {
            let key = change.key();
            commands.retain(|command| command.key() != key);
            if !change.added {
                commands.push(Arc::clone(&change.command));
            }
        }
        commands
    }

    /// Drains the kept bucket. A second call yields nothing.
    pub fn exhaust_kept_commands(&mut self) -> Vec<Arc<SlashCommand>> {
        std::mem::take(&mut self.kept)
    }

    /// Turns every kept command into a pending removal. Returns how many.
    pub fn discard_kept(&mut self) -> usize {
        let kept = self.exhaust_kept_commands();
        let count = kept.len();
        for command in kept {
            let key = command.key();
            self.changes.retain(|change| change.key() != key);
            self.changes.push(CommandChange {
                added: false,
                command,
            });
        }
        count
    }

    /// Folds changes a sync has applied remotely into the buckets. Changes
    /// superseded since the sync snapshot was taken are skipped.
    pub fn collapse_changes(&mut self, applied: &[CommandChange]) {
        for applied in applied {
            let Some(position) = self.changes.iter().position(|change| {
                change.added == applied.added && Arc::ptr_eq(&change.command, &applied.command)
            }) else {
                continue;
            };

            let change = self.changes.remove(position);
            let key = change.key();
            take_key(&mut self.active, &key);
            if change.added {
                self.active.push(change.command);
            } else {
                take_key(&mut self.kept, &key);
            }
        }
    }
}
