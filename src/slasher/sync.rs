//! Reconciliation planning
//!
//! Turns a remote listing and the locally desired command sets into the calls
//! one sync pass has to issue.

use std::collections::HashSet;
use std::sync::Arc;

use crate::commands::slash::SlashCommand;
use crate::model::{CommandId, CommandKey, RemoteCommand};

/// Desired commands of one sync target.
#[derive(Debug, Default, Clone)]
pub struct DesiredCommands {
    pub add: Vec<Arc<SlashCommand>>,
    pub keep: Vec<Arc<SlashCommand>>,
    pub remove: Vec<Arc<SlashCommand>>,
    /// Non-global pool, only considered for guild targets.
    pub non_global: Vec<Arc<SlashCommand>>,
}

#[derive(Debug, Default)]
pub struct SyncPlan {
    /// Identical remotely, only needs registering.
    pub matched: Vec<(Arc<SlashCommand>, CommandId)>,
    pub edits: Vec<(Arc<SlashCommand>, CommandId)>,
    /// Left registered remotely, not dispatchable.
    pub kept: Vec<(Arc<SlashCommand>, CommandId)>,
    /// `None` for orphans nothing local knows about.
    pub deletes: Vec<(Option<Arc<SlashCommand>>, CommandId)>,
    pub creates: Vec<Arc<SlashCommand>>,
}

fn claim_by_key<'a>(
    remaining: &mut Vec<&'a RemoteCommand>,
    key: &CommandKey,
) -> Option<&'a RemoteCommand> {
    let position = remaining.iter().position(|remote| &remote.key() == key)?;
    Some(remaining.remove(position))
}

impl SyncPlan {
    pub fn build(remote: &[RemoteCommand], desired: &DesiredCommands) -> Self {
        let mut plan = SyncPlan::default();
        let mut remaining: Vec<&RemoteCommand> = remote.iter().collect();
        let mut pending_add = Vec::new();

        for command in &desired.add {
            let schema = command.schema();
            match remaining.iter().position(|remote| schema.matches(&remote.schema)) {
                Some(position) => {
                    let remote = remaining.remove(position);
                    plan.matched.push((Arc::clone(command), remote.id));
                }
                None => pending_add.push(Arc::clone(command)),
            }
        }

        let shadowed: HashSet<CommandKey> = desired
            .add
            .iter()
            .chain(desired.keep.iter())
            .map(|command| command.key())
            .collect();
        for command in &desired.non_global {
            if shadowed.contains(&command.key()) {
                continue;
            }
            let schema = command.schema();
            if let Some(position) = remaining.iter().position(|remote| schema.matches(&remote.schema)) {
                let remote = remaining.remove(position);
                plan.matched.push((Arc::clone(command), remote.id));
            }
        }

        for command in pending_add {
            match claim_by_key(&mut remaining, &command.key()) {
                Some(remote) => plan.edits.push((command, remote.id)),
                None => plan.creates.push(command),
            }
        }

        for command in &desired.keep {
            if let Some(remote) = claim_by_key(&mut remaining, &command.key()) {
                plan.kept.push((Arc::clone(command), remote.id));
            }
        }

        for command in &desired.remove {
            if let Some(remote) = claim_by_key(&mut remaining, &command.key()) {
                plan.deletes.push((Some(Arc::clone(command)), remote.id));
            }
        }

        plan.deletes
            .extend(remaining.into_iter().map(|remote| (None, remote.id)));
        plan
    }

    /// Whether the pass issues no RPC at all.
    pub fn is_noop(&self) -> bool {
        self.edits.is_empty() && self.deletes.is_empty() && self.creates.is_empty()
    }
}
