//! Permission overwrite comparison
//!
//! Discord reports overwrites that restate the default as if they mattered. The
//! reduction below drops every overwrite that changes nothing, so two lists
//! compare equal when they grant the same access.

use log::warn;
use std::fmt;

use crate::model::{
    ApplicationCommandPermissionOverwrite, CommandId, GuildId, PermissionOverwriteTargetType,
};

pub const PERMISSION_MISMATCH_TARGET: &str = "slasher::permission_mismatch";

/// The `@everyone` role shares its id with the guild.
fn default_role_id(guild_id: GuildId) -> u64 {
    guild_id
}

/// "All channels" is addressed as the guild id minus one.
fn default_channel_id(guild_id: GuildId) -> u64 {
    guild_id.wrapping_sub(1)
}

fn is_default(guild_id: GuildId, overwrite: &ApplicationCommandPermissionOverwrite) -> bool {
    match overwrite.target_type {
        PermissionOverwriteTargetType::Role => overwrite.target_id == default_role_id(guild_id),
        PermissionOverwriteTargetType::Channel => overwrite.target_id == default_channel_id(guild_id),
        PermissionOverwriteTargetType::User => false,
    }
}

/// Keeps only the overwrites diverging from the effective default, sorted.
pub fn reduce_application_command_permission_overwrites(
    guild_id: GuildId,
    overwrites: &[ApplicationCommandPermissionOverwrite],
) -> Vec<ApplicationCommandPermissionOverwrite> {
    let default_for = |target_type: PermissionOverwriteTargetType, default_id: u64| {
        overwrites
            .iter()
            .find(|overwrite| overwrite.target_type == target_type && overwrite.target_id == default_id)
            .map_or(true, |overwrite| overwrite.allow)
    };
    let role_default = default_for(PermissionOverwriteTargetType::Role, default_role_id(guild_id));
    let channel_default =
        default_for(PermissionOverwriteTargetType::Channel, default_channel_id(guild_id));

    let mut reduced: Vec<_> = overwrites
        .iter()
        .filter(|overwrite| {
            if is_default(guild_id, overwrite) {
                return !overwrite.allow;
            }
            match overwrite.target_type {
                PermissionOverwriteTargetType::Channel => overwrite.allow != channel_default,
                PermissionOverwriteTargetType::Role | PermissionOverwriteTargetType::User => {
                    overwrite.allow != role_default
                }
            }
        })
        .copied()
        .collect();
    reduced.sort_unstable();
    reduced.dedup();
    reduced
}

pub fn overwrites_differ(
    guild_id: GuildId,
    expected: &[ApplicationCommandPermissionOverwrite],
    actual: &[ApplicationCommandPermissionOverwrite],
) -> bool {
    reduce_application_command_permission_overwrites(guild_id, expected)
        != reduce_application_command_permission_overwrites(guild_id, actual)
}

/// Diff between the overwrites a command expects and the ones Discord has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionMismatchWarning {
    pub guild_id: GuildId,
    pub command_name: String,
    pub command_id: CommandId,
    pub shared: Vec<ApplicationCommandPermissionOverwrite>,
    /// Present remotely only.
    pub extra: Vec<ApplicationCommandPermissionOverwrite>,
    /// Expected but absent remotely.
    pub missing: Vec<ApplicationCommandPermissionOverwrite>,
}

impl PermissionMismatchWarning {
    pub fn new(
        guild_id: GuildId,
        command_name: impl Into<String>,
        command_id: CommandId,
        expected: &[ApplicationCommandPermissionOverwrite],
        actual: &[ApplicationCommandPermissionOverwrite],
    ) -> Self {
        let expected = reduce_application_command_permission_overwrites(guild_id, expected);
        let actual = reduce_application_command_permission_overwrites(guild_id, actual);

        let shared = expected.iter().filter(|o| actual.contains(o)).copied().collect();
        let extra = actual.iter().filter(|o| !expected.contains(o)).copied().collect();
        let missing = expected.iter().filter(|o| !actual.contains(o)).copied().collect();

        Self {
            guild_id,
            command_name: command_name.into(),
            command_id,
            shared,
            extra,
            missing,
        }
    }

    pub fn is_mismatch(&self) -> bool {
        !self.extra.is_empty() || !self.missing.is_empty()
    }

    /// Logs the diff. Agreeing overwrites log nothing.
    pub fn emit(&self) {
        if self.is_mismatch() {
            warn!(target: PERMISSION_MISMATCH_TARGET, "{self}");
        }
    }
}

fn write_section(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    overwrites: &[ApplicationCommandPermissionOverwrite],
) -> fmt::Result {
    if overwrites.is_empty() {
        return Ok(());
    }
    write!(f, "\n  {title}:")?;
    for overwrite in overwrites {
        let access = if overwrite.allow { "allow" } else { "deny" };
        write!(f, " {} {} {access};", overwrite.target_type, overwrite.target_id)?;
    }
    Ok(())
}

impl fmt::Display for PermissionMismatchWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Permission overwrites of `{}` ({}) in guild {} do not match",
            self.command_name, self.command_id, self.guild_id
        )?;
        write_section(f, "shared", &self.shared)?;
        write_section(f, "extra", &self.extra)?;
        write_section(f, "missing", &self.missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = 700;

    #[test]
    fn test_defaults_that_allow_are_dropped() {
        let overwrites = vec![
            ApplicationCommandPermissionOverwrite::role(GUILD, true),
            ApplicationCommandPermissionOverwrite::channel(GUILD - 1, true),
        ];
        assert!(reduce_application_command_permission_overwrites(GUILD, &overwrites).is_empty());
    }

    #[test]
    fn test_principals_agreeing_with_default_are_dropped() {
        let overwrites = vec![
            ApplicationCommandPermissionOverwrite::role(GUILD, false),
            ApplicationCommandPermissionOverwrite::role(701, false),
            ApplicationCommandPermissionOverwrite::role(702, true),
            ApplicationCommandPermissionOverwrite::user(5, false),
        ];

        assert_eq!(
            reduce_application_command_permission_overwrites(GUILD, &overwrites),
            vec![
                ApplicationCommandPermissionOverwrite::role(GUILD, false),
                ApplicationCommandPermissionOverwrite::role(702, true),
            ]
        );
    }

    #[test]
    fn test_channel_overwrites_follow_channel_default() {
        let overwrites = vec![
            ApplicationCommandPermissionOverwrite::channel(900, true),
            ApplicationCommandPermissionOverwrite::channel(901, false),
        ];

        assert_eq!(
            reduce_application_command_permission_overwrites(GUILD, &overwrites),
            vec![ApplicationCommandPermissionOverwrite::channel(901, false)]
        );
    }

    #[test]
    fn test_equivalent_lists_do_not_differ() {
        let expected = vec![ApplicationCommandPermissionOverwrite::user(5, false)];
        let actual = vec![
            ApplicationCommandPermissionOverwrite::user(5, false),
            ApplicationCommandPermissionOverwrite::role(GUILD, true),
            ApplicationCommandPermissionOverwrite::role(701, true),
        ];

        assert!(!overwrites_differ(GUILD, &expected, &actual));
        assert!(overwrites_differ(GUILD, &expected, &[]));
    }

    #[test]
    fn test_warning_renders_diff() {
        let warning = PermissionMismatchWarning::new(
            GUILD,
            "yuuka",
            1001,
            &[
                ApplicationCommandPermissionOverwrite::user(5, false),
                ApplicationCommandPermissionOverwrite::user(6, false),
            ],
            &[
                ApplicationCommandPermissionOverwrite::user(5, false),
                ApplicationCommandPermissionOverwrite::channel(901, false),
            ],
        );

        assert!(warning.is_mismatch());
        let rendered = warning.to_string();
        assert!(rendered.contains("`yuuka` (1001) in guild 700"));
        assert!(rendered.contains("shared: user 5 deny;"));
        assert!(rendered.contains("extra: channel 901 deny;"));
        assert!(rendered.contains("missing: user 6 deny;"));
    }
}
