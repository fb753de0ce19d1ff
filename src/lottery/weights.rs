//! Role-based ticket weights.
//!
//! Pure functions computing each participant's effective multiplier from the
//! guild configuration, optional per-call overrides, and the roles the
//! participant holds.

use std::collections::HashMap;

use crate::types::{GiveawayConfig, RoleId, RoleMultiplier};

/// The weight of a participant with no weighted roles.
pub const DEFAULT_MULTIPLIER: u32 = 1;

/// Builds the effective role→multiplier table.
///
/// Guild configuration contributes only when `enabled`; overrides replace
/// the configured multiplier for an identical role (and stand alone for
/// roles the configuration does not mention).
pub fn merged_table(
    config: Option<&GiveawayConfig>,
    overrides: Option<&[RoleMultiplier]>,
) -> HashMap<RoleId, u32> {
    let mut table = HashMap::new();

    if let Some(config) = config
        && config.enabled
    {
        for entry in &config.role_multipliers {
            table.insert(entry.role, entry.multiplier);
        }
    }

    if let Some(overrides) = overrides {
        for entry in overrides {
            table.insert(entry.role, entry.multiplier);
        }
    }

    table
}

/// Computes the effective multiplier for a participant holding `roles`.
///
/// The result is the **maximum** multiplier across held roles, not the sum:
/// holding roles weighted 2 and 5 gives weight 5, not 7. Every participant
/// weighs at least [`DEFAULT_MULTIPLIER`], so a configured multiplier of 0
/// cannot exclude anyone.
pub fn effective_multiplier(roles: &[RoleId], table: &HashMap<RoleId, u32>) -> u32 {
    roles
        .iter()
        .filter_map(|role| table.get(role).copied())
        .fold(DEFAULT_MULTIPLIER, u32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, entries: &[(u64, u32)]) -> GiveawayConfig {
        GiveawayConfig {
            enabled,
            role_multipliers: entries
                .iter()
                .map(|&(role, multiplier)| RoleMultiplier::new(RoleId(role), multiplier))
                .collect(),
        }
    }

    #[test]
    fn no_config_means_default_weight() {
        let table = merged_table(None, None);
        assert_eq!(effective_multiplier(&[RoleId(1)], &table), 1);
        assert_eq!(effective_multiplier(&[], &table), 1);
    }

    #[test]
    fn disabled_config_contributes_nothing() {
        let config = config(false, &[(1, 5)]);
        let table = merged_table(Some(&config), None);
        assert_eq!(effective_multiplier(&[RoleId(1)], &table), 1);
    }

    #[test]
    fn max_across_roles_not_sum() {
        let config = config(true, &[(1, 2), (2, 5)]);
        let table = merged_table(Some(&config), None);
        assert_eq!(effective_multiplier(&[RoleId(1), RoleId(2)], &table), 5);
    }

    #[test]
    fn unweighted_roles_are_ignored() {
        let config = config(true, &[(1, 3)]);
        let table = merged_table(Some(&config), None);
        assert_eq!(effective_multiplier(&[RoleId(1), RoleId(9)], &table), 3);
    }

    #[test]
    fn override_replaces_configured_multiplier() {
        let config = config(true, &[(1, 2)]);
        let overrides = [RoleMultiplier::new(RoleId(1), 10)];
        let table = merged_table(Some(&config), Some(&overrides));
        assert_eq!(effective_multiplier(&[RoleId(1)], &table), 10);
    }

    #[test]
    fn override_applies_to_unconfigured_role() {
        let overrides = [RoleMultiplier::new(RoleId(7), 4)];
        let table = merged_table(None, Some(&overrides));
        assert_eq!(effective_multiplier(&[RoleId(7)], &table), 4);
    }

    #[test]
    fn zero_multiplier_cannot_exclude() {
        let config = config(true, &[(1, 0)]);
        let table = merged_table(Some(&config), None);
        assert_eq!(effective_multiplier(&[RoleId(1)], &table), 1);
    }
}
