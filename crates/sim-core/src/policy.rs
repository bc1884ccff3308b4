//! Pure policy decision functions over the active [`PolicyConfig`].
//!
//! Every query resolves to a boolean or a fraction; policy violations are
//! denials, never errors. Callers decide how to surface a denial.

use contracts::{Ownership, OwnershipModel, PolicyConfig, StationUsePolicy, StealingPolicy};

/// Whether an owner-less count query spans every instance. Only the
/// communal model treats owned property as part of the commons.
pub fn counts_all_owners(policy: &PolicyConfig) -> bool {
    policy.ownership_model == OwnershipModel::Communal
}

/// Whether `actor` may take a resource currently held under `owner`.
/// Unowned resources are always takeable; an anonymous actor can never
/// take owned property.
pub fn can_take(policy: &PolicyConfig, actor: Option<&str>, owner: &Ownership) -> bool {
    let current_owner = match owner.actor() {
        None => return true,
        Some(id) => id,
    };
    let actor = match actor {
        None => return false,
        Some(id) => id,
    };
    if actor == current_owner {
        return true;
    }
    match policy.stealing_policy {
        StealingPolicy::Allowed | StealingPolicy::Penalized => true,
        StealingPolicy::Disallowed => false,
    }
}

/// Whether the take would count as stealing, independent of whether it is
/// permitted. Used to decide when a penalty hook should fire.
pub fn is_stealing(actor: Option<&str>, owner: &Ownership) -> bool {
    match (actor, owner.actor()) {
        (Some(actor), Some(current_owner)) => actor != current_owner,
        _ => false,
    }
}

/// Whether `actor` may operate a station owned by `station_owner`.
/// SameTeam degrades to owner-equality until a team-id concept reaches the
/// policy layer.
pub fn can_use_station(
    policy: &PolicyConfig,
    actor: Option<&str>,
    station_owner: &Ownership,
) -> bool {
    match policy.station_use_policy {
        StationUsePolicy::OwnerOnly => match station_owner.actor() {
            None => true,
            Some(owner) => actor == Some(owner),
        },
        StationUsePolicy::SameTeam => match station_owner.actor() {
            None => true,
            Some(owner) => match actor {
                None => false,
                Some(actor) => actor == owner,
            },
        },
        StationUsePolicy::Anyone | StationUsePolicy::AnyoneWithFee => true,
    }
}

/// Owner's share of goal credit, clamped to 0..1. Only meaningful when
/// `goal_attribution` is `Split`.
pub fn attribution_share(policy: &PolicyConfig) -> f64 {
    policy.attribution_owner_share.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::GoalAttribution;

    fn policy_with_stealing(stealing: StealingPolicy) -> PolicyConfig {
        PolicyConfig {
            stealing_policy: stealing,
            ..PolicyConfig::default()
        }
    }

    #[test]
    fn unowned_is_always_takeable() {
        let policy = policy_with_stealing(StealingPolicy::Disallowed);
        assert!(can_take(&policy, Some("player:b"), &Ownership::Unowned));
        assert!(can_take(&policy, None, &Ownership::Unowned));
    }

    #[test]
    fn disallowed_blocks_foreign_take_but_not_own() {
        let policy = policy_with_stealing(StealingPolicy::Disallowed);
        let owned = Ownership::owned("player:a");
        assert!(!can_take(&policy, Some("player:b"), &owned));
        assert!(can_take(&policy, Some("player:a"), &owned));
    }

    #[test]
    fn penalized_take_is_permitted_and_flagged() {
        let policy = policy_with_stealing(StealingPolicy::Penalized);
        let owned = Ownership::owned("player:a");
        assert!(can_take(&policy, Some("player:b"), &owned));
        assert!(is_stealing(Some("player:b"), &owned));
        assert!(!is_stealing(Some("player:a"), &owned));
        assert!(!is_stealing(None, &owned));
        assert!(!is_stealing(Some("player:b"), &Ownership::Unowned));
    }

    #[test]
    fn owner_only_station_use() {
        let policy = PolicyConfig {
            station_use_policy: StationUsePolicy::OwnerOnly,
            ..PolicyConfig::default()
        };
        let owned = Ownership::owned("player:a");
        assert!(can_use_station(&policy, Some("player:a"), &owned));
        assert!(!can_use_station(&policy, Some("player:b"), &owned));
        assert!(can_use_station(&policy, Some("player:b"), &Ownership::Unowned));
    }

    #[test]
    fn same_team_degrades_to_owner_equality() {
        let policy = PolicyConfig {
            station_use_policy: StationUsePolicy::SameTeam,
            ..PolicyConfig::default()
        };
        let owned = Ownership::owned("player:a");
        assert!(can_use_station(&policy, Some("player:a"), &owned));
        assert!(!can_use_station(&policy, Some("player:b"), &owned));
        assert!(!can_use_station(&policy, None, &owned));
    }

    #[test]
    fn attribution_share_is_clamped() {
        let mut policy = PolicyConfig {
            goal_attribution: GoalAttribution::Split,
            attribution_owner_share: 1.4,
            ..PolicyConfig::default()
        };
        assert_eq!(attribution_share(&policy), 1.0);
        policy.attribution_owner_share = -0.2;
        assert_eq!(attribution_share(&policy), 0.0);
        policy.attribution_owner_share = 0.7;
        assert_eq!(attribution_share(&policy), 0.7);
    }
}
