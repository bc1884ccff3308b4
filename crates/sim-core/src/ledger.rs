//! Resource and capital ledger: the set of live resource instances plus
//! the global capital pool and per-actor capital balances.
//!
//! Capital is unchecked in both directions; balances may go negative
//! because no operation in the source economy gates on funds.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{Ownership, OwnershipModel, PolicyConfig, ResourceBehavior, ResourceTypeDef};

use crate::policy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    UnknownInstance(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::UnknownInstance(id) => write!(f, "unknown resource instance: {id}"),
        }
    }
}

/// One live unit of a resource type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInstance {
    pub instance_id: String,
    pub resource_id: String,
    pub amount: u32,
    pub owner: Ownership,
    pub age_seconds: f64,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceLedger {
    /// Keyed by zero-padded sequence ids, so iteration order is creation
    /// order.
    instances: BTreeMap<String, ResourceInstance>,
    next_sequence: u64,
    pub global_capital: i64,
    actor_capital: BTreeMap<String, i64>,
}

impl ResourceLedger {
    pub fn new(initial_capital: i64) -> Self {
        Self {
            global_capital: initial_capital,
            ..Self::default()
        }
    }

    /// Create a live instance and return its id.
    pub fn add_instance(&mut self, resource_id: &str, owner: Ownership) -> String {
        self.next_sequence += 1;
        let instance_id = format!("res:{:08}", self.next_sequence);
        self.instances.insert(
            instance_id.clone(),
            ResourceInstance {
                instance_id: instance_id.clone(),
                resource_id: resource_id.to_string(),
                amount: 1,
                owner,
                age_seconds: 0.0,
            },
        );
        instance_id
    }

    pub fn remove_instance(&mut self, instance_id: &str) -> Result<ResourceInstance, LedgerError> {
        self.instances
            .remove(instance_id)
            .ok_or_else(|| LedgerError::UnknownInstance(instance_id.to_string()))
    }

    /// Remove one candidate instance per required type. All-or-nothing:
    /// unless every requirement matches a distinct candidate of its type,
    /// nothing is removed and None is returned. Matched ids are also
    /// dropped from the candidate list.
    pub fn take_matching(
        &mut self,
        required: &[String],
        candidates: &mut Vec<String>,
    ) -> Option<Vec<ResourceInstance>> {
        let mut chosen: Vec<String> = Vec::new();
        for resource_id in required {
            let matched = candidates.iter().find(|id| {
                !chosen.contains(*id)
                    && self
                        .instances
                        .get(*id)
                        .map(|instance| &instance.resource_id == resource_id)
                        .unwrap_or(false)
            })?;
            chosen.push(matched.clone());
        }
        let mut removed = Vec::new();
        for instance_id in &chosen {
            if let Some(instance) = self.instances.remove(instance_id) {
                removed.push(instance);
            }
            candidates.retain(|candidate| candidate != instance_id);
        }
        Some(removed)
    }

    pub fn instance(&self, instance_id: &str) -> Option<&ResourceInstance> {
        self.instances.get(instance_id)
    }

    pub fn instances(&self) -> impl Iterator<Item = &ResourceInstance> {
        self.instances.values()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn set_owner(&mut self, instance_id: &str, owner: Ownership) -> Result<(), LedgerError> {
        let instance = self
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| LedgerError::UnknownInstance(instance_id.to_string()))?;
        instance.owner = owner;
        Ok(())
    }

    /// Count live instances of a type. With an explicit owner the match is
    /// exact. With no owner the scope depends on the active policy: under
    /// a non-communal ownership model only unowned instances count;
    /// communal counts everything.
    pub fn count_by_type(
        &self,
        resource_id: &str,
        owner: Option<&str>,
        policy: &PolicyConfig,
    ) -> usize {
        self.instances
            .values()
            .filter(|instance| instance.resource_id == resource_id)
            .filter(|instance| match owner {
                Some(actor) => instance.owner.actor() == Some(actor),
                None => policy::counts_all_owners(policy) || instance.owner.is_unowned(),
            })
            .count()
    }

    /// Per-type counts under the same scoping rule as [`count_by_type`].
    pub fn all_counts(
        &self,
        owner: Option<&str>,
        policy: &PolicyConfig,
    ) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for instance in self.instances.values() {
            let in_scope = match owner {
                Some(actor) => instance.owner.actor() == Some(actor),
                None => policy::counts_all_owners(policy) || instance.owner.is_unowned(),
            };
            if in_scope {
                *counts.entry(instance.resource_id.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn actor_capital(&self, actor_id: &str) -> i64 {
        self.actor_capital.get(actor_id).copied().unwrap_or(0)
    }

    pub fn adjust_actor_capital(&mut self, actor_id: &str, delta: i64) -> i64 {
        let balance = self.actor_capital.entry(actor_id.to_string()).or_insert(0);
        *balance += delta;
        *balance
    }

    pub fn adjust_global_capital(&mut self, delta: i64) -> i64 {
        self.global_capital += delta;
        self.global_capital
    }

    /// Age decaying instances and remove the ones past their lifespan.
    /// `decay_factor` scales the aging rate. Returns the removed
    /// instances in creation order.
    pub fn tick_decay(
        &mut self,
        dt: f64,
        catalog: &BTreeMap<String, ResourceTypeDef>,
        decay_factor: f64,
    ) -> Vec<ResourceInstance> {
        let mut expired_ids = Vec::new();
        for instance in self.instances.values_mut() {
            let lifespan = match catalog.get(&instance.resource_id).map(|def| &def.behavior) {
                Some(ResourceBehavior::Decays { lifespan_seconds }) => *lifespan_seconds,
                _ => continue,
            };
            instance.age_seconds += dt * decay_factor.max(0.0);
            if instance.age_seconds > lifespan {
                expired_ids.push(instance.instance_id.clone());
            }
        }
        expired_ids
            .iter()
            .filter_map(|id| self.instances.remove(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PolicyConfig;

    fn decaying_catalog(lifespan: f64) -> BTreeMap<String, ResourceTypeDef> {
        let mut catalog = BTreeMap::new();
        catalog.insert(
            "berry".to_string(),
            ResourceTypeDef {
                resource_id: "berry".to_string(),
                display_name: "Berry".to_string(),
                icon: None,
                behavior: ResourceBehavior::Decays {
                    lifespan_seconds: lifespan,
                },
            },
        );
        catalog
    }

    #[test]
    fn counting_scope_follows_ownership_model() {
        let mut ledger = ResourceLedger::default();
        ledger.add_instance("wood", Ownership::Unowned);
        ledger.add_instance("wood", Ownership::owned("player:a"));
        ledger.add_instance("wood", Ownership::owned("player:b"));
        ledger.add_instance("stone", Ownership::Unowned);

        let mut policy = PolicyConfig::default();
        assert_eq!(ledger.count_by_type("wood", None, &policy), 1);
        assert_eq!(ledger.count_by_type("wood", Some("player:a"), &policy), 1);

        policy.ownership_model = OwnershipModel::Communal;
        assert_eq!(ledger.count_by_type("wood", None, &policy), 3);
        assert_eq!(ledger.count_by_type("stone", None, &policy), 1);
    }

    #[test]
    fn all_counts_groups_by_type() {
        let mut ledger = ResourceLedger::default();
        ledger.add_instance("wood", Ownership::Unowned);
        ledger.add_instance("wood", Ownership::Unowned);
        ledger.add_instance("stone", Ownership::owned("player:a"));

        let policy = PolicyConfig::default();
        let counts = ledger.all_counts(None, &policy);
        assert_eq!(counts.get("wood"), Some(&2));
        assert_eq!(counts.get("stone"), None);

        let owned = ledger.all_counts(Some("player:a"), &policy);
        assert_eq!(owned.get("stone"), Some(&1));
    }

    #[test]
    fn remove_unknown_instance_is_an_error() {
        let mut ledger = ResourceLedger::default();
        let err = ledger.remove_instance("res:missing").unwrap_err();
        assert_eq!(err, LedgerError::UnknownInstance("res:missing".to_string()));
    }

    #[test]
    fn capital_may_go_negative() {
        let mut ledger = ResourceLedger::new(5);
        assert_eq!(ledger.adjust_global_capital(-10), -5);
        assert_eq!(ledger.adjust_actor_capital("player:a", -3), -3);
        assert_eq!(ledger.actor_capital("player:a"), -3);
    }

    #[test]
    fn take_matching_is_all_or_nothing() {
        let mut ledger = ResourceLedger::default();
        let wood = ledger.add_instance("wood", Ownership::Unowned);
        let stone = ledger.add_instance("stone", Ownership::Unowned);
        let mut candidates = vec![wood.clone(), stone.clone()];

        let required = vec!["wood".to_string(), "wood".to_string()];
        assert!(ledger.take_matching(&required, &mut candidates).is_none());
        assert_eq!(ledger.len(), 2);
        assert_eq!(candidates.len(), 2);

        let required = vec!["wood".to_string(), "stone".to_string()];
        let removed = ledger.take_matching(&required, &mut candidates).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(ledger.is_empty());
        assert!(candidates.is_empty());
    }

    #[test]
    fn decay_expires_instances_past_lifespan() {
        let mut ledger = ResourceLedger::default();
        let catalog = decaying_catalog(2.0);
        ledger.add_instance("berry", Ownership::Unowned);

        assert!(ledger.tick_decay(1.0, &catalog, 1.0).is_empty());
        assert!(ledger.tick_decay(1.0, &catalog, 1.0).is_empty());
        let expired = ledger.tick_decay(0.5, &catalog, 1.0);
        assert_eq!(expired.len(), 1);
        assert!(ledger.is_empty());
    }

    #[test]
    fn decay_factor_scales_aging() {
        let mut ledger = ResourceLedger::default();
        let catalog = decaying_catalog(2.0);
        ledger.add_instance("berry", Ownership::Unowned);

        let expired = ledger.tick_decay(1.1, &catalog, 2.0);
        assert_eq!(expired.len(), 1);
    }
}
