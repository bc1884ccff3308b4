use super::*;

use contracts::{EventEffect, GoalAttribution, GoalTemplate};

use crate::policy;

impl SimWorld {
    /// Policies swap wholesale; existing ownership is never migrated and
    /// the new ruleset applies from the next query on.
    pub fn set_policy(&mut self, policy: PolicyConfig) {
        let details = serde_json::to_value(&policy).ok();
        self.policy = policy;
        self.push_event(SimEventType::PolicyChanged, "policy", details);
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Fire a scenario-declared event by id.
    pub fn fire_event(&mut self, event_id: &str) -> Result<(), WorldError> {
        let spec = self
            .config
            .events
            .iter()
            .find(|spec| spec.event_id == event_id)
            .cloned()
            .ok_or_else(|| WorldError::UnknownEvent(event_id.to_string()))?;
        self.apply_fired_event(&spec);
        Ok(())
    }

    /// Fire an ad hoc event that was not declared in the scenario.
    pub fn fire_event_spec(&mut self, spec: EventSpec) {
        self.apply_fired_event(&spec);
    }

    pub(super) fn apply_fired_event(&mut self, spec: &EventSpec) {
        self.modifiers.fire(spec.clone(), self.now);
        self.note_fired_event(spec);
    }

    /// React to an event that is already in the active set. Auto-triggered
    /// events arrive here pre-fired; repeating the fire would register
    /// their effects twice.
    pub(super) fn note_fired_event(&mut self, spec: &EventSpec) {
        // Policy overrides apply immediately; a later expiry does not
        // restore the previous policy.
        for effect in &spec.effects {
            if let EventEffect::ChangePolicy { policy } = effect {
                self.policy = policy.clone();
            }
        }
        self.push_event(
            SimEventType::ModifierFired,
            &spec.event_id,
            Some(json!({ "display_name": spec.display_name })),
        );
    }

    pub fn remove_event(&mut self, event_id: &str) {
        if self.modifiers.is_active(event_id) {
            self.modifiers.remove(event_id);
            self.push_event(
                SimEventType::ModifierExpired,
                event_id,
                Some(json!({ "removed": true })),
            );
        }
    }

    pub fn active_effects(&self) -> Vec<EventEffect> {
        self.modifiers
            .active_effects()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn spawn_resource(
        &mut self,
        resource_id: &str,
        owner: Ownership,
    ) -> Result<String, WorldError> {
        if !self.resource_types.contains_key(resource_id) {
            return Err(WorldError::UnknownResourceType(resource_id.to_string()));
        }
        let instance_id = self.ledger.add_instance(resource_id, owner);
        self.push_event(
            SimEventType::ResourceSpawned,
            &instance_id,
            Some(json!({ "resource_id": resource_id })),
        );
        Ok(instance_id)
    }

    /// An actor claims an instance. Denial is an outcome, not an error;
    /// permitted theft is flagged so penalty hooks can react.
    pub fn take_resource(
        &mut self,
        actor: &str,
        instance_id: &str,
    ) -> Result<TakeOutcome, WorldError> {
        let instance = self
            .ledger
            .instance(instance_id)
            .ok_or_else(|| WorldError::UnknownInstance(instance_id.to_string()))?;
        let owner = instance.owner.clone();
        let resource_id = instance.resource_id.clone();

        if !policy::can_take(&self.policy, Some(actor), &owner) {
            self.push_event(
                SimEventType::StealingDetected,
                instance_id,
                Some(json!({ "actor": actor, "owner": owner.actor(), "permitted": false })),
            );
            return Ok(TakeOutcome::Denied);
        }

        let stealing = policy::is_stealing(Some(actor), &owner);
        self.ledger
            .set_owner(instance_id, Ownership::owned(actor))
            .map_err(|_| WorldError::UnknownInstance(instance_id.to_string()))?;
        self.push_event(
            SimEventType::ResourceTaken,
            instance_id,
            Some(json!({ "actor": actor, "resource_id": resource_id })),
        );
        if stealing {
            self.push_event(
                SimEventType::StealingDetected,
                instance_id,
                Some(json!({ "actor": actor, "owner": owner.actor(), "permitted": true })),
            );
            return Ok(TakeOutcome::TakenAsTheft);
        }
        Ok(TakeOutcome::Taken)
    }

    /// Stage an instance in a station's input area.
    pub fn deposit_resource(
        &mut self,
        station_id: &str,
        instance_id: &str,
    ) -> Result<(), WorldError> {
        if self.ledger.instance(instance_id).is_none() {
            return Err(WorldError::UnknownInstance(instance_id.to_string()));
        }
        let station = self
            .stations
            .get_mut(station_id)
            .ok_or_else(|| WorldError::UnknownStation(station_id.to_string()))?;
        station.deposit_input(instance_id);
        Ok(())
    }

    /// Deliver an instance toward the active goals. The instance is only
    /// consumed when some goal accepts its type; credit routes per the
    /// goal-attribution policy.
    pub fn deliver_to_goal(
        &mut self,
        actor: &str,
        instance_id: &str,
    ) -> Result<Option<String>, WorldError> {
        let instance = self
            .ledger
            .instance(instance_id)
            .ok_or_else(|| WorldError::UnknownInstance(instance_id.to_string()))?;
        let resource_id = instance.resource_id.clone();
        let owner = instance.owner.clone();
        let contributor = self.resolve_contributor(actor, &owner);

        let Some(goal_id) = self.goals.contribute(&resource_id, contributor.as_deref()) else {
            return Ok(None);
        };
        let _ = self.ledger.remove_instance(instance_id);
        self.push_event(
            SimEventType::GoalContribution,
            &goal_id,
            Some(json!({
                "resource_id": resource_id,
                "contributor": contributor,
                "instance_id": instance_id,
            })),
        );
        Ok(Some(goal_id))
    }

    /// Contribute a bare resource type with explicit credit, bypassing the
    /// instance set. Station engines use the same path internally.
    pub fn contribute_goal(
        &mut self,
        resource_id: &str,
        contributor: Option<&str>,
    ) -> Option<String> {
        let goal_id = self.goals.contribute(resource_id, contributor)?;
        self.push_event(
            SimEventType::GoalContribution,
            &goal_id,
            Some(json!({ "resource_id": resource_id, "contributor": contributor })),
        );
        Some(goal_id)
    }

    fn resolve_contributor(&self, deliverer: &str, owner: &Ownership) -> Option<String> {
        let owner_or_deliverer = || {
            owner
                .actor()
                .map(str::to_string)
                .unwrap_or_else(|| deliverer.to_string())
        };
        match self.policy.goal_attribution {
            GoalAttribution::ResourceOwner => Some(owner_or_deliverer()),
            // No station is involved in a hand delivery; credit falls back
            // to the deliverer.
            GoalAttribution::Deliverer | GoalAttribution::StationOwner => {
                Some(deliverer.to_string())
            }
            GoalAttribution::Split => {
                if policy::attribution_share(&self.policy) >= 0.5 {
                    Some(owner_or_deliverer())
                } else {
                    Some(deliverer.to_string())
                }
            }
        }
    }

    pub fn add_goal(&mut self, template: &GoalTemplate) {
        self.goals.add_goal(template);
    }

    pub fn clear_goals(&mut self) {
        self.goals.clear();
    }

    /// Start laboring at a station. Returns whether the station-use policy
    /// permitted it.
    pub fn register_worker(
        &mut self,
        actor: &str,
        station_id: &str,
    ) -> Result<bool, WorldError> {
        let station = self
            .stations
            .get_mut(station_id)
            .ok_or_else(|| WorldError::UnknownStation(station_id.to_string()))?;
        if !policy::can_use_station(&self.policy, Some(actor), station.owner()) {
            return Ok(false);
        }
        station.register_worker(actor);
        Ok(true)
    }

    pub fn unregister_worker(&mut self, actor: &str, station_id: &str) -> Result<(), WorldError> {
        let station = self
            .stations
            .get_mut(station_id)
            .ok_or_else(|| WorldError::UnknownStation(station_id.to_string()))?;
        station.unregister_worker(actor);
        Ok(())
    }
}
