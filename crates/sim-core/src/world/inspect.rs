use super::*;

impl SimWorld {
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn goals(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn score(&self) -> &ScoreRouter {
        &self.score
    }

    pub fn station(&self, station_id: &str) -> Option<&StationEngine> {
        self.stations.get(station_id)
    }

    pub fn stations(&self) -> impl Iterator<Item = &StationEngine> {
        self.stations.values()
    }

    pub fn resource_count(&self, resource_id: &str, owner: Option<&str>) -> usize {
        self.ledger.count_by_type(resource_id, owner, &self.policy)
    }

    pub fn level_score(&self) -> i64 {
        self.score.level_score(&self.ledger)
    }

    pub fn actor_capital(&self, actor_id: &str) -> i64 {
        self.ledger.actor_capital(actor_id)
    }

    /// The capped label/value rows a score display would render.
    pub fn scoreboard(&self) -> Vec<(String, i64)> {
        (0..self.score.display_count())
            .map(|index| {
                (
                    self.score.score_label(index),
                    self.score.score_value(index, &self.ledger),
                )
            })
            .collect()
    }

    pub fn inspect_station(&self, station_id: &str) -> Option<Value> {
        self.stations.get(station_id).map(|station| {
            json!({
                "station_id": station.station_id(),
                "config_id": station.config().config_id,
                "owner": station.owner().actor(),
                "is_alive": station.is_alive(),
                "decay_value": station.decay_value(),
                "work_progress": station.work_progress_fraction(),
                "workers": station.workers(),
                "age": station.age(),
                "input_buffer": station.input_buffer(),
            })
        })
    }

    pub fn inspect_goals(&self) -> Value {
        let rows = self
            .goals
            .active()
            .iter()
            .map(|goal| {
                json!({
                    "goal_id": goal.template.goal_id,
                    "resource_id": goal.template.resource_id,
                    "current_count": goal.current_count,
                    "required_count": goal.template.required_count,
                    "remaining_time": goal.remaining_time,
                    "progress": goal.progress_fraction(),
                })
            })
            .collect::<Vec<_>>();
        json!({ "active": rows })
    }

    /// Count of log records per event type, for end-of-run summaries.
    pub fn event_tally(&self) -> BTreeMap<String, usize> {
        let mut tally = BTreeMap::new();
        for event in &self.event_log {
            let key = serde_json::to_value(event.event_type)
                .ok()
                .and_then(|value| value.as_str().map(str::to_string))
                .unwrap_or_else(|| format!("{:?}", event.event_type));
            *tally.entry(key).or_insert(0) += 1;
        }
        tally
    }
}
