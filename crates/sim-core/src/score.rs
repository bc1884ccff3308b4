//! Score routing: one shared pool, per-team scores, or per-actor scores,
//! fixed at configuration time. The shared pool is backed by the ledger's
//! global capital, so goal rewards and station capital land in the same
//! place in that mode.

use std::collections::BTreeMap;

use contracts::{LevelScoreAggregate, ScoreMode, MAX_SCORE_DISPLAY_COUNT};

use crate::ledger::ResourceLedger;

#[derive(Debug, Clone)]
pub struct ScoreRouter {
    mode: ScoreMode,
    aggregate: LevelScoreAggregate,
    /// Registration order, for stable display indices in per-actor mode.
    actor_order: Vec<String>,
    team_by_actor: BTreeMap<String, u32>,
    team_scores: BTreeMap<u32, i64>,
    actor_scores: BTreeMap<String, i64>,
}

impl ScoreRouter {
    pub fn new(mode: ScoreMode, aggregate: LevelScoreAggregate) -> Self {
        Self {
            mode,
            aggregate,
            actor_order: Vec::new(),
            team_by_actor: BTreeMap::new(),
            team_scores: BTreeMap::new(),
            actor_scores: BTreeMap::new(),
        }
    }

    pub fn mode(&self) -> ScoreMode {
        self.mode
    }

    /// Register an actor and apply the default assignment for the mode.
    /// Team defaults to 0 when not given.
    pub fn register_actor(&mut self, actor_id: &str, team_id: Option<u32>) {
        if !self.actor_order.iter().any(|id| id == actor_id) {
            self.actor_order.push(actor_id.to_string());
        }
        match self.mode {
            ScoreMode::PerActor => {
                self.actor_scores.entry(actor_id.to_string()).or_insert(0);
            }
            ScoreMode::PerTeam => {
                let team = team_id.unwrap_or(0);
                self.team_by_actor.insert(actor_id.to_string(), team);
                self.team_scores.entry(team).or_insert(0);
            }
            ScoreMode::SharedPool => {}
        }
    }

    pub fn team_id(&self, actor_id: Option<&str>) -> u32 {
        actor_id
            .and_then(|id| self.team_by_actor.get(id).copied())
            .unwrap_or(0)
    }

    pub fn set_team_assignment(&mut self, actor_id: &str, team_id: u32) {
        self.team_by_actor.insert(actor_id.to_string(), team_id);
        if self.mode == ScoreMode::PerTeam {
            self.team_scores.entry(team_id).or_insert(0);
        }
    }

    /// Add score (positive or negative), routed by mode. SharedPool writes
    /// to the ledger's global capital; PerActor drops the amount when no
    /// contributor is known.
    pub fn add_score(&mut self, ledger: &mut ResourceLedger, amount: i64, contributor: Option<&str>) {
        match self.mode {
            ScoreMode::SharedPool => {
                ledger.adjust_global_capital(amount);
            }
            ScoreMode::PerActor => {
                if let Some(actor) = contributor {
                    *self.actor_scores.entry(actor.to_string()).or_insert(0) += amount;
                }
            }
            ScoreMode::PerTeam => {
                let team = self.team_id(contributor);
                *self.team_scores.entry(team).or_insert(0) += amount;
            }
        }
    }

    /// The single score used for results and star brackets.
    pub fn level_score(&self, ledger: &ResourceLedger) -> i64 {
        match self.mode {
            ScoreMode::SharedPool => ledger.global_capital,
            ScoreMode::PerActor => self.actor_scores.values().sum(),
            ScoreMode::PerTeam => match self.aggregate {
                LevelScoreAggregate::SumAll => self.team_scores.values().sum(),
                LevelScoreAggregate::Max => self.team_scores.values().copied().max().unwrap_or(0),
            },
        }
    }

    pub fn team_score(&self, team_id: u32) -> i64 {
        self.team_scores.get(&team_id).copied().unwrap_or(0)
    }

    pub fn actor_score(&self, actor_id: &str) -> i64 {
        self.actor_scores.get(actor_id).copied().unwrap_or(0)
    }

    pub fn ordered_team_ids(&self) -> Vec<u32> {
        self.team_scores.keys().copied().collect()
    }

    /// Number of score slots a front end should show.
    pub fn display_count(&self) -> usize {
        match self.mode {
            ScoreMode::SharedPool => 1,
            ScoreMode::PerActor => {
                if self.actor_order.is_empty() {
                    1
                } else {
                    self.actor_order.len().min(MAX_SCORE_DISPLAY_COUNT)
                }
            }
            ScoreMode::PerTeam => self.ordered_team_ids().len().min(MAX_SCORE_DISPLAY_COUNT).max(1),
        }
    }

    pub fn score_label(&self, index: usize) -> String {
        match self.mode {
            ScoreMode::SharedPool => "Score".to_string(),
            ScoreMode::PerActor => match self.actor_order.get(index) {
                Some(_) => format!("Player {}", index + 1),
                None => format!("Score {}", index + 1),
            },
            ScoreMode::PerTeam => match self.ordered_team_ids().get(index) {
                Some(team) => format!("Team {team}"),
                None => format!("Score {}", index + 1),
            },
        }
    }

    pub fn score_value(&self, index: usize, ledger: &ResourceLedger) -> i64 {
        match self.mode {
            ScoreMode::SharedPool => self.level_score(ledger),
            ScoreMode::PerActor => self
                .actor_order
                .get(index)
                .map(|actor| self.actor_score(actor))
                .unwrap_or(0),
            ScoreMode::PerTeam => self
                .ordered_team_ids()
                .get(index)
                .map(|team| self.team_score(*team))
                .unwrap_or(0),
        }
    }
}
