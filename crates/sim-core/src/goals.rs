//! Time-bounded delivery goals. Templates stay immutable; the tracker
//! instantiates a mutable runtime state per goal and resolves each one
//! terminally exactly once.

use contracts::GoalTemplate;

use crate::ledger::ResourceLedger;
use crate::score::ScoreRouter;

#[derive(Debug, Clone)]
pub struct GoalRuntime {
    pub template: GoalTemplate,
    pub remaining_time: f64,
    pub current_count: u32,
    pub last_contributor: Option<String>,
    completed: bool,
    failed: bool,
}

impl GoalRuntime {
    pub fn from_template(template: &GoalTemplate) -> Self {
        Self {
            template: template.clone(),
            remaining_time: template.time_limit_seconds,
            current_count: 0,
            last_contributor: None,
            completed: false,
            failed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn progress_fraction(&self) -> f64 {
        if self.template.required_count == 0 {
            return 1.0;
        }
        f64::from(self.current_count) / f64::from(self.template.required_count)
    }

    /// Accept one unit of the given type. Returns false when the goal does
    /// not match or is already resolved.
    fn accept(&mut self, resource_id: &str) -> bool {
        if self.completed || self.failed || self.template.resource_id != resource_id {
            return false;
        }
        self.current_count += 1;
        if self.current_count >= self.template.required_count {
            self.completed = true;
        }
        true
    }

    fn tick_time(&mut self, dt: f64) {
        if self.completed || self.failed {
            return;
        }
        self.remaining_time -= dt;
        if self.remaining_time <= 0.0 && self.current_count < self.template.required_count {
            self.failed = true;
        }
    }
}

/// Outcome of one resolved goal, for score routing and logging.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalResolution {
    pub goal_id: String,
    pub resource_id: String,
    pub completed: bool,
    pub points: i64,
    pub contributor: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GoalTracker {
    active: Vec<GoalRuntime>,
}

impl GoalTracker {
    pub fn from_templates(templates: &[GoalTemplate]) -> Self {
        Self {
            active: templates.iter().map(GoalRuntime::from_template).collect(),
        }
    }

    pub fn active(&self) -> &[GoalRuntime] {
        &self.active
    }

    pub fn add_goal(&mut self, template: &GoalTemplate) {
        self.active.push(GoalRuntime::from_template(template));
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Route one unit of `resource_id` to the first unresolved goal that
    /// wants it. First match wins; only one goal advances per call.
    /// Returns the id of the goal that advanced.
    pub fn contribute(&mut self, resource_id: &str, contributor: Option<&str>) -> Option<String> {
        for goal in &mut self.active {
            if goal.accept(resource_id) {
                goal.last_contributor = contributor.map(str::to_string);
                return Some(goal.template.goal_id.clone());
            }
        }
        None
    }

    /// Count down every active goal, then resolve and remove completed and
    /// failed goals, routing reward or penalty through the score router.
    pub fn tick(
        &mut self,
        dt: f64,
        score: &mut ScoreRouter,
        ledger: &mut ResourceLedger,
    ) -> Vec<GoalResolution> {
        for goal in &mut self.active {
            goal.tick_time(dt);
        }

        let mut resolutions = Vec::new();
        let mut index = self.active.len();
        while index > 0 {
            index -= 1;
            let goal = &self.active[index];
            if goal.completed {
                let resolution = GoalResolution {
                    goal_id: goal.template.goal_id.clone(),
                    resource_id: goal.template.resource_id.clone(),
                    completed: true,
                    points: goal.template.reward_points,
                    contributor: goal.last_contributor.clone(),
                };
                score.add_score(
                    ledger,
                    resolution.points,
                    resolution.contributor.as_deref(),
                );
                resolutions.push(resolution);
                self.active.remove(index);
            } else if goal.failed {
                let resolution = GoalResolution {
                    goal_id: goal.template.goal_id.clone(),
                    resource_id: goal.template.resource_id.clone(),
                    completed: false,
                    points: -goal.template.penalty,
                    contributor: None,
                };
                score.add_score(ledger, resolution.points, None);
                resolutions.push(resolution);
                self.active.remove(index);
            }
        }
        resolutions
    }
}
