//! Health conditions: yearly diagnosis roll from an age-bucketed
//! probability table, recovery of non-chronic conditions, treatment.
//!
//! Execution: every turn, including in custody.

use crate::{
    balancer::StatBalancer,
    character::Character,
    config::HealthConfig,
    event::{Chronicle, SimEvent},
    rng::{RandomSource, SubsystemSlot},
    selector::weighted_pick,
    stats::{Stat, StatEffects},
    subsystem::{ActionResult, LifeSubsystem},
    types::Age,
};
use serde::{Deserialize, Serialize};

/// Authored definition of a diagnosable condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub min_age: Age,
    #[serde(default = "default_max_age")]
    pub max_age: Age,
    #[serde(default = "default_weight")]
    pub weight: f64,
    pub health_delta: i64,
    pub happiness_delta: i64,
    #[serde(default)]
    pub chronic: bool,
    #[serde(default)]
    pub recovery_chance: f64,
    /// Cost of one treatment attempt, in thousands.
    pub treatment_cost: i64,
}

fn default_max_age() -> Age {
    Age::MAX
}

fn default_weight() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub id: String,
    pub name: String,
    pub diagnosed_at: Age,
    pub chronic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthAction {
    TreatCondition { condition_id: String },
}

pub struct HealthSubsystem {
    config: HealthConfig,
    conditions: Vec<ConditionDef>,
}

impl HealthSubsystem {
    pub fn new(config: HealthConfig, conditions: Vec<ConditionDef>) -> Self {
        Self { config, conditions }
    }

    fn definition(&self, id: &str) -> Option<&ConditionDef> {
        self.conditions.iter().find(|c| c.id == id)
    }

    pub fn apply_action(
        &self,
        character: &mut Character,
        action: HealthAction,
        rng: &mut dyn RandomSource,
    ) -> ActionResult {
        let HealthAction::TreatCondition { condition_id } = action;
        let Some(index) = character.conditions.iter().position(|c| c.id == condition_id) else {
            return ActionResult::rejected("You don't have that condition.");
        };
        let cost = self.definition(&condition_id).map(|d| d.treatment_cost).unwrap_or(0);
        if character.stat(Stat::Wealth) < cost {
            return ActionResult::rejected(format!("You can't afford the {cost}k treatment."));
        }

        let mut log = Chronicle::new();
        StatBalancer::apply(character, &StatEffects::new().with(Stat::Wealth, -cost).with(Stat::Health, 5));
        let name = character.conditions[index].name.clone();
        if rng.chance(self.config.treatment_cure_chance) {
            character.conditions.remove(index);
            log.narrate(format!("The treatment worked. You are cured of {name}."));
            log.emit(self.name(), SimEvent::ConditionCured { age: character.age(), condition_id });
        } else {
            log.narrate(format!("The treatment for {name} didn't take."));
        }
        ActionResult::Applied(log)
    }

    fn recover(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let age = character.age();
        let mut kept = Vec::with_capacity(character.conditions.len());
        for condition in std::mem::take(&mut character.conditions) {
            let chance = if condition.chronic {
                0.0
            } else {
                self.definition(&condition.id).map(|d| d.recovery_chance).unwrap_or(0.5)
            };
            if chance > 0.0 && rng.chance(chance) {
                log.narrate(format!("You recovered from {}.", condition.name));
                log.emit(self.name(), SimEvent::ConditionCured { age, condition_id: condition.id });
            } else {
                kept.push(condition);
            }
        }
        character.conditions = kept;
    }

    fn diagnose(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let age = character.age();
        let p = self
            .config
            .diagnosis_probability
            .get(&character.life_stage())
            .copied()
            .unwrap_or(0.0);
        if !rng.chance(p) {
            return;
        }

        let candidates: Vec<(&ConditionDef, f64)> = self
            .conditions
            .iter()
            .filter(|d| (d.min_age..=d.max_age).contains(&age))
            .filter(|d| !character.conditions.iter().any(|c| c.id == d.id))
            .map(|d| (d, d.weight))
            .collect();
        let Some(def) = weighted_pick(&candidates, rng).copied() else {
            return;
        };

        StatBalancer::apply(
            character,
            &StatEffects::new()
                .with(Stat::Health, def.health_delta)
                .with(Stat::Happiness, def.happiness_delta),
        );
        character.conditions.push(ActiveCondition {
            id: def.id.clone(),
            name: def.name.clone(),
            diagnosed_at: age,
            chronic: def.chronic,
        });
        log.narrate(format!("You were diagnosed with {}.", def.name));
        log.emit(self.name(), SimEvent::ConditionDiagnosed { age, condition_id: def.id.clone() });
        log::debug!("age={age} health: diagnosed {}", def.id);
    }
}

impl LifeSubsystem for HealthSubsystem {
    fn name(&self) -> &'static str {
        "health"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Health
    }

    fn runs_in_custody(&self) -> bool {
        true
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        if !character.conditions.is_empty() {
            self.recover(character, rng, log);
        }
        self.diagnose(character, rng, log);
    }
}
