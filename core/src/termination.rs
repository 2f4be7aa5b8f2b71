//! End-of-life predicate.
//!
//! Checked once per turn after everything else. Evaluation is pure;
//! `finalize` applies the outcome.

use crate::{
    balancer::StatBalancer,
    character::{Character, DeathCause, GameOver, LifeStage},
    config::TerminationConfig,
    event::{Chronicle, SimEvent},
    prison_subsystem::CustodyState,
    rng::RandomSource,
    stats::Stat,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationCheck {
    pub game_over: bool,
    pub cause: Option<DeathCause>,
    /// Survival chance of a health collapse, when one was rolled.
    pub survival_chance: Option<f64>,
}

impl TerminationCheck {
    fn alive(survival_chance: Option<f64>) -> Self {
        Self { game_over: false, cause: None, survival_chance }
    }

    fn dead(cause: DeathCause, survival_chance: Option<f64>) -> Self {
        Self { game_over: true, cause: Some(cause), survival_chance }
    }

    /// A collapse was rolled and survived.
    pub fn revived(&self) -> bool {
        !self.game_over && self.survival_chance.is_some()
    }
}

/// Chance of surviving a collapse to zero health.
pub fn survival_chance(config: &TerminationConfig, character: &Character) -> f64 {
    let mut chance = match character.life_stage() {
        LifeStage::Baby | LifeStage::Toddler | LifeStage::Child | LifeStage::Teen => config.child_survival,
        LifeStage::Senior => config.senior_survival,
        _ => config.adult_survival,
    };
    if !character.conditions.is_empty() {
        chance *= config.condition_factor;
    }
    if character.stat(Stat::Wealth) >= config.wealth_threshold {
        chance = (chance * config.wealth_factor).min(config.max_survival);
    }
    chance
}

/// Yearly chance of dying of old age; 0 before `old_age_start`.
pub fn old_age_chance(config: &TerminationConfig, character: &Character) -> f64 {
    let age = character.age();
    if age >= config.max_age {
        return 1.0;
    }
    if age < config.old_age_start {
        return 0.0;
    }
    let mut chance = (age - config.old_age_start) as f64 * config.old_age_step;
    if character.stat(Stat::Health) < config.frail_health {
        chance += config.frail_bonus;
    }
    chance.min(1.0)
}

pub fn is_game_over(config: &TerminationConfig, character: &Character, rng: &mut dyn RandomSource) -> TerminationCheck {
    if let Some(cause) = &character.fatal_cause {
        return TerminationCheck::dead(cause.clone(), None);
    }

    let mut collapse = None;
    if character.stat(Stat::Health) <= 0 {
        let chance = survival_chance(config, character);
        if rng.next_f64() >= chance {
            return TerminationCheck::dead(DeathCause::Illness, Some(chance));
        }
        collapse = Some(chance);
    }

    if rng.chance(old_age_chance(config, character)) {
        return TerminationCheck::dead(DeathCause::OldAge, collapse);
    }
    TerminationCheck::alive(collapse)
}

/// Apply `check` to the character: revive after a survived collapse, or
/// seal the life.
pub fn finalize(config: &TerminationConfig, character: &mut Character, check: &TerminationCheck, log: &mut Chronicle) {
    if check.revived() {
        StatBalancer::set(character, Stat::Health, config.revive_health);
        log.narrate("You collapsed this year, but the doctors pulled you through.");
        return;
    }
    let (true, Some(cause)) = (check.game_over, &check.cause) else {
        return;
    };
    let age = character.age();
    if character.is_in_prison() {
        character.prison.custody = CustodyState::Deceased;
    }
    log.narrate(format!("You died at age {age} from {cause}."));
    log.emit("termination", SimEvent::GameOver { age, cause: cause.clone() });
    log::info!("age={age} game over: {cause}");
    character.game_over = Some(GameOver { age, cause: cause.clone() });
}
