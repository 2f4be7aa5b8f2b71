//! StatBalancer: the single choke point through which stats change.
//!
//! RULES:
//!   - Every stat and skill write after character creation goes through
//!     `StatBalancer::apply` (or one of its siblings below).
//!   - Every write is clamped to the stat's range.
//!   - A character that has reached game over is read-only: all writes
//!     become no-ops.

use crate::{
    character::Character,
    stats::{Skill, Stat, StatEffects, Stats},
};
use std::collections::BTreeMap;

/// What one entry of an effect map actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDelta {
    pub stat: Stat,
    pub requested: i64,
    pub applied: i64,
}

/// Cross-stat correlation nudge, evaluated once per balance pass.
struct BalanceRule {
    label: &'static str,
    when: fn(&Stats) -> bool,
    stat: Stat,
    delta: i64,
}

const BALANCE_RULES: &[BalanceRule] = &[
    BalanceRule {
        label: "poor health weighs on mood",
        when: |s| s.health() < 20,
        stat: Stat::Happiness,
        delta: -2,
    },
    BalanceRule {
        label: "despair wears the body down",
        when: |s| s.happiness() < 15,
        stat: Stat::Health,
        delta: -1,
    },
    BalanceRule {
        label: "close ties lift spirits",
        when: |s| s.relationships() >= 80,
        stat: Stat::Happiness,
        delta: 1,
    },
    BalanceRule {
        label: "isolation erodes happiness",
        when: |s| s.relationships() < 10,
        stat: Stat::Happiness,
        delta: -1,
    },
];

pub struct StatBalancer;

impl StatBalancer {
    /// Apply a whole effect map. Returns what each entry actually moved.
    pub fn apply(character: &mut Character, effects: &StatEffects) -> Vec<AppliedDelta> {
        if character.is_game_over() {
            return Vec::new();
        }
        effects
            .iter()
            .map(|(stat, delta)| AppliedDelta {
                stat,
                requested: delta,
                applied: Self::apply_one(character, stat, delta),
            })
            .collect()
    }

    /// Apply a single delta, returning the clamped change.
    pub fn apply_one(character: &mut Character, stat: Stat, delta: i64) -> i64 {
        if character.is_game_over() {
            return 0;
        }
        let before = character.stat(stat);
        character.stats_mut().set(stat, before.saturating_add(delta));
        character.stat(stat) - before
    }

    /// Absolute write, still clamped.
    pub fn set(character: &mut Character, stat: Stat, value: i64) {
        if character.is_game_over() {
            return;
        }
        character.stats_mut().set(stat, value);
    }

    pub fn apply_skills(character: &mut Character, skills: &BTreeMap<Skill, i64>) {
        if character.is_game_over() {
            return;
        }
        for (skill, delta) in skills {
            let current = character.skill(*skill);
            character.set_skill(*skill, current.saturating_add(*delta));
        }
    }

    /// Run every cross-stat rule once against the stats as they stand
    /// when the pass starts.
    pub fn balance(character: &mut Character) -> Vec<AppliedDelta> {
        if character.is_game_over() {
            return Vec::new();
        }
        let snapshot = character.stats().clone();
        let mut applied = Vec::new();
        for rule in BALANCE_RULES {
            if !(rule.when)(&snapshot) {
                continue;
            }
            let moved = Self::apply_one(character, rule.stat, rule.delta);
            if moved != 0 {
                log::debug!("balance: {} ({} {:+})", rule.label, rule.stat, moved);
                applied.push(AppliedDelta { stat: rule.stat, requested: rule.delta, applied: moved });
            }
        }
        applied
    }
}

/// Pure form of `StatBalancer::apply`: returns the updated character.
pub fn apply_effects(character: &Character, effects: &StatEffects) -> Character {
    let mut next = character.clone();
    StatBalancer::apply(&mut next, effects);
    next
}
