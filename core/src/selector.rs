//! Event eligibility and weighted selection.
//!
//! `EventSelector` is the base contract: filter a pool against the
//! character and tracker, then draw one event by weight.
//! `AugmentedSelector` re-weights candidates (age fit, major events,
//! career bonus) before the same draw. The two layers are kept apart so
//! each can be exercised on its own.

use crate::{
    catalog::{Conditions, Event, EventCategory},
    character::{Character, LifeStage},
    config::SelectionConfig,
    rng::RandomSource,
    stats::Stat,
    tracker::EventTracker,
};

/// Walk-and-subtract weighted draw.
///
/// Draws r in [0, total) and subtracts each weight in order; the first
/// item that brings r to ≤ 0 wins. Rounding leftovers fall back to the
/// last item. Non-positive weights never win unless every weight is.
pub fn weighted_pick<'a, T>(items: &'a [(T, f64)], rng: &mut dyn RandomSource) -> Option<&'a T> {
    let (last, _) = items.last()?;
    let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return Some(last);
    }
    let mut remaining = rng.range_f64(0.0, total);
    for (item, weight) in items {
        let weight = weight.max(0.0);
        if weight == 0.0 {
            continue;
        }
        remaining -= weight;
        if remaining <= 0.0 {
            return Some(item);
        }
    }
    Some(last)
}

pub struct EventSelector {
    config: SelectionConfig,
}

impl EventSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Every deterministic gate of `conditions`. The probability gate is
    /// rolled separately by the caller.
    pub fn conditions_hold(&self, conditions: &Conditions, character: &Character) -> bool {
        let age = character.age();
        if conditions.min_age.is_some_and(|min| age < min) {
            return false;
        }
        if conditions.max_age.is_some_and(|max| age > max) {
            return false;
        }
        if conditions.life_stage.is_some_and(|stage| stage != character.life_stage()) {
            return false;
        }
        if conditions.min_stats.iter().any(|(&stat, &min)| character.stat(stat) < min) {
            return false;
        }
        if conditions.max_stats.iter().any(|(&stat, &max)| character.stat(stat) > max) {
            return false;
        }
        if conditions.has_job.is_some_and(|wanted| wanted != character.has_job()) {
            return false;
        }
        if conditions.has_education.is_some_and(|stage| !character.has_education(stage)) {
            return false;
        }
        // Custody is exclusive: prison events only inside, everything else only outside.
        if conditions.in_prison.unwrap_or(false) != character.is_in_prison() {
            return false;
        }
        if conditions.crime_rank.is_some_and(|rank| character.crime.rank < rank) {
            return false;
        }
        if let Some(flag) = &conditions.requires_flag {
            if !character.flags.contains(flag) {
                return false;
            }
        }
        if let Some(flag) = &conditions.excludes_flag {
            if character.flags.contains(flag) {
                return false;
            }
        }
        true
    }

    /// Eligible one-shot events from `pool`.
    ///
    /// Deterministic gates run first, then the triggered/cooldown checks,
    /// and only survivors consume a probability draw.
    pub fn available_events<'e>(
        &self,
        pool: &'e [Event],
        character: &Character,
        tracker: &EventTracker,
        rng: &mut dyn RandomSource,
    ) -> Vec<&'e Event> {
        let age = character.age();
        let mut eligible = Vec::new();
        for event in pool {
            if !self.conditions_hold(&event.conditions, character) {
                continue;
            }
            if tracker.is_triggered(&event.id) || tracker.on_cooldown(&event.id, age, self.config.cooldown_years) {
                continue;
            }
            if let Some(p) = event.conditions.probability {
                if !rng.roll_at_most(p) {
                    continue;
                }
            }
            eligible.push(event);
        }
        eligible
    }

    /// Repeatable events from the flat random pool. Only the age, job,
    /// custody and probability gates apply, plus the cooldown.
    pub fn random_pool_events<'e>(
        &self,
        pool: &'e [Event],
        character: &Character,
        tracker: &EventTracker,
        rng: &mut dyn RandomSource,
    ) -> Vec<&'e Event> {
        let age = character.age();
        let mut eligible = Vec::new();
        for event in pool {
            let c = &event.conditions;
            if c.min_age.is_some_and(|min| age < min) || c.max_age.is_some_and(|max| age > max) {
                continue;
            }
            if c.has_job.is_some_and(|wanted| wanted != character.has_job()) {
                continue;
            }
            if c.in_prison.unwrap_or(false) != character.is_in_prison() {
                continue;
            }
            if tracker.on_cooldown(&event.id, age, self.config.cooldown_years) {
                continue;
            }
            if let Some(p) = c.probability {
                if !rng.roll_at_most(p) {
                    continue;
                }
            }
            eligible.push(event);
        }
        eligible
    }

    /// Weighted draw over `candidates` using each event's own weight.
    pub fn select_event<'e>(&self, candidates: &[&'e Event], rng: &mut dyn RandomSource) -> Option<&'e Event> {
        let weighted: Vec<(&Event, f64)> = candidates.iter().map(|e| (*e, e.weight())).collect();
        weighted_pick(&weighted, rng).copied()
    }
}

/// Re-weighting layer over the base selector.
pub struct AugmentedSelector {
    base: EventSelector,
}

impl AugmentedSelector {
    pub fn new(base: EventSelector) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &EventSelector {
        &self.base
    }

    /// Multiplier for how far the character is from the middle of the
    /// event's age window. 1.0 at the midpoint, the floor at or past the
    /// window edge, and 1.0 for open-ended windows.
    pub fn age_factor(&self, event: &Event, character: &Character) -> f64 {
        let (Some(min), Some(max)) = (event.conditions.min_age, event.conditions.max_age) else {
            return 1.0;
        };
        let width = max.saturating_sub(min) as f64;
        if width == 0.0 {
            return 1.0;
        }
        let mid = (min + max) as f64 / 2.0;
        let distance = (character.age() as f64 - mid).abs();
        (1.0 - distance / width).max(self.base.config.age_weight_floor)
    }

    pub fn is_major(&self, event: &Event) -> bool {
        self.base
            .config
            .major_event_markers
            .iter()
            .any(|marker| event.id.contains(marker.as_str()))
    }

    /// Candidate weights after every modifier.
    pub fn reweight<'e>(&self, candidates: &[&'e Event], character: &Character) -> Vec<(&'e Event, f64)> {
        let config = &self.base.config;
        candidates
            .iter()
            .map(|&event| {
                let mut weight = event.weight() * self.age_factor(event, character);
                if self.is_major(event) {
                    weight *= config.major_event_factor;
                }
                if event.category == EventCategory::Career {
                    weight *= config.career_event_factor;
                }
                (event, weight)
            })
            .collect()
    }

    pub fn select_event<'e>(
        &self,
        candidates: &[&'e Event],
        character: &Character,
        rng: &mut dyn RandomSource,
    ) -> Option<&'e Event> {
        let weighted = self.reweight(candidates, character);
        weighted_pick(&weighted, rng).copied()
    }
}

/// Multiplier favouring categories that fit the character's stage of life.
pub fn static_category_bonus(category: EventCategory, character: &Character) -> f64 {
    let mut bonus = match (character.life_stage(), category) {
        (LifeStage::Teen, EventCategory::Education) => 2.0,
        (LifeStage::YoungAdult, EventCategory::Career) => 2.0,
        (LifeStage::Adult, EventCategory::Family) => 1.5,
        _ => 1.0,
    };
    if category == EventCategory::Health && character.stat(Stat::Health) < 50 {
        bonus *= 2.0;
    }
    bonus
}

/// Weighted static-pool candidates. Events whose title shows up in any of
/// the `recent` history lines are skipped.
pub fn static_candidates<'e>(
    selector: &EventSelector,
    pool: &'e [Event],
    character: &Character,
    recent: &[String],
) -> Vec<(&'e Event, f64)> {
    pool.iter()
        .filter(|e| selector.conditions_hold(&e.conditions, character))
        .filter(|e| !recent.iter().any(|line| line.contains(e.title.as_str())))
        .map(|e| (e, e.weight() * static_category_bonus(e.category, character)))
        .collect()
}
