//! The yearly "age up" pipeline.
//!
//! PHASE ORDER (fixed, never reordered, never skipped):
//!   1. Guard           : game over or a pending choice stops the turn
//!   2. Age             : +1 year
//!   3. Subsystems      : prison, education, finance, drift, family, crime,
//!                         then delayed effects and cross-stat balancing
//!   4. Health          : diagnosis roll and recovery
//!   5. Career          : experience, performance, promotion
//!   6. Candidates      : eligible dynamic events ∪ random-pool events
//!   7. Primary draw    : present one event (or apply it if passive)
//!   8. Static draw     : only when phase 7 presented nothing
//!   9. Milestones
//!  10. Achievements
//!  11. Termination
//!  12. Commit          : narrative into the age history
//!
//! RULES:
//!   - Eligibility in phase 6 sees the character after phases 3–5 and
//!     before any event effect of this turn.
//!   - Each phase draws from its own RNG slot.
//!   - While incarcerated only custody-aware subsystems advance.

use crate::{
    achievements,
    balancer::StatBalancer,
    catalog::{Event, EventCatalog},
    character::Character,
    config::SimConfig,
    event::{Chronicle, SimEvent},
    history::AgeHistory,
    rng::{RandomSource, RngBank, SubsystemSlot},
    selector::{self, AugmentedSelector},
    stats::Stat,
    subsystem::{LifeSubsystem, Subsystems},
    termination::{self, TerminationCheck},
    tracker::EventTracker,
    types::{Age, EventId},
};
use serde::{Deserialize, Serialize};

/// Everything that changes over a life.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeState {
    pub character: Character,
    pub tracker: EventTracker,
    pub history: AgeHistory,
    /// Event presented to the player and awaiting a choice.
    pub pending: Option<EventId>,
}

impl LifeState {
    pub fn new(character: Character) -> Self {
        Self { character, tracker: EventTracker::new(), history: AgeHistory::new(), pending: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Blocked {
    AwaitingChoice,
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnReport {
    pub age: Age,
    pub narrative: Vec<String>,
    pub presented: Option<EventId>,
    pub achievements: Vec<&'static str>,
    pub termination: Option<TerminationCheck>,
    pub blocked: Option<Blocked>,
    pub events: Vec<(&'static str, SimEvent)>,
}

impl TurnReport {
    fn blocked(age: Age, reason: Blocked) -> Self {
        Self {
            age,
            narrative: Vec::new(),
            presented: None,
            achievements: Vec::new(),
            termination: None,
            blocked: Some(reason),
            events: Vec::new(),
        }
    }

    pub fn game_over(&self) -> bool {
        self.termination.as_ref().is_some_and(|t| t.game_over)
    }
}

pub fn milestone(age: Age) -> Option<&'static str> {
    match age {
        1 => Some("You celebrated your first birthday."),
        5 => Some("You started school."),
        13 => Some("You're officially a teenager."),
        18 => Some("You're an adult now."),
        21 => Some("You turned 21."),
        65 => Some("You reached retirement age."),
        _ => None,
    }
}

pub struct TurnProcessor<'a> {
    config: &'a SimConfig,
    catalog: &'a EventCatalog,
    subsystems: &'a Subsystems,
    selector: &'a AugmentedSelector,
}

impl<'a> TurnProcessor<'a> {
    pub fn new(
        config: &'a SimConfig,
        catalog: &'a EventCatalog,
        subsystems: &'a Subsystems,
        selector: &'a AugmentedSelector,
    ) -> Self {
        Self { config, catalog, subsystems, selector }
    }

    /// min(cap, base × age factor × health factor)
    pub fn event_probability(&self, character: &Character) -> f64 {
        let t = &self.config.turn;
        let age = character.age();
        let age_factor = if age < 18 {
            t.minor_age_factor
        } else if age < 65 {
            1.0
        } else {
            t.senior_age_factor
        };
        let health_factor = if character.stat(Stat::Health) < t.low_health_threshold {
            t.low_health_factor
        } else {
            1.0
        };
        (t.base_event_probability * age_factor * health_factor).min(t.max_event_probability)
    }

    pub fn age_up(&self, state: &mut LifeState, rngs: &mut RngBank) -> TurnReport {
        // 1. Guard
        if state.character.is_game_over() {
            return TurnReport::blocked(state.character.age(), Blocked::GameOver);
        }
        if state.pending.is_some() {
            return TurnReport::blocked(state.character.age(), Blocked::AwaitingChoice);
        }

        // 2. Age
        let age = state.character.advance_age();
        let mut log = Chronicle::new();
        log.emit("turn", SimEvent::TurnStarted { age });

        // 3–5. Subsystems
        self.advance_subsystems(&mut state.character, rngs, &mut log);

        // 6–8. Events
        let presented = self.draw_events(state, rngs, &mut log);

        // 9. Milestones
        if let Some(line) = milestone(age) {
            log.narrate(line);
            log.emit("turn", SimEvent::MilestoneReached { age });
        }

        // 10. Achievements
        let unlocked = achievements::check(&mut state.character, &state.tracker, &mut log);

        // 11. Termination
        let mut rng = rngs.for_slot(SubsystemSlot::Termination);
        let check = termination::is_game_over(&self.config.termination, &state.character, &mut rng);
        termination::finalize(&self.config.termination, &mut state.character, &check, &mut log);
        if check.game_over {
            state.pending = None;
        }

        // 12. Commit
        log.emit("turn", SimEvent::TurnCompleted { age });
        state.history.record(age, log.narrative.iter().cloned());
        log::debug!("age={age} turn: {} lines, presented={presented:?}", log.narrative.len());

        TurnReport {
            age,
            narrative: log.narrative,
            presented: if check.game_over { None } else { presented },
            achievements: unlocked,
            termination: Some(check),
            blocked: None,
            events: log.events,
        }
    }

    fn advance_subsystems(&self, character: &mut Character, rngs: &mut RngBank, log: &mut Chronicle) {
        let in_custody = character.is_in_prison();
        for subsystem in self.subsystems.yearly() {
            if in_custody && !subsystem.runs_in_custody() {
                continue;
            }
            let mut rng = rngs.for_slot(subsystem.slot());
            subsystem.advance(character, &mut rng, log);
        }

        for delayed in character.take_due_events() {
            StatBalancer::apply(character, &delayed.effects);
            StatBalancer::apply_skills(character, &delayed.skills);
            log.narrate(delayed.description.clone());
            log.emit("turn", SimEvent::DelayedEffectApplied { age: character.age(), description: delayed.description });
        }
        StatBalancer::balance(character);

        let health = &self.subsystems.health;
        health.advance(character, &mut rngs.for_slot(health.slot()), log);

        let career = &self.subsystems.career;
        if !character.is_in_prison() {
            career.advance(character, &mut rngs.for_slot(career.slot()), log);
        }
    }

    /// Phases 6–8. Returns the id of an event left pending for the player.
    fn draw_events(&self, state: &mut LifeState, rngs: &mut RngBank, log: &mut Chronicle) -> Option<EventId> {
        let character = &state.character;
        let base = self.selector.base();

        let mut gate = rngs.for_slot(SubsystemSlot::EventGate);
        let mut candidates = base.available_events(&self.catalog.dynamic, character, &state.tracker, &mut gate);
        candidates.extend(base.random_pool_events(&self.catalog.random_pool, character, &state.tracker, &mut gate));

        let mut rng = rngs.for_slot(SubsystemSlot::DynamicEvents);
        let selected = self.selector.select_event(&candidates, character, &mut rng);
        let probability = self.event_probability(character);
        if let Some(event) = selected {
            if rng.chance(probability) {
                return self.present(state, event, log);
            }
        }

        let mut rng = rngs.for_slot(SubsystemSlot::StaticEvents);
        if rng.chance(self.config.turn.static_event_chance) {
            let recent = recent_lines(&state.history, &log.narrative, self.config.turn.recency_window);
            let weighted = selector::static_candidates(base, &self.catalog.static_pool, &state.character, &recent);
            if let Some(event) = selector::weighted_pick(&weighted, &mut rng).copied() {
                self.apply_passive(state, event, log);
            }
        }
        None
    }

    fn present(&self, state: &mut LifeState, event: &Event, log: &mut Chronicle) -> Option<EventId> {
        if event.is_passive() {
            self.apply_passive(state, event, log);
            return None;
        }
        let age = state.character.age();
        log.narrate(format!("{}: {}", event.title, event.description));
        log.emit("turn", SimEvent::EventPresented { age, event_id: event.id.clone() });
        state.pending = Some(event.id.clone());
        Some(event.id.clone())
    }

    /// Apply an event without choices. Dynamic events are spent; pool
    /// events only start their cooldown.
    fn apply_passive(&self, state: &mut LifeState, event: &Event, log: &mut Chronicle) {
        let age = state.character.age();
        StatBalancer::apply(&mut state.character, &event.effects);
        if self.catalog.dynamic.iter().any(|e| e.id == event.id) {
            state.tracker.mark_triggered(&event.id, age);
        } else {
            state.tracker.touch(&event.id, age);
        }
        log.narrate(format!("{}: {}", event.title, event.description));
        log.emit("turn", SimEvent::PassiveEventApplied { age, event_id: event.id.clone() });
    }
}

/// The last `window` narrative lines, counting this turn's uncommitted
/// lines as the newest.
fn recent_lines(history: &AgeHistory, this_turn: &[String], window: usize) -> Vec<String> {
    let mut recent = history.recent(window);
    recent.extend(this_turn.iter().cloned());
    let excess = recent.len().saturating_sub(window);
    recent.drain(..excess);
    recent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{character::Gender, content::ContentPack, selector::EventSelector, stats::Stats};

    #[test]
    fn event_probability_is_capped() {
        let config = SimConfig::default();
        let content = ContentPack::default();
        let subsystems = Subsystems::new(&config, &content);
        let selector = AugmentedSelector::new(EventSelector::new(config.selection.clone()));
        let turn = TurnProcessor::new(&config, &content.catalog, &subsystems, &selector);

        let child = Character::new("c".into(), "C".into(), 2000, Gender::Male, Stats::new(20, 50, 50, 50, 50, 0))
            .starting_at(10);
        // 0.3 × 0.8 × 1.2
        assert!((turn.event_probability(&child) - 0.288).abs() < 1e-9);

        let tuned = SimConfig {
            turn: crate::config::TurnConfig { base_event_probability: 0.9, ..Default::default() },
            ..SimConfig::default()
        };
        let turn = TurnProcessor::new(&tuned, &content.catalog, &subsystems, &selector);
        let adult = child.clone().starting_at(30);
        assert_eq!(turn.event_probability(&adult), 0.6);
    }

    #[test]
    fn recency_window_counts_this_turns_lines() {
        let mut history = AgeHistory::new();
        history.record(1, (0..8).map(|i| format!("old {i}")));
        let this_turn = vec!["new a".to_string(), "new b".to_string()];

        let recent = recent_lines(&history, &this_turn, 8);
        assert_eq!(recent.len(), 8);
        assert_eq!(recent.first().map(String::as_str), Some("old 2"));
        assert_eq!(recent.last().map(String::as_str), Some("new b"));
    }
}
