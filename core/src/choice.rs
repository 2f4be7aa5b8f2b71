//! Resolution of a player's choice on a presented event.

use crate::{
    balancer::StatBalancer,
    career_subsystem::CareerAction,
    catalog::{Choice, ChoiceAction, Event},
    character::{
        Asset, Character, DelayedEvent, DelayedKind, FamilyMember, Gender, MajorDecision, Relation, RelationshipStatus,
    },
    config::ChoiceConfig,
    crime_subsystem::CrimeAction,
    education_subsystem::EducationAction,
    event::{Chronicle, SimEvent},
    name_generator::NameGenerator,
    prison_subsystem,
    rng::RandomSource,
    stats::{Skill, Stat, StatEffects},
    subsystem::{ActionResult, Subsystems},
    tracker::{ChoiceRecord, EventTracker},
};
use std::collections::BTreeMap;
use thiserror::Error;

/// A choice that could not be applied. Nothing was changed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("event '{event_id}' has no choice '{choice_id}'")]
    UnknownChoice { event_id: String, choice_id: String },

    #[error("the life has already ended")]
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceOutcome {
    pub choice_id: String,
    /// |sum of the choice's stat effects|
    pub magnitude: i64,
    pub log: Chronicle,
}

pub struct ChoiceResolver<'a> {
    config: &'a ChoiceConfig,
    subsystems: &'a Subsystems,
}

impl<'a> ChoiceResolver<'a> {
    pub fn new(config: &'a ChoiceConfig, subsystems: &'a Subsystems) -> Self {
        Self { config, subsystems }
    }

    pub fn apply_choice(
        &self,
        character: &mut Character,
        tracker: &mut EventTracker,
        event: &Event,
        choice_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<ChoiceOutcome, ChoiceError> {
        if character.is_game_over() {
            return Err(ChoiceError::GameOver);
        }
        let Some(choice) = event.choice(choice_id) else {
            return Err(ChoiceError::UnknownChoice {
                event_id: event.id.clone(),
                choice_id: choice_id.to_string(),
            });
        };
        let age = character.age();
        let mut log = Chronicle::new();
        log.narrate(format!("{}: {}", event.title, choice.text));

        StatBalancer::apply(character, &choice.effects);
        StatBalancer::apply_skills(character, &choice.skills);
        character.flags.extend(choice.flags.iter().cloned());

        if let Some(status) = choice.relationship {
            self.change_relationship(character, status, rng, &mut log);
        }
        if let Some(grant) = &choice.asset {
            character.assets.push(Asset { name: grant.name.clone(), value: grant.value, acquired_at: age });
            log.narrate(format!("You now own {}.", grant.name));
        }
        if let Some(action) = &choice.action {
            self.dispatch(character, action, rng, &mut log);
        }

        self.schedule_consequences(character, event, choice);

        if choice.relationship.is_some() || choice.action.as_ref().is_some_and(ChoiceAction::is_major) {
            character.major_decisions.push(MajorDecision {
                age,
                decision: choice.text.clone(),
                source_event: event.title.clone(),
            });
        }

        for consequence in &choice.consequences {
            let p = consequence.probability.unwrap_or(self.config.consequence_probability);
            if rng.chance(p) {
                log.narrate(consequence.text.clone());
            }
        }

        let magnitude = choice.effects.magnitude();
        tracker.mark_triggered(&event.id, age);
        tracker.record_choice(ChoiceRecord {
            age,
            event_id: event.id.clone(),
            choice_id: choice.id.clone(),
            magnitude,
        });
        log.emit(
            "choice",
            SimEvent::ChoiceResolved {
                age,
                event_id: event.id.clone(),
                choice_id: choice.id.clone(),
                magnitude,
            },
        );
        log::debug!("age={age} choice: {}/{} magnitude={magnitude}", event.id, choice.id);

        Ok(ChoiceOutcome { choice_id: choice.id.clone(), magnitude, log })
    }

    /// Queue delayed effects: the wealth-attention reaction and any
    /// authored follow-up.
    fn schedule_consequences(&self, character: &mut Character, event: &Event, choice: &Choice) {
        let age = character.age();
        if choice.effects.get(Stat::Wealth).unwrap_or(0) > self.config.wealth_attention_threshold {
            character.schedule(DelayedEvent {
                target_age: age + 1,
                kind: DelayedKind::WealthGainAttention,
                description: "Word of your windfall got around. Distant relatives started calling.".into(),
                effects: StatEffects::new().with(Stat::Happiness, self.config.wealth_attention_happiness),
                skills: BTreeMap::from([(Skill::Notoriety, self.config.wealth_attention_notoriety)]),
                source_event: Some(event.id.clone()),
            });
        }
        if let Some(follow_up) = &choice.delayed {
            character.schedule(DelayedEvent {
                target_age: age + follow_up.years,
                kind: DelayedKind::FollowUp,
                description: follow_up.description.clone(),
                effects: follow_up.effects.clone(),
                skills: follow_up.skills.clone(),
                source_event: Some(event.id.clone()),
            });
        }
    }

    fn change_relationship(
        &self,
        character: &mut Character,
        status: RelationshipStatus,
        rng: &mut dyn RandomSource,
        log: &mut Chronicle,
    ) {
        let previous = character.relationship_status;
        character.relationship_status = status;
        match status {
            RelationshipStatus::Married if previous != RelationshipStatus::Married => {
                let gender = match rng.pick_index(3) {
                    0 => Gender::Female,
                    1 => Gender::Male,
                    _ => Gender::Nonbinary,
                };
                let first = NameGenerator::first_name(gender, rng);
                let surname = NameGenerator::surname_of(&character.name).unwrap_or_default();
                let spouse = if surname.is_empty() { first.to_string() } else { format!("{first} {surname}") };
                log.narrate(format!("You married {spouse}."));
                character.family.push(FamilyMember {
                    relation: Relation::Spouse,
                    name: spouse,
                    age: character.age(),
                    alive: true,
                });
            }
            RelationshipStatus::Single | RelationshipStatus::Divorced => {
                character.family.retain(|m| !(m.relation == Relation::Spouse && m.alive));
            }
            _ => {}
        }
    }

    fn dispatch(&self, character: &mut Character, action: &ChoiceAction, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let subsystems = self.subsystems;
        let result = match action {
            ChoiceAction::ApplyJob { career_id } => subsystems
                .career
                .apply_action(character, CareerAction::ApplyJob { career_id: career_id.clone() }),
            ChoiceAction::QuitJob => subsystems.career.apply_action(character, CareerAction::QuitJob),
            ChoiceAction::EnrollUniversity => subsystems.education.apply_action(character, EducationAction::EnrollUniversity),
            ChoiceAction::JoinSyndicate => subsystems.crime.apply_action(character, CrimeAction::JoinSyndicate, rng),
            ChoiceAction::AcceptMurderAssignment => {
                subsystems.crime.apply_action(character, CrimeAction::AcceptMurderAssignment, rng)
            }
            ChoiceAction::BecomeInformant => subsystems.crime.apply_action(character, CrimeAction::BecomeInformant, rng),
            ChoiceAction::AttemptEscape => {
                subsystems.prison.attempt_escape(character, rng, log);
                return;
            }
            ChoiceAction::Arrest { crime_type } => {
                character.crime.crimes_committed += 1;
                prison_subsystem::arrest(character, *crime_type, rng, log);
                return;
            }
        };
        match result {
            ActionResult::Applied(chronicle) => log.extend(chronicle),
            ActionResult::Rejected { reason } => log.narrate(reason),
        }
    }
}
