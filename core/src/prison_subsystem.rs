//! Prison state machine.
//!
//!   free → incarcerated → (paroled | released | fugitive | deceased)
//!
//! Entry is always an arrest carrying a crime type. While incarcerated
//! the character serves one year per turn; completion releases, half
//! the sentence makes parole available. Escape is only reachable from
//! an event choice and has no automatic way back.

use crate::{
    balancer::StatBalancer,
    career_subsystem::CareerState,
    character::Character,
    config::PrisonConfig,
    crime_subsystem::CrimeType,
    event::{Chronicle, SimEvent},
    rng::{RandomSource, SubsystemSlot},
    stats::{Skill, Stat},
    subsystem::{ActionResult, LifeSubsystem},
    types::Age,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facility {
    MinimumSecurity,
    MediumSecurity,
    MaximumSecurity,
}

impl Facility {
    pub fn for_crime(crime_type: CrimeType) -> Self {
        match crime_type.severity() {
            0 | 1 => Self::MinimumSecurity,
            2 => Self::MediumSecurity,
            _ => Self::MaximumSecurity,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::MinimumSecurity => "minimum security",
            Self::MediumSecurity => "medium security",
            Self::MaximumSecurity => "maximum security",
        }
    }
}

/// Inclusive sentence range in years.
pub fn sentence_range(crime_type: CrimeType) -> (u32, u32) {
    match crime_type {
        CrimeType::PettyTheft => (1, 2),
        CrimeType::Vandalism => (1, 2),
        CrimeType::Burglary => (2, 5),
        CrimeType::Assault => (2, 6),
        CrimeType::Fraud => (1, 5),
        CrimeType::DrugDealing => (3, 8),
        CrimeType::Robbery => (4, 10),
        CrimeType::Extortion => (3, 8),
        CrimeType::Murder => (15, 40),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incarceration {
    pub crime_type: CrimeType,
    pub facility: Facility,
    pub sentence: u32,
    pub time_served: u32,
    pub disciplinary_actions: u32,
    pub parole_eligible: bool,
    /// Standing among inmates.
    pub reputation: i64,
    pub admitted_at: Age,
    /// Age at which parole was last requested. One hearing per year.
    pub parole_requested_at: Option<Age>,
}

impl Incarceration {
    pub fn remaining(&self) -> u32 {
        self.sentence.saturating_sub(self.time_served)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CustodyState {
    #[default]
    Free,
    Incarcerated(Incarceration),
    Paroled { at: Age },
    Released { at: Age },
    Fugitive { since: Age },
    Deceased,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrisonRecord {
    pub custody: CustodyState,
    pub times_incarcerated: u32,
    pub total_years_served: u32,
}

impl PrisonRecord {
    pub fn is_in_prison(&self) -> bool {
        matches!(self.custody, CustodyState::Incarcerated(_))
    }

    pub fn is_fugitive(&self) -> bool {
        matches!(self.custody, CustodyState::Fugitive { .. })
    }

    pub fn incarceration(&self) -> Option<&Incarceration> {
        match &self.custody {
            CustodyState::Incarcerated(inc) => Some(inc),
            _ => None,
        }
    }

    fn incarceration_mut(&mut self) -> Option<&mut Incarceration> {
        match &mut self.custody {
            CustodyState::Incarcerated(inc) => Some(inc),
            _ => None,
        }
    }
}

/// clamp(base + factor × max(0, reputation) − penalty × discipline, min, max), in percent.
pub fn parole_chance(config: &PrisonConfig, inc: &Incarceration) -> f64 {
    let chance = config.parole_base + config.parole_reputation_factor * inc.reputation.max(0) as f64
        - config.parole_discipline_penalty * inc.disciplinary_actions as f64;
    chance.clamp(config.parole_min, config.parole_max)
}

/// Take the character into custody for `crime_type`.
///
/// Ends any employment and school enrollment. A fugitive caught again
/// starts a fresh sentence.
pub fn arrest(character: &mut Character, crime_type: CrimeType, rng: &mut dyn RandomSource, log: &mut Chronicle) {
    if character.is_in_prison() || character.is_game_over() {
        return;
    }
    let age = character.age();
    let (min, max) = sentence_range(crime_type);
    let sentence = rng.range_i64(min as i64, max as i64) as u32;
    let facility = Facility::for_crime(crime_type);

    if let CareerState::Employed(job) = &character.career {
        log.emit("prison", SimEvent::JobLost { age, career_id: job.career_id.clone() });
    }
    character.career = CareerState::Unemployed;
    character.education.current = None;
    character.flags.remove("fugitive");

    let record = &mut character.prison;
    record.times_incarcerated += 1;
    record.custody = CustodyState::Incarcerated(Incarceration {
        crime_type,
        facility,
        sentence,
        time_served: 0,
        disciplinary_actions: 0,
        parole_eligible: false,
        reputation: 0,
        admitted_at: age,
        parole_requested_at: None,
    });

    log::debug!("age={age} prison: arrested for {} sentence={sentence}", crime_type.label());
    log.narrate(format!(
        "You were convicted of {} and sentenced to {sentence} years in a {} prison.",
        crime_type.label(),
        facility.label()
    ));
    log.emit("prison", SimEvent::Arrested { age, crime_type, sentence, facility });
    StatBalancer::apply_one(character, Stat::Happiness, -20);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrisonAction {
    RequestParole,
    Workout,
    StartFight,
}

pub struct PrisonSubsystem {
    config: PrisonConfig,
}

impl PrisonSubsystem {
    pub fn new(config: PrisonConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PrisonConfig {
        &self.config
    }

    pub fn apply_action(
        &self,
        character: &mut Character,
        action: PrisonAction,
        rng: &mut dyn RandomSource,
    ) -> ActionResult {
        let age = character.age();
        let Some(inc) = character.prison.incarceration() else {
            return ActionResult::rejected("You're not in prison.");
        };
        let mut log = Chronicle::new();
        match action {
            PrisonAction::RequestParole => {
                if !inc.parole_eligible {
                    return ActionResult::rejected("You aren't eligible for parole yet.");
                }
                if inc.parole_requested_at == Some(age) {
                    return ActionResult::rejected("The board already heard you this year.");
                }
                let chance = parole_chance(&self.config, inc);
                let granted = rng.chance(chance / 100.0);
                if let Some(inc) = character.prison.incarceration_mut() {
                    inc.parole_requested_at = Some(age);
                }
                if granted {
                    self.release(character, true, &mut log);
                } else {
                    log.narrate("The parole board denied your request.");
                    log.emit(self.name(), SimEvent::ParoleDenied { age, chance });
                    StatBalancer::apply_one(character, Stat::Happiness, -5);
                }
            }
            PrisonAction::Workout => {
                StatBalancer::apply_one(character, Stat::Health, 3);
                StatBalancer::apply_skills(character, &BTreeMap::from([(Skill::Fitness, 3)]));
                log.narrate("You spent the year in the prison yard lifting weights.");
            }
            PrisonAction::StartFight => {
                let won = rng.chance(0.5);
                if let Some(inc) = character.prison.incarceration_mut() {
                    inc.disciplinary_actions += 1;
                    inc.reputation += if won { 10 } else { -5 };
                }
                if won {
                    log.narrate("You won the fight. The other inmates keep their distance now.");
                } else {
                    StatBalancer::apply_one(character, Stat::Health, -10);
                    log.narrate("You lost the fight and spent a week in the infirmary.");
                }
            }
        }
        ActionResult::Applied(log)
    }

    /// Event-gated escape attempt. Failure adds years to the sentence.
    pub fn attempt_escape(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) -> bool {
        let age = character.age();
        if !character.is_in_prison() {
            return false;
        }
        if rng.chance(self.config.escape_chance) {
            character.prison.custody = CustodyState::Fugitive { since: age };
            character.flags.insert("fugitive".into());
            log.narrate("You slipped over the wall. You're a fugitive now.");
            log.emit(self.name(), SimEvent::Escaped { age });
            true
        } else {
            if let Some(inc) = character.prison.incarceration_mut() {
                inc.sentence += self.config.failed_escape_extra_years;
                inc.disciplinary_actions += 1;
                inc.parole_eligible = false;
            }
            log.narrate("The guards caught you at the fence. Years were added to your sentence.");
            false
        }
    }

    fn release(&self, character: &mut Character, paroled: bool, log: &mut Chronicle) {
        let age = character.age();
        character.prison.custody = if paroled {
            CustodyState::Paroled { at: age }
        } else {
            CustodyState::Released { at: age }
        };
        if paroled {
            log.narrate("The parole board granted your release.");
        } else {
            log.narrate("You served your full sentence and walked out a free person.");
        }
        log.emit(self.name(), SimEvent::Released { age, paroled });
    }

    /// One year served.
    fn serve_time(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let fraction = self.config.parole_eligibility_fraction;
        let Some(inc) = character.prison.incarceration_mut() else {
            return;
        };
        inc.time_served += 1;
        let done = inc.time_served >= inc.sentence;
        let newly_eligible = !inc.parole_eligible && inc.time_served as f64 >= fraction * inc.sentence as f64;
        if newly_eligible {
            inc.parole_eligible = true;
        }
        let served = inc.time_served;
        character.prison.total_years_served += 1;

        StatBalancer::apply_one(character, Stat::Happiness, self.config.yearly_happiness_penalty);
        if rng.chance(self.config.health_penalty_chance) {
            StatBalancer::apply_one(character, Stat::Health, self.config.health_penalty);
            log.narrate("Prison life is taking a toll on your health.");
        }
        log::debug!("age={} prison: served={served} done={done}", character.age());

        if done {
            self.release(character, false, log);
        } else if newly_eligible {
            log.narrate("You are now eligible for parole.");
        }
    }
}

impl LifeSubsystem for PrisonSubsystem {
    fn name(&self) -> &'static str {
        "prison"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Prison
    }

    fn runs_in_custody(&self) -> bool {
        true
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        self.serve_time(character, rng, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(reputation: i64, disciplinary_actions: u32) -> Incarceration {
        Incarceration {
            crime_type: CrimeType::Burglary,
            facility: Facility::MediumSecurity,
            sentence: 4,
            time_served: 2,
            disciplinary_actions,
            parole_eligible: true,
            reputation,
            admitted_at: 20,
            parole_requested_at: None,
        }
    }

    #[test]
    fn parole_chance_formula() {
        let config = PrisonConfig::default();
        assert_eq!(parole_chance(&config, &inc(0, 0)), 30.0);
        assert_eq!(parole_chance(&config, &inc(40, 1)), 40.0);
        // Negative reputation does not count against you.
        assert_eq!(parole_chance(&config, &inc(-50, 0)), 30.0);
        assert_eq!(parole_chance(&config, &inc(0, 5)), 5.0);
        assert_eq!(parole_chance(&config, &inc(500, 0)), 100.0);
    }

    #[test]
    fn facility_follows_severity() {
        assert_eq!(Facility::for_crime(CrimeType::PettyTheft), Facility::MinimumSecurity);
        assert_eq!(Facility::for_crime(CrimeType::Burglary), Facility::MediumSecurity);
        assert_eq!(Facility::for_crime(CrimeType::Murder), Facility::MaximumSecurity);
    }
}
