//! Education subsystem.
//!
//! Compulsory schooling enrolls and advances automatically:
//!   elementary (at 5, 6 years) → middle school (3) → high school (4).
//! University and graduate school are entered by player action.
//!
//! Execution: every turn, paused while incarcerated.

use crate::{
    balancer::StatBalancer,
    character::Character,
    config::FinanceConfig,
    event::{Chronicle, SimEvent},
    rng::{RandomSource, SubsystemSlot},
    stats::Stat,
    subsystem::{ActionResult, LifeSubsystem},
    types::Age,
};
use serde::{Deserialize, Serialize};

pub const SCHOOL_START_AGE: Age = 5;
pub const UNIVERSITY_MIN_AGE: Age = 17;
pub const UNIVERSITY_MIN_SMARTS: i64 = 40;
pub const UNIVERSITY_TUITION: i64 = 20;
pub const GRADUATE_MIN_SMARTS: i64 = 60;
pub const GRADUATE_TUITION: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationStage {
    Elementary,
    MiddleSchool,
    HighSchool,
    University,
    Graduate,
}

impl EducationStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Elementary => "elementary school",
            Self::MiddleSchool => "middle school",
            Self::HighSchool => "high school",
            Self::University => "university",
            Self::Graduate => "graduate school",
        }
    }

    pub fn duration(&self) -> u32 {
        match self {
            Self::Elementary => 6,
            Self::MiddleSchool => 3,
            Self::HighSchool => 4,
            Self::University => 4,
            Self::Graduate => 2,
        }
    }

    /// The stage that follows automatically, if schooling is compulsory.
    pub fn next_compulsory(&self) -> Option<EducationStage> {
        match self {
            Self::Elementary => Some(Self::MiddleSchool),
            Self::MiddleSchool => Some(Self::HighSchool),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub stage: EducationStage,
    pub years_completed: u32,
    pub started_at: Age,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    pub current: Option<Enrollment>,
    pub completed: Vec<EducationStage>,
    /// 0.0 – 4.0
    pub gpa: f64,
}

impl EducationRecord {
    pub fn is_enrolled(&self) -> bool {
        self.current.is_some()
    }

    fn enroll(&mut self, stage: EducationStage, age: Age) {
        self.current = Some(Enrollment { stage, years_completed: 0, started_at: age });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationAction {
    EnrollUniversity,
    EnrollGraduate,
    DropOut,
}

pub struct EducationSubsystem {
    finance: FinanceConfig,
}

impl EducationSubsystem {
    pub fn new(finance: FinanceConfig) -> Self {
        Self { finance }
    }

    pub fn apply_action(&self, character: &mut Character, action: EducationAction) -> ActionResult {
        match action {
            EducationAction::EnrollUniversity => self.enroll_higher(
                character,
                EducationStage::University,
                EducationStage::HighSchool,
                UNIVERSITY_MIN_SMARTS,
                UNIVERSITY_TUITION,
            ),
            EducationAction::EnrollGraduate => self.enroll_higher(
                character,
                EducationStage::Graduate,
                EducationStage::University,
                GRADUATE_MIN_SMARTS,
                GRADUATE_TUITION,
            ),
            EducationAction::DropOut => {
                let Some(enrollment) = character.education.current.take() else {
                    return ActionResult::rejected("You aren't enrolled anywhere.");
                };
                let mut log = Chronicle::new();
                character.flags.insert("dropout".into());
                StatBalancer::apply_one(character, Stat::Happiness, -5);
                log.narrate(format!("You dropped out of {}.", enrollment.stage.label()));
                ActionResult::Applied(log)
            }
        }
    }

    fn enroll_higher(
        &self,
        character: &mut Character,
        stage: EducationStage,
        prerequisite: EducationStage,
        min_smarts: i64,
        tuition: i64,
    ) -> ActionResult {
        if character.is_in_prison() {
            return ActionResult::rejected("You can't enroll while incarcerated.");
        }
        if character.education.is_enrolled() {
            return ActionResult::rejected("You are already enrolled.");
        }
        if character.has_education(stage) {
            return ActionResult::rejected(format!("You already finished {}.", stage.label()));
        }
        if !character.has_education(prerequisite) {
            return ActionResult::rejected(format!("You need to finish {} first.", prerequisite.label()));
        }
        if character.age() < UNIVERSITY_MIN_AGE {
            return ActionResult::rejected("You are too young to enroll.");
        }
        if character.stat(Stat::Smarts) < min_smarts {
            return ActionResult::rejected(format!("Your application to {} was not accepted.", stage.label()));
        }

        let mut log = Chronicle::new();
        if character.stat(Stat::Wealth) >= tuition {
            StatBalancer::apply_one(character, Stat::Wealth, -tuition);
            log.narrate(format!("You paid {tuition}k in tuition and enrolled in {}.", stage.label()));
        } else {
            character.finances.take_loan(
                format!("{} loan", stage.label()),
                tuition,
                self.finance.student_loan_rate,
                self.finance.student_loan_years,
            );
            log.narrate(format!(
                "You took out a {tuition}k student loan and enrolled in {}.",
                stage.label()
            ));
        }
        let age = character.age();
        character.education.enroll(stage, age);
        ActionResult::Applied(log)
    }
}

impl LifeSubsystem for EducationSubsystem {
    fn name(&self) -> &'static str {
        "education"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Education
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let age = character.age();

        if character.education.current.is_none() {
            if age == SCHOOL_START_AGE && character.education.completed.is_empty() {
                character.education.enroll(EducationStage::Elementary, age);
                log.narrate("You started elementary school.");
            }
            return;
        }

        // Smarts first so this year's GPA reflects this year's learning.
        let gain = rng.range_i64(0, 2);
        StatBalancer::apply_one(character, Stat::Smarts, gain);

        let target = character.stat(Stat::Smarts) as f64 / 25.0;
        let noise = rng.range_f64(-0.2, 0.2);
        let record = &mut character.education;
        record.gpa = (record.gpa * 0.7 + target * 0.3 + noise).clamp(0.0, 4.0);

        let Some(enrollment) = record.current.as_mut() else {
            return;
        };
        enrollment.years_completed += 1;
        if enrollment.years_completed < enrollment.stage.duration() {
            return;
        }

        let stage = enrollment.stage;
        record.current = None;
        record.completed.push(stage);
        let gpa = record.gpa;
        log.narrate(format!("You graduated from {} with a GPA of {gpa:.1}.", stage.label()));
        log.emit(self.name(), SimEvent::EducationCompleted { age, stage: stage.label().to_string() });

        if let Some(next) = stage.next_compulsory() {
            record.enroll(next, age);
            log.narrate(format!("You started {}.", next.label()));
        }
        log::debug!("age={age} education: completed {stage:?} gpa={gpa:.2}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{character::Gender, rng::ScriptedRng, stats::Stats};

    fn child() -> Character {
        Character::new("e".into(), "E".into(), 2000, Gender::Female, Stats::new(80, 60, 60, 50, 50, 0))
    }

    #[test]
    fn school_starts_at_five_and_chains_automatically() {
        let edu = EducationSubsystem::new(FinanceConfig::default());
        let mut c = child().starting_at(4);
        let mut rng = ScriptedRng::constant(0.5);
        let mut log = Chronicle::new();
        for _ in 0..7 {
            c.advance_age();
            edu.advance(&mut c, &mut rng, &mut log);
        }
        // Age 11: six years of elementary done, middle school started.
        assert!(c.has_education(EducationStage::Elementary));
        assert_eq!(c.education.current.as_ref().map(|e| e.stage), Some(EducationStage::MiddleSchool));
    }

    #[test]
    fn university_without_funds_takes_a_loan() {
        let edu = EducationSubsystem::new(FinanceConfig::default());
        let mut c = child().starting_at(18);
        c.education.completed = vec![EducationStage::Elementary, EducationStage::MiddleSchool, EducationStage::HighSchool];
        let result = edu.apply_action(&mut c, EducationAction::EnrollUniversity);
        assert!(result.is_applied());
        assert_eq!(c.finances.loans.len(), 1);
        assert_eq!(c.finances.loans[0].balance, UNIVERSITY_TUITION);
    }

    #[test]
    fn university_requires_high_school() {
        let edu = EducationSubsystem::new(FinanceConfig::default());
        let mut c = child().starting_at(18);
        let before = c.clone();
        let result = edu.apply_action(&mut c, EducationAction::EnrollUniversity);
        assert!(!result.is_applied());
        assert_eq!(c, before);
    }
}
