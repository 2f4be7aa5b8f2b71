//! Career state machine.
//!
//!   Unemployed ──apply_job──▶ Employed(level 1) ──promotion──▶ Employed(level L+1)
//!
//! Hiring is gated on age, education and smarts. Promotion requires
//! enough years at the current level, a performance rating at or above
//! the level's threshold, and the level's stat minimums. Salary comes
//! from the career's level table, or `base_salary + level × raise` on
//! tracks that have no table.
//!
//! Execution: every turn while employed; paused while incarcerated.

use crate::{
    balancer::StatBalancer,
    character::Character,
    config::CareerConfig,
    education_subsystem::EducationStage,
    event::{Chronicle, SimEvent},
    rng::{RandomSource, SubsystemSlot},
    stats::Stat,
    subsystem::{ActionResult, LifeSubsystem},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerLevel {
    pub title: String,
    /// Yearly salary in thousands.
    pub salary: i64,
    /// Years at the previous level before this one is reachable.
    #[serde(default)]
    pub years_required: u32,
    #[serde(default)]
    pub min_performance: Option<i64>,
    #[serde(default)]
    pub min_stats: BTreeMap<Stat, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub required_education: Option<EducationStage>,
    #[serde(default)]
    pub min_smarts: i64,
    pub base_salary: i64,
    /// Empty for the simplified track.
    #[serde(default)]
    pub levels: Vec<CareerLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employment {
    pub career_id: String,
    pub title: String,
    /// 1-based.
    pub level: u32,
    pub salary: i64,
    pub years_at_level: u32,
    pub years_experience: u32,
    /// 0 – 100
    pub performance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CareerState {
    #[default]
    Unemployed,
    Employed(Employment),
}

impl CareerState {
    pub fn is_employed(&self) -> bool {
        matches!(self, Self::Employed(_))
    }

    pub fn employment(&self) -> Option<&Employment> {
        match self {
            Self::Employed(job) => Some(job),
            Self::Unemployed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CareerAction {
    ApplyJob { career_id: String },
    QuitJob,
    WorkHard,
}

/// Title and salary of one rung of a career ladder.
#[derive(Debug, Clone, PartialEq)]
struct Rung {
    title: String,
    salary: i64,
    years_required: u32,
    min_performance: i64,
    min_stats: BTreeMap<Stat, i64>,
}

pub struct CareerSubsystem {
    config: CareerConfig,
    careers: Vec<CareerDef>,
}

impl CareerSubsystem {
    pub fn new(config: CareerConfig, careers: Vec<CareerDef>) -> Self {
        Self { config, careers }
    }

    pub fn career(&self, id: &str) -> Option<&CareerDef> {
        self.careers.iter().find(|c| c.id == id)
    }

    fn rung(&self, career: &CareerDef, level: u32) -> Option<Rung> {
        if level == 0 {
            return None;
        }
        if career.levels.is_empty() {
            if level > self.config.simplified_max_level {
                return None;
            }
            return Some(Rung {
                title: format!("{} (Level {level})", career.name),
                salary: career.base_salary + level as i64 * self.config.simplified_raise,
                years_required: if level == 1 { 0 } else { self.config.simplified_years_per_level },
                min_performance: self.config.promotion_performance,
                min_stats: BTreeMap::new(),
            });
        }
        let def = career.levels.get(level as usize - 1)?;
        Some(Rung {
            title: def.title.clone(),
            salary: def.salary,
            years_required: def.years_required,
            min_performance: def.min_performance.unwrap_or(self.config.promotion_performance),
            min_stats: def.min_stats.clone(),
        })
    }

    pub fn apply_action(&self, character: &mut Character, action: CareerAction) -> ActionResult {
        match action {
            CareerAction::ApplyJob { career_id } => self.apply_job(character, &career_id),
            CareerAction::QuitJob => {
                let CareerState::Employed(job) = std::mem::take(&mut character.career) else {
                    return ActionResult::rejected("You don't have a job to quit.");
                };
                let mut log = Chronicle::new();
                log.narrate(format!("You quit your job as {}.", job.title));
                log.emit(self.name(), SimEvent::JobLost { age: character.age(), career_id: job.career_id });
                ActionResult::Applied(log)
            }
            CareerAction::WorkHard => {
                let CareerState::Employed(job) = &mut character.career else {
                    return ActionResult::rejected("You need a job to work hard at.");
                };
                job.performance = (job.performance + 10).min(100);
                let mut log = Chronicle::new();
                StatBalancer::apply_one(character, Stat::Happiness, -3);
                StatBalancer::apply_one(character, Stat::Health, -1);
                log.narrate("You put in long hours at work. Your boss noticed.");
                ActionResult::Applied(log)
            }
        }
    }

    fn apply_job(&self, character: &mut Character, career_id: &str) -> ActionResult {
        if character.is_in_prison() {
            return ActionResult::rejected("Nobody is hiring from inside a prison.");
        }
        if let Some(job) = character.career.employment() {
            return ActionResult::rejected(format!("You already work as {}. Quit first.", job.title));
        }
        let Some(career) = self.career(career_id) else {
            return ActionResult::rejected(format!("There is no career called '{career_id}'."));
        };
        if character.age() < self.config.min_age {
            return ActionResult::rejected(format!("You must be at least {} to work.", self.config.min_age));
        }
        if let Some(stage) = career.required_education {
            if !character.has_education(stage) {
                return ActionResult::rejected(format!("{} requires {}.", career.name, stage.label()));
            }
        }
        if character.stat(Stat::Smarts) < career.min_smarts {
            return ActionResult::rejected(format!("You weren't qualified for the {} job.", career.name));
        }
        let Some(entry) = self.rung(career, 1) else {
            return ActionResult::rejected(format!("{} has no open positions.", career.name));
        };

        let mut log = Chronicle::new();
        log.narrate(format!("You were hired as {} earning {}k a year.", entry.title, entry.salary));
        log.emit(
            self.name(),
            SimEvent::Hired {
                age: character.age(),
                career_id: career.id.clone(),
                title: entry.title.clone(),
                salary: entry.salary,
            },
        );
        character.career = CareerState::Employed(Employment {
            career_id: career.id.clone(),
            title: entry.title,
            level: 1,
            salary: entry.salary,
            years_at_level: 0,
            years_experience: 0,
            performance: 50,
        });
        ActionResult::Applied(log)
    }

    /// Promote if every requirement of the next rung is met.
    fn check_promotion(&self, character: &mut Character, log: &mut Chronicle) -> bool {
        let Some(job) = character.career.employment() else {
            return false;
        };
        let Some(career) = self.career(&job.career_id) else {
            log::warn!("career: unknown career '{}' on employment record", job.career_id);
            return false;
        };
        let Some(next) = self.rung(career, job.level + 1) else {
            return false;
        };
        let qualified = job.years_at_level >= next.years_required
            && job.performance >= next.min_performance
            && next.min_stats.iter().all(|(stat, min)| character.stat(*stat) >= *min);
        if !qualified {
            return false;
        }

        let age = character.age();
        let CareerState::Employed(job) = &mut character.career else {
            return false;
        };
        job.level += 1;
        job.title = next.title.clone();
        job.salary = next.salary;
        job.years_at_level = 0;
        let event = SimEvent::Promoted {
            age,
            career_id: job.career_id.clone(),
            level: job.level,
            title: job.title.clone(),
            salary: job.salary,
        };
        log.narrate(format!("You were promoted to {}! Your salary is now {}k.", next.title, next.salary));
        log.emit(self.name(), event);
        StatBalancer::apply_one(character, Stat::Happiness, 5);
        true
    }
}

impl LifeSubsystem for CareerSubsystem {
    fn name(&self) -> &'static str {
        "career"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Career
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let age = character.age();
        let smarts = character.stat(Stat::Smarts);
        let happiness = character.stat(Stat::Happiness);
        let CareerState::Employed(job) = &mut character.career else {
            return;
        };
        job.years_at_level += 1;
        job.years_experience += 1;
        let swing = rng.range_i64(-5, 10) + (smarts - 50) / 10 + (happiness - 50) / 20;
        job.performance = (job.performance + swing).clamp(0, 100);
        log::debug!(
            "age={age} career: {} level={} performance={}",
            job.career_id,
            job.level,
            job.performance
        );
        self.check_promotion(character, log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{character::Gender, rng::ScriptedRng, stats::Stats};

    fn clerk() -> CareerDef {
        CareerDef {
            id: "clerk".into(),
            name: "Clerk".into(),
            required_education: None,
            min_smarts: 0,
            base_salary: 20,
            levels: Vec::new(),
        }
    }

    #[test]
    fn simplified_track_pays_base_plus_fifteen_per_level() {
        let careers = CareerSubsystem::new(CareerConfig::default(), vec![clerk()]);
        let mut c = Character::new("k".into(), "K".into(), 2000, Gender::Male, Stats::new(80, 80, 80, 50, 50, 0))
            .starting_at(20);
        assert!(careers.apply_action(&mut c, CareerAction::ApplyJob { career_id: "clerk".into() }).is_applied());
        assert_eq!(c.career.employment().unwrap().salary, 35);

        // Max swing each year: +10 plus stat bonuses.
        let mut rng = ScriptedRng::constant(0.999);
        let mut log = Chronicle::new();
        careers.advance(&mut c, &mut rng, &mut log);
        careers.advance(&mut c, &mut rng, &mut log);
        let job = c.career.employment().unwrap();
        assert_eq!(job.level, 2);
        assert_eq!(job.salary, 50);
        assert!(log.has_event(|e| matches!(e, SimEvent::Promoted { level: 2, .. })));
    }

    #[test]
    fn too_young_to_apply() {
        let careers = CareerSubsystem::new(CareerConfig::default(), vec![clerk()]);
        let mut c = Character::new("k".into(), "K".into(), 2000, Gender::Male, Stats::new(80, 80, 80, 50, 50, 0))
            .starting_at(15);
        let result = careers.apply_action(&mut c, CareerAction::ApplyJob { career_id: "clerk".into() });
        assert!(!result.is_applied());
        assert!(!c.has_job());
    }
}
