//! Crime / syndicate state machine.
//!
//! Rank ladder:
//!   unaffiliated → associate → soldier → caporegime → underboss → godfather
//!
//!   - unaffiliated → associate: `JoinSyndicate` once crimes ≥ 5 and age ≥ 18.
//!   - associate → soldier: only through the murder-assignment event choice.
//!   - soldier and above: automatic once crimes, earnings and loyalty clear
//!     the next rank's thresholds. Checked after every crime.
//!   - informant: orthogonal; any affiliated rank may flip through an event
//!     choice. Evidence accumulates yearly and ends in witness protection
//!     or death.
//!
//! A crime attempt is a three-way draw: arrest (checked first), success
//! or failure. Arrest hands the character to the prison state machine.

use crate::{
    balancer::StatBalancer,
    character::{Character, DeathCause},
    config::CrimeConfig,
    event::{Chronicle, SimEvent},
    prison_subsystem,
    rng::{RandomSource, SubsystemSlot},
    stats::{Skill, Stat},
    subsystem::{ActionResult, LifeSubsystem},
    types::Age,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    #[default]
    Unaffiliated,
    Associate,
    Soldier,
    Caporegime,
    Underboss,
    Godfather,
}

impl Rank {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unaffiliated => "unaffiliated",
            Self::Associate => "associate",
            Self::Soldier => "soldier",
            Self::Caporegime => "caporegime",
            Self::Underboss => "underboss",
            Self::Godfather => "godfather",
        }
    }

    pub fn next(&self) -> Option<Rank> {
        match self {
            Self::Unaffiliated => Some(Self::Associate),
            Self::Associate => Some(Self::Soldier),
            Self::Soldier => Some(Self::Caporegime),
            Self::Caporegime => Some(Self::Underboss),
            Self::Underboss => Some(Self::Godfather),
            Self::Godfather => None,
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeType {
    PettyTheft,
    Vandalism,
    Burglary,
    Assault,
    Fraud,
    DrugDealing,
    Robbery,
    Extortion,
    Murder,
}

impl CrimeType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PettyTheft => "petty theft",
            Self::Vandalism => "vandalism",
            Self::Burglary => "burglary",
            Self::Assault => "assault",
            Self::Fraud => "fraud",
            Self::DrugDealing => "drug dealing",
            Self::Robbery => "armed robbery",
            Self::Extortion => "extortion",
            Self::Murder => "murder",
        }
    }

    /// 1 (minor) – 3 (violent felony).
    pub fn severity(&self) -> u8 {
        match self {
            Self::PettyTheft | Self::Vandalism => 1,
            Self::Burglary | Self::Fraud | Self::DrugDealing | Self::Assault => 2,
            Self::Robbery | Self::Extortion | Self::Murder => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InformantStatus {
    #[default]
    None,
    Active { evidence_collected: u32, evidence_required: u32 },
    WitnessProtection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeState {
    pub rank: Rank,
    pub made: bool,
    /// 0 – 100
    pub loyalty: i64,
    pub reputation: i64,
    /// Never decreases.
    pub crimes_committed: u32,
    pub total_earnings: i64,
    /// 0 – 100
    pub suspicion: i64,
    pub informant: InformantStatus,
}

impl Default for CrimeState {
    fn default() -> Self {
        Self {
            rank: Rank::Unaffiliated,
            made: false,
            loyalty: 0,
            reputation: 0,
            crimes_committed: 0,
            total_earnings: 0,
            suspicion: 0,
            informant: InformantStatus::None,
        }
    }
}

impl CrimeState {
    pub fn is_informant(&self) -> bool {
        matches!(self.informant, InformantStatus::Active { .. })
    }

    fn add_suspicion(&mut self, delta: i64) {
        self.suspicion = (self.suspicion + delta).clamp(0, 100);
    }

    fn add_loyalty(&mut self, delta: i64) {
        self.loyalty = (self.loyalty + delta).clamp(0, 100);
    }
}

/// Authored crime operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeOperation {
    pub id: String,
    pub name: String,
    pub crime_type: CrimeType,
    /// Percent.
    pub success_rate: u32,
    /// Percent.
    pub arrest_chance: u32,
    /// Inclusive payout range in thousands.
    pub payout: (i64, i64),
    pub suspicion: i64,
    #[serde(default)]
    pub min_rank: Rank,
    #[serde(default)]
    pub min_age: Option<Age>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrimeOutcome {
    Success { payout: i64 },
    Failure,
    Arrested,
}

impl CrimeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure => "failure",
            Self::Arrested => "arrested",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrimeAction {
    CommitCrime { operation_id: String },
    JoinSyndicate,
    AcceptMurderAssignment,
    BecomeInformant,
}

struct RankThreshold {
    rank: Rank,
    min_crimes: u32,
    min_earnings: i64,
    min_loyalty: i64,
}

const RANK_THRESHOLDS: &[RankThreshold] = &[
    RankThreshold {
        rank: Rank::Caporegime,
        min_crimes: 20,
        min_earnings: 200,
        min_loyalty: 60,
    },
    RankThreshold {
        rank: Rank::Underboss,
        min_crimes: 40,
        min_earnings: 600,
        min_loyalty: 75,
    },
    RankThreshold {
        rank: Rank::Godfather,
        min_crimes: 70,
        min_earnings: 1500,
        min_loyalty: 90,
    },
];

pub struct CrimeSubsystem {
    config: CrimeConfig,
    operations: Vec<CrimeOperation>,
}

impl CrimeSubsystem {
    pub fn new(config: CrimeConfig, operations: Vec<CrimeOperation>) -> Self {
        Self { config, operations }
    }

    pub fn operation(&self, id: &str) -> Option<&CrimeOperation> {
        self.operations.iter().find(|o| o.id == id)
    }

    pub fn apply_action(
        &self,
        character: &mut Character,
        action: CrimeAction,
        rng: &mut dyn RandomSource,
    ) -> ActionResult {
        match action {
            CrimeAction::CommitCrime { operation_id } => {
                let Some(op) = self.operation(&operation_id) else {
                    return ActionResult::rejected(format!("There is no job called '{operation_id}'."));
                };
                if character.is_in_prison() {
                    return ActionResult::rejected("You can't pull that off from a cell.");
                }
                let min_age = op.min_age.unwrap_or(self.config.min_age);
                if character.age() < min_age {
                    return ActionResult::rejected("You're too young for that.");
                }
                if character.crime.rank < op.min_rank {
                    return ActionResult::rejected(format!("Only a {} or higher gets that job.", op.min_rank));
                }
                let mut log = Chronicle::new();
                self.commit(character, op, rng, &mut log);
                ActionResult::Applied(log)
            }
            CrimeAction::JoinSyndicate => self.join(character),
            CrimeAction::AcceptMurderAssignment => self.accept_murder_assignment(character),
            CrimeAction::BecomeInformant => self.become_informant(character),
        }
    }

    /// Resolve one crime attempt. The arrest roll takes precedence over
    /// the success roll.
    pub fn commit(
        &self,
        character: &mut Character,
        op: &CrimeOperation,
        rng: &mut dyn RandomSource,
        log: &mut Chronicle,
    ) -> CrimeOutcome {
        let success_roll = rng.next_f64();
        let arrest_roll = rng.next_f64();
        let age = character.age();

        let crime = &mut character.crime;
        crime.crimes_committed += 1;
        let arrest_pct = op.arrest_chance as f64
            + (crime.suspicion / self.config.suspicion_arrest_divisor.max(1)) as f64;
        let arrest_p = (arrest_pct / 100.0).clamp(0.0, 1.0);
        let affiliated = crime.rank > Rank::Unaffiliated;

        let outcome = if arrest_roll < arrest_p {
            crime.add_suspicion(op.suspicion);
            CrimeOutcome::Arrested
        } else if success_roll < op.success_rate as f64 / 100.0 {
            let payout = rng.range_i64(op.payout.0, op.payout.1);
            crime.total_earnings += payout;
            crime.add_suspicion((op.suspicion / 2).max(1));
            crime.reputation += 2;
            if affiliated {
                crime.add_loyalty(1);
            }
            CrimeOutcome::Success { payout }
        } else {
            crime.add_suspicion(op.suspicion);
            if affiliated {
                crime.add_loyalty(-5);
            }
            CrimeOutcome::Failure
        };

        let payout = match outcome {
            CrimeOutcome::Success { payout } => payout,
            _ => 0,
        };
        log.emit(
            self.name(),
            SimEvent::CrimeCommitted {
                age,
                operation_id: op.id.clone(),
                outcome: outcome.label().to_string(),
                payout,
            },
        );

        match outcome {
            CrimeOutcome::Success { payout } => {
                StatBalancer::apply_one(character, Stat::Wealth, payout);
                StatBalancer::apply_skills(character, &BTreeMap::from([(Skill::Street, 2)]));
                log.narrate(format!("The {} went off without a hitch. You walked away with {payout}k.", op.name));
            }
            CrimeOutcome::Failure => {
                StatBalancer::apply_one(character, Stat::Happiness, -3);
                log.narrate(format!("The {} fell apart. You got away with nothing.", op.name));
            }
            CrimeOutcome::Arrested => {
                log.narrate(format!("The police caught you in the middle of the {}.", op.name));
                prison_subsystem::arrest(character, op.crime_type, rng, log);
            }
        }

        self.check_rank_up(character, log);
        outcome
    }

    fn join(&self, character: &mut Character) -> ActionResult {
        if character.crime.rank != Rank::Unaffiliated {
            return ActionResult::rejected("You're already part of the family.");
        }
        if character.is_in_prison() {
            return ActionResult::rejected("The family doesn't recruit inside.");
        }
        if character.crime.crimes_committed < self.config.join_min_crimes {
            return ActionResult::rejected("The family doesn't know your name yet. Prove yourself first.");
        }
        if character.age() < self.config.join_min_age {
            return ActionResult::rejected("Come back when you're older, kid.");
        }
        let mut log = Chronicle::new();
        self.set_rank(character, Rank::Associate, &mut log);
        character.crime.add_loyalty(50);
        log.narrate("You were taken in as an associate of the family.");
        ActionResult::Applied(log)
    }

    fn accept_murder_assignment(&self, character: &mut Character) -> ActionResult {
        if character.crime.rank != Rank::Associate {
            return ActionResult::rejected("Only associates are offered that kind of work.");
        }
        let mut log = Chronicle::new();
        let crime = &mut character.crime;
        crime.crimes_committed += 1;
        crime.made = true;
        crime.add_loyalty(20);
        crime.add_suspicion(15);
        self.set_rank(character, Rank::Soldier, &mut log);
        StatBalancer::apply_one(character, Stat::Happiness, -10);
        log.narrate("You carried out the job. You're a made member of the family now.");
        ActionResult::Applied(log)
    }

    fn become_informant(&self, character: &mut Character) -> ActionResult {
        if character.crime.informant != InformantStatus::None {
            return ActionResult::rejected("You've already talked to the feds.");
        }
        character.crime.informant = InformantStatus::Active {
            evidence_collected: 0,
            evidence_required: self.config.informant_evidence_required,
        };
        character.flags.insert("informant".into());
        let mut log = Chronicle::new();
        log.narrate("You agreed to wear a wire for the feds.");
        ActionResult::Applied(log)
    }

    fn set_rank(&self, character: &mut Character, to: Rank, log: &mut Chronicle) {
        let from = character.crime.rank;
        character.crime.rank = to;
        log.emit(self.name(), SimEvent::RankChanged { age: character.age(), from, to });
    }

    /// Automatic promotion for soldiers and above.
    fn check_rank_up(&self, character: &mut Character, log: &mut Chronicle) {
        let crime = &character.crime;
        if crime.rank < Rank::Soldier || crime.is_informant() {
            return;
        }
        let Some(next) = crime.rank.next() else {
            return;
        };
        let Some(t) = RANK_THRESHOLDS.iter().find(|t| t.rank == next) else {
            return;
        };
        if crime.crimes_committed >= t.min_crimes
            && crime.total_earnings >= t.min_earnings
            && crime.loyalty >= t.min_loyalty
        {
            self.set_rank(character, next, log);
            StatBalancer::apply_skills(character, &BTreeMap::from([(Skill::Leadership, 5)]));
            log.narrate(format!("The family rewarded your work. You are now a {next}."));
        }
    }

    fn advance_informant(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let InformantStatus::Active { evidence_collected, evidence_required } = character.crime.informant else {
            return;
        };
        let age = character.age();
        let collected = evidence_collected + rng.range_i64(1, 3) as u32;
        if collected >= evidence_required {
            let crime = &mut character.crime;
            crime.informant = InformantStatus::WitnessProtection;
            crime.rank = Rank::Unaffiliated;
            crime.made = false;
            character.flags.insert("witness_protection".into());
            log.narrate("Your testimony brought down the family. You start over under a new name.");
            log.emit(self.name(), SimEvent::InformantResolved { age, protected: true });
            return;
        }

        character.crime.informant = InformantStatus::Active { evidence_collected: collected, evidence_required };
        let death_chance = self.config.informant_death_base + character.crime.suspicion as f64 / 200.0;
        if rng.chance(death_chance) {
            character.fatal_cause = Some(DeathCause::Killed { by: "the family".into() });
            log.narrate("The family found out you were wearing a wire.");
            log.emit(self.name(), SimEvent::InformantResolved { age, protected: false });
        }
    }
}

impl LifeSubsystem for CrimeSubsystem {
    fn name(&self) -> &'static str {
        "crime"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Crime
    }

    fn runs_in_custody(&self) -> bool {
        true
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        character.crime.add_suspicion(-self.config.suspicion_decay);
        self.advance_informant(character, rng, log);
    }
}
