//! Subsystem trait.
//!
//! RULE: Every yearly state machine implements LifeSubsystem.
//! The TurnProcessor calls advance() on each registered subsystem
//! in registration order, once per turn.
//! Execution order is fixed and documented in turn.rs.

use crate::{
    career_subsystem::CareerSubsystem,
    character::Character,
    config::SimConfig,
    content::ContentPack,
    crime_subsystem::CrimeSubsystem,
    drift_subsystem::DriftSubsystem,
    education_subsystem::EducationSubsystem,
    event::Chronicle,
    family_subsystem::FamilySubsystem,
    finance_subsystem::FinanceSubsystem,
    health_subsystem::HealthSubsystem,
    prison_subsystem::PrisonSubsystem,
    rng::{RandomSource, SubsystemSlot},
};

/// The contract every yearly subsystem must fulfill.
pub trait LifeSubsystem: Send {
    /// Unique stable name for this subsystem.
    fn name(&self) -> &'static str;

    /// RNG slot this subsystem draws from.
    fn slot(&self) -> SubsystemSlot;

    /// Whether the subsystem keeps running while the character is
    /// incarcerated. The prison state machine has exclusive control
    /// otherwise.
    fn runs_in_custody(&self) -> bool {
        false
    }

    /// Advance the owned slice of the character by one year.
    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle);
}

/// Outcome of a player-initiated action against a subsystem.
///
/// A rejection carries a short human-readable reason and guarantees
/// that nothing on the character changed.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    Applied(Chronicle),
    Rejected { reason: String },
}

impl ActionResult {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected { reason: reason.into() }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn narrative(&self) -> &[String] {
        match self {
            Self::Applied(log) => &log.narrative,
            Self::Rejected { .. } => &[],
        }
    }
}

/// Every subsystem of a run, built once from config and content.
pub struct Subsystems {
    pub prison: PrisonSubsystem,
    pub education: EducationSubsystem,
    pub finance: FinanceSubsystem,
    pub drift: DriftSubsystem,
    pub family: FamilySubsystem,
    pub crime: CrimeSubsystem,
    pub health: HealthSubsystem,
    pub career: CareerSubsystem,
}

impl Subsystems {
    pub fn new(config: &SimConfig, content: &ContentPack) -> Self {
        Self {
            prison: PrisonSubsystem::new(config.prison.clone()),
            education: EducationSubsystem::new(config.finance.clone()),
            finance: FinanceSubsystem::new(config.finance.clone()),
            drift: DriftSubsystem::new(config.drift.clone()),
            family: FamilySubsystem,
            crime: CrimeSubsystem::new(config.crime.clone(), content.operations.clone()),
            health: HealthSubsystem::new(config.health.clone(), content.conditions.clone()),
            career: CareerSubsystem::new(config.career.clone(), content.careers.clone()),
        }
    }

    /// The yearly advancement phase, in execution order. Serving time
    /// comes first so a release this year frees the character for the
    /// rest of the turn.
    pub fn yearly(&self) -> [&dyn LifeSubsystem; 6] {
        [&self.prison, &self.education, &self.finance, &self.drift, &self.family, &self.crime]
    }
}
