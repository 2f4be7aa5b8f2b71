//! Family: relatives age alongside the character and may pass away.
//!
//! Execution: every turn, including in custody.

use crate::{
    balancer::StatBalancer,
    character::{Character, Relation, RelationshipStatus},
    event::{Chronicle, SimEvent},
    rng::{RandomSource, SubsystemSlot},
    stats::Stat,
    subsystem::LifeSubsystem,
    types::Age,
};

const MORTALITY_ONSET: Age = 70;
const GRIEF: i64 = -8;

pub struct FamilySubsystem;

impl FamilySubsystem {
    /// Yearly chance that a relative of `age` dies.
    pub fn mortality(age: Age) -> f64 {
        if age <= MORTALITY_ONSET {
            return 0.0;
        }
        (0.01 + (age - MORTALITY_ONSET) as f64 * 0.01).min(1.0)
    }
}

impl LifeSubsystem for FamilySubsystem {
    fn name(&self) -> &'static str {
        "family"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Family
    }

    fn runs_in_custody(&self) -> bool {
        true
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let age = character.age();
        let mut losses = Vec::new();
        for member in character.family.iter_mut().filter(|m| m.alive) {
            member.age += 1;
            if rng.chance(Self::mortality(member.age)) {
                member.alive = false;
                losses.push((member.relation, member.name.clone(), member.age));
            }
        }

        for (relation, name, died_at) in losses {
            StatBalancer::apply_one(character, Stat::Happiness, GRIEF);
            if relation == Relation::Spouse {
                character.relationship_status = RelationshipStatus::Widowed;
            }
            log.narrate(format!("Your {} {name} passed away at {died_at}.", relation.label()));
            log.emit(
                self.name(),
                SimEvent::RelativeDied { age, relation: relation.label().to_string(), name },
            );
        }
    }
}
