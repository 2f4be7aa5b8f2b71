//! Natural stat drift: the slow age- and health-correlated wear of a
//! life, plus the young-adult recovery chance.
//!
//! Execution: every turn, including in custody.

use crate::{
    balancer::StatBalancer,
    character::Character,
    config::DriftConfig,
    event::Chronicle,
    rng::{RandomSource, SubsystemSlot},
    stats::{Stat, StatEffects},
    subsystem::LifeSubsystem,
};

pub struct DriftSubsystem {
    config: DriftConfig,
}

impl DriftSubsystem {
    pub fn new(config: DriftConfig) -> Self {
        Self { config }
    }

    fn yearly_effects(&self, character: &Character, rng: &mut dyn RandomSource) -> StatEffects {
        let age = character.age();
        let mut fx = StatEffects::new();

        let health_loss = match age {
            80.. => rng.range_i64(2, 6),
            65.. => rng.range_i64(1, 4),
            50.. => rng.range_i64(0, 2),
            _ => 0,
        };
        if health_loss > 0 {
            fx.add(Stat::Health, -health_loss);
        }
        if character.stat(Stat::Health) < 40 {
            fx.add(Stat::Happiness, -rng.range_i64(0, 2));
        }

        fx.add(Stat::Happiness, rng.range_i64(-2, 2));

        if age >= 60 {
            fx.add(Stat::Looks, -rng.range_i64(0, 2));
        } else if age >= 40 {
            fx.add(Stat::Looks, -rng.range_i64(0, 1));
        }
        if age >= 70 {
            fx.add(Stat::Smarts, -rng.range_i64(0, 1));
        }
        fx
    }
}

impl LifeSubsystem for DriftSubsystem {
    fn name(&self) -> &'static str {
        "drift"
    }

    fn slot(&self) -> SubsystemSlot {
        SubsystemSlot::Drift
    }

    fn runs_in_custody(&self) -> bool {
        true
    }

    fn advance(&self, character: &mut Character, rng: &mut dyn RandomSource, log: &mut Chronicle) {
        let fx = self.yearly_effects(character, rng);
        StatBalancer::apply(character, &fx);

        let age = character.age();
        let recovering_age = (self.config.recovery_min_age..=self.config.recovery_max_age).contains(&age);
        if recovering_age
            && character.stat(Stat::Health) < self.config.recovery_health_threshold
            && rng.chance(self.config.recovery_chance)
        {
            StatBalancer::apply_one(character, Stat::Health, self.config.recovery_amount);
            log.narrate("Your body bounced back. You feel much healthier this year.");
        }
        log::debug!("age={age} drift: {fx:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{character::Gender, rng::ScriptedRng, stats::Stats};

    #[test]
    fn young_adult_with_poor_health_can_recover() {
        let drift = DriftSubsystem::new(DriftConfig::default());
        let mut c = Character::new("d".into(), "D".into(), 2000, Gender::Female, Stats::new(20, 50, 50, 50, 50, 0))
            .starting_at(25);
        // 0.5 → zero happiness change for the range draws; 0.1 < 0.3 passes recovery.
        let mut rng = ScriptedRng::new(vec![0.0, 0.5, 0.1]);
        let mut log = Chronicle::new();
        drift.advance(&mut c, &mut rng, &mut log);
        assert_eq!(c.stat(Stat::Health), 35);
        assert_eq!(log.narrative.len(), 1);
    }
}
