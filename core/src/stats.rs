//! Numeric attributes of a character and the effect maps that change them.
//!
//! Stat values are only writable from inside the crate, and the only
//! caller that writes them after creation is the StatBalancer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const STAT_MIN: i64 = 0;
pub const STAT_MAX: i64 = 100;

/// Every stat a content file or condition may name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Health,
    Happiness,
    Smarts,
    Looks,
    Relationships,
    /// Abstract currency in thousands ("k"). Floor of zero, no ceiling.
    Wealth,
    Fame,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Health,
        Stat::Happiness,
        Stat::Smarts,
        Stat::Looks,
        Stat::Relationships,
        Stat::Wealth,
        Stat::Fame,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Happiness => "happiness",
            Self::Smarts => "smarts",
            Self::Looks => "looks",
            Self::Relationships => "relationships",
            Self::Wealth => "wealth",
            Self::Fame => "fame",
        }
    }

    /// Upper bound, `None` for currency.
    pub fn ceiling(&self) -> Option<i64> {
        match self {
            Self::Wealth => None,
            _ => Some(STAT_MAX),
        }
    }

    pub fn bound(&self, value: i64) -> i64 {
        match self.ceiling() {
            Some(max) => value.clamp(STAT_MIN, max),
            None => value.max(STAT_MIN),
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stat::ALL
            .iter()
            .copied()
            .find(|stat| stat.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Named numeric skills, each in [0, 100].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    Coding,
    Fitness,
    Music,
    Art,
    Notoriety,
    Street,
    Leadership,
}

impl Skill {
    pub const ALL: [Skill; 7] = [
        Skill::Coding,
        Skill::Fitness,
        Skill::Music,
        Skill::Art,
        Skill::Notoriety,
        Skill::Street,
        Skill::Leadership,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Coding => "coding",
            Self::Fitness => "fitness",
            Self::Music => "music",
            Self::Art => "art",
            Self::Notoriety => "notoriety",
            Self::Street => "street",
            Self::Leadership => "leadership",
        }
    }
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Skill::ALL
            .iter()
            .copied()
            .find(|skill| skill.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// The bounded core attributes of a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    health: i64,
    happiness: i64,
    smarts: i64,
    looks: i64,
    relationships: i64,
    wealth: i64,
    fame: i64,
}

impl Stats {
    /// Build a stat block, clamping every value into its range.
    pub fn new(health: i64, happiness: i64, smarts: i64, looks: i64, relationships: i64, wealth: i64) -> Self {
        let mut stats = Self {
            health: 0,
            happiness: 0,
            smarts: 0,
            looks: 0,
            relationships: 0,
            wealth: 0,
            fame: 0,
        };
        stats.set(Stat::Health, health);
        stats.set(Stat::Happiness, happiness);
        stats.set(Stat::Smarts, smarts);
        stats.set(Stat::Looks, looks);
        stats.set(Stat::Relationships, relationships);
        stats.set(Stat::Wealth, wealth);
        stats
    }

    pub fn get(&self, stat: Stat) -> i64 {
        match stat {
            Stat::Health => self.health,
            Stat::Happiness => self.happiness,
            Stat::Smarts => self.smarts,
            Stat::Looks => self.looks,
            Stat::Relationships => self.relationships,
            Stat::Wealth => self.wealth,
            Stat::Fame => self.fame,
        }
    }

    pub fn health(&self) -> i64 { self.health }
    pub fn happiness(&self) -> i64 { self.happiness }
    pub fn smarts(&self) -> i64 { self.smarts }
    pub fn looks(&self) -> i64 { self.looks }
    pub fn relationships(&self) -> i64 { self.relationships }
    pub fn wealth(&self) -> i64 { self.wealth }
    pub fn fame(&self) -> i64 { self.fame }

    /// Raw write, clamped. Only the balancer and character creation call this.
    pub(crate) fn set(&mut self, stat: Stat, value: i64) {
        let value = stat.bound(value);
        match stat {
            Stat::Health => self.health = value,
            Stat::Happiness => self.happiness = value,
            Stat::Smarts => self.smarts = value,
            Stat::Looks => self.looks = value,
            Stat::Relationships => self.relationships = value,
            Stat::Wealth => self.wealth = value,
            Stat::Fame => self.fame = value,
        }
    }

    /// True when every stat already sits inside its range.
    pub fn within_bounds(&self) -> bool {
        Stat::ALL.iter().all(|s| s.bound(self.get(*s)) == self.get(*s))
    }
}

/// A partial map from stat to signed delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatEffects(BTreeMap<Stat, i64>);

impl StatEffects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; repeated stats accumulate.
    pub fn with(mut self, stat: Stat, delta: i64) -> Self {
        self.add(stat, delta);
        self
    }

    pub fn add(&mut self, stat: Stat, delta: i64) {
        *self.0.entry(stat).or_insert(0) += delta;
    }

    pub fn get(&self, stat: Stat) -> Option<i64> {
        self.0.get(&stat).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Stat, i64)> + '_ {
        self.0.iter().map(|(s, d)| (*s, *d))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// |sum of all deltas|, the figure recorded in choice history.
    pub fn magnitude(&self) -> i64 {
        self.0.values().sum::<i64>().abs()
    }
}

impl FromIterator<(Stat, i64)> for StatEffects {
    fn from_iter<I: IntoIterator<Item = (Stat, i64)>>(iter: I) -> Self {
        let mut effects = StatEffects::new();
        for (stat, delta) in iter {
            effects.add(stat, delta);
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stat_names_round_trip_through_from_str() {
        for stat in Stat::ALL {
            assert_eq!(stat.name().parse::<Stat>(), Ok(stat));
        }
        assert!("charisma".parse::<Stat>().is_err());
    }

    #[test]
    fn wealth_has_no_ceiling() {
        assert_eq!(Stat::Wealth.bound(5_000), 5_000);
        assert_eq!(Stat::Wealth.bound(-3), 0);
        assert_eq!(Stat::Looks.bound(140), 100);
    }

    #[test]
    fn magnitude_is_absolute_sum() {
        let fx = StatEffects::new().with(Stat::Happiness, -10).with(Stat::Wealth, 4);
        assert_eq!(fx.magnitude(), 6);
    }
}
