//! The simulated character: identity, stats, and every subsystem-owned
//! sub-record. Subsystems own their slice; stats and skills are only
//! written through the StatBalancer.

use crate::{
    career_subsystem::CareerState,
    crime_subsystem::CrimeState,
    education_subsystem::{EducationRecord, EducationStage},
    finance_subsystem::Finances,
    health_subsystem::ActiveCondition,
    prison_subsystem::PrisonRecord,
    stats::{Skill, Stat, StatEffects, Stats, STAT_MAX, STAT_MIN},
    types::{Age, CharacterId, EventId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
    Nonbinary,
}

/// Fixed age buckets used by conditions, health tables and weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Baby,
    Toddler,
    Child,
    Teen,
    YoungAdult,
    Adult,
    MiddleAged,
    Senior,
}

impl LifeStage {
    pub fn from_age(age: Age) -> Self {
        match age {
            0 => Self::Baby,
            1..=3 => Self::Toddler,
            4..=12 => Self::Child,
            13..=17 => Self::Teen,
            18..=29 => Self::YoungAdult,
            30..=49 => Self::Adult,
            50..=64 => Self::MiddleAged,
            _ => Self::Senior,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Baby => "Baby",
            Self::Toddler => "Toddler",
            Self::Child => "Child",
            Self::Teen => "Teen",
            Self::YoungAdult => "Young Adult",
            Self::Adult => "Adult",
            Self::MiddleAged => "Middle-aged",
            Self::Senior => "Senior",
        }
    }
}

impl fmt::Display for LifeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    #[default]
    Single,
    Dating,
    Married,
    Divorced,
    Widowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Mother,
    Father,
    Sibling,
    Spouse,
    Child,
}

impl Relation {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mother => "mother",
            Self::Father => "father",
            Self::Sibling => "sibling",
            Self::Spouse => "spouse",
            Self::Child => "child",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub relation: Relation,
    pub name: String,
    pub age: Age,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    /// Value in thousands.
    pub value: i64,
    pub acquired_at: Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayedKind {
    /// A large windfall draws unwanted attention a year later.
    WealthGainAttention,
    /// Authored follow-up of a choice.
    FollowUp,
}

/// A consequence scheduled for a future age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayedEvent {
    pub target_age: Age,
    pub kind: DelayedKind,
    pub description: String,
    #[serde(default)]
    pub effects: StatEffects,
    #[serde(default)]
    pub skills: BTreeMap<Skill, i64>,
    pub source_event: Option<EventId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorDecision {
    pub age: Age,
    pub decision: String,
    pub source_event: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeathCause {
    Illness,
    OldAge,
    Killed { by: String },
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Illness => f.write_str("failing health"),
            Self::OldAge => f.write_str("old age"),
            Self::Killed { by } => write!(f, "being killed by {by}"),
        }
    }
}

/// Terminal marker. Once set the character is read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOver {
    pub age: Age,
    pub cause: DeathCause,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub birth_year: i32,
    pub gender: Gender,
    age: Age,
    stats: Stats,
    skills: BTreeMap<Skill, i64>,
    pub flags: BTreeSet<String>,
    pub relationship_status: RelationshipStatus,
    pub family: Vec<FamilyMember>,
    pub assets: Vec<Asset>,
    pub delayed_events: Vec<DelayedEvent>,
    pub major_decisions: Vec<MajorDecision>,
    pub education: EducationRecord,
    pub career: CareerState,
    pub finances: Finances,
    pub conditions: Vec<ActiveCondition>,
    pub crime: CrimeState,
    pub prison: PrisonRecord,
    pub achievements: Vec<String>,
    /// Set by a subsystem when the character is killed outright;
    /// the termination check turns it into a GameOver.
    pub fatal_cause: Option<DeathCause>,
    pub game_over: Option<GameOver>,
}

impl Character {
    /// A newborn at age 0.
    pub fn new(id: CharacterId, name: String, birth_year: i32, gender: Gender, stats: Stats) -> Self {
        Self {
            id,
            name,
            birth_year,
            gender,
            age: 0,
            stats,
            skills: BTreeMap::new(),
            flags: BTreeSet::new(),
            relationship_status: RelationshipStatus::Single,
            family: Vec::new(),
            assets: Vec::new(),
            delayed_events: Vec::new(),
            major_decisions: Vec::new(),
            education: EducationRecord::default(),
            career: CareerState::Unemployed,
            finances: Finances::default(),
            conditions: Vec::new(),
            crime: CrimeState::default(),
            prison: PrisonRecord::default(),
            achievements: Vec::new(),
            fatal_cause: None,
            game_over: None,
        }
    }

    /// Start the record at a given age instead of 0. For fixtures and
    /// imported lives; a running simulation only ever ages by one.
    pub fn starting_at(mut self, age: Age) -> Self {
        self.age = age;
        self
    }

    pub fn age(&self) -> Age {
        self.age
    }

    pub(crate) fn advance_age(&mut self) -> Age {
        self.age += 1;
        self.age
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut Stats {
        &mut self.stats
    }

    pub fn stat(&self, stat: Stat) -> i64 {
        self.stats.get(stat)
    }

    pub fn skill(&self, skill: Skill) -> i64 {
        self.skills.get(&skill).copied().unwrap_or(0)
    }

    pub fn skills(&self) -> &BTreeMap<Skill, i64> {
        &self.skills
    }

    pub(crate) fn set_skill(&mut self, skill: Skill, value: i64) {
        self.skills.insert(skill, value.clamp(STAT_MIN, STAT_MAX));
    }

    pub fn life_stage(&self) -> LifeStage {
        LifeStage::from_age(self.age)
    }

    pub fn has_job(&self) -> bool {
        self.career.is_employed()
    }

    pub fn has_education(&self, stage: EducationStage) -> bool {
        self.education.completed.contains(&stage)
    }

    pub fn is_in_prison(&self) -> bool {
        self.prison.is_in_prison()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    /// Insert keeping the queue ordered by target age.
    pub fn schedule(&mut self, delayed: DelayedEvent) {
        let at = self
            .delayed_events
            .partition_point(|d| d.target_age <= delayed.target_age);
        self.delayed_events.insert(at, delayed);
    }

    /// Remove and return every delayed event whose target age has arrived.
    pub fn take_due_events(&mut self) -> Vec<DelayedEvent> {
        let age = self.age;
        let split = self.delayed_events.partition_point(|d| d.target_age <= age);
        self.delayed_events.drain(..split).collect()
    }

    pub fn living_relative(&mut self, relation: Relation) -> Option<&mut FamilyMember> {
        self.family.iter_mut().find(|m| m.relation == relation && m.alive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn newborn() -> Character {
        Character::new("c1".into(), "Test".into(), 2000, Gender::Female, Stats::new(80, 50, 50, 50, 50, 0))
    }

    #[test]
    fn life_stage_buckets() {
        assert_eq!(LifeStage::from_age(0), LifeStage::Baby);
        assert_eq!(LifeStage::from_age(3), LifeStage::Toddler);
        assert_eq!(LifeStage::from_age(12), LifeStage::Child);
        assert_eq!(LifeStage::from_age(17), LifeStage::Teen);
        assert_eq!(LifeStage::from_age(18), LifeStage::YoungAdult);
        assert_eq!(LifeStage::from_age(49), LifeStage::Adult);
        assert_eq!(LifeStage::from_age(64), LifeStage::MiddleAged);
        assert_eq!(LifeStage::from_age(65), LifeStage::Senior);
    }

    #[test]
    fn delayed_queue_stays_ordered_and_drains_due_entries() {
        let mut c = newborn().starting_at(10);
        for target in [13, 11, 12] {
            c.schedule(DelayedEvent {
                target_age: target,
                kind: DelayedKind::FollowUp,
                description: format!("at {target}"),
                effects: StatEffects::new(),
                skills: BTreeMap::new(),
                source_event: None,
            });
        }
        let order: Vec<Age> = c.delayed_events.iter().map(|d| d.target_age).collect();
        assert_eq!(order, vec![11, 12, 13]);

        c.advance_age();
        c.advance_age();
        let due = c.take_due_events();
        assert_eq!(due.len(), 2);
        assert_eq!(c.delayed_events.len(), 1);
    }
}
