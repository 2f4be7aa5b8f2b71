//! Authored events and the immutable catalog that holds them.
//!
//! Content arrives as JSON in a "raw" shape where stats and skills are
//! plain strings. `ContentLoader` turns raw content into typed events,
//! resolving every name against the closed `Stat`/`Skill` enums. In
//! strict mode the first violation is an error; otherwise the offending
//! entry is dropped with a warning and loading continues.

use crate::{
    character::{LifeStage, RelationshipStatus},
    crime_subsystem::{CrimeType, Rank},
    education_subsystem::EducationStage,
    error::ContentError,
    stats::{Skill, Stat, StatEffects},
    types::{Age, EventId},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Education,
    Career,
    Relationship,
    Health,
    Finance,
    Crime,
    Family,
    Achievement,
    Decision,
    Random,
    Prison,
    Social,
}

/// Eligibility predicate of an event. Every populated field must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Conditions {
    pub min_age: Option<Age>,
    pub max_age: Option<Age>,
    pub life_stage: Option<LifeStage>,
    pub min_stats: BTreeMap<Stat, i64>,
    pub max_stats: BTreeMap<Stat, i64>,
    pub has_job: Option<bool>,
    pub has_education: Option<EducationStage>,
    /// Chance in (0, 1] that the event is eligible on a given roll.
    pub probability: Option<f64>,
    /// Some(true): only while incarcerated. Otherwise never while incarcerated.
    pub in_prison: Option<bool>,
    pub crime_rank: Option<Rank>,
    pub requires_flag: Option<String>,
    pub excludes_flag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    pub text: String,
    /// Falls back to the configured consequence chance when absent.
    #[serde(default)]
    pub probability: Option<f64>,
}

/// A follow-up effect delivered `years` after the choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FollowUp {
    pub years: u32,
    pub description: String,
    pub effects: StatEffects,
    pub skills: BTreeMap<Skill, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetGrant {
    pub name: String,
    pub value: i64,
}

/// Subsystem transition a choice can trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChoiceAction {
    ApplyJob { career_id: String },
    QuitJob,
    EnrollUniversity,
    JoinSyndicate,
    AcceptMurderAssignment,
    BecomeInformant,
    AttemptEscape,
    Arrest { crime_type: CrimeType },
}

impl ChoiceAction {
    /// Actions that count as a major life decision.
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            Self::ApplyJob { .. } | Self::QuitJob | Self::EnrollUniversity
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub effects: StatEffects,
    pub skills: BTreeMap<Skill, i64>,
    pub flags: Vec<String>,
    pub consequences: Vec<Consequence>,
    pub delayed: Option<FollowUp>,
    pub action: Option<ChoiceAction>,
    pub relationship: Option<RelationshipStatus>,
    pub asset: Option<AssetGrant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub category: EventCategory,
    pub weight: Option<f64>,
    pub conditions: Conditions,
    /// Applied directly when the event has no choices.
    pub effects: StatEffects,
    pub choices: Vec<Choice>,
}

impl Event {
    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(1.0)
    }

    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == choice_id)
    }

    /// A passive event resolves itself without waiting for the player.
    pub fn is_passive(&self) -> bool {
        self.choices.is_empty()
    }
}

// ── Raw content shapes ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConditions {
    min_age: Option<Age>,
    max_age: Option<Age>,
    life_stage: Option<LifeStage>,
    #[serde(default)]
    min_stats: BTreeMap<String, i64>,
    #[serde(default)]
    max_stats: BTreeMap<String, i64>,
    has_job: Option<bool>,
    has_education: Option<EducationStage>,
    probability: Option<f64>,
    in_prison: Option<bool>,
    crime_rank: Option<Rank>,
    requires_flag: Option<String>,
    excludes_flag: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawFollowUp {
    years: u32,
    description: String,
    #[serde(default)]
    effects: BTreeMap<String, i64>,
    #[serde(default)]
    skills: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawChoice {
    id: String,
    text: String,
    #[serde(default)]
    effects: BTreeMap<String, i64>,
    #[serde(default)]
    skills: BTreeMap<String, i64>,
    #[serde(default)]
    flags: Vec<String>,
    #[serde(default)]
    consequences: Vec<Consequence>,
    delayed: Option<RawFollowUp>,
    action: Option<ChoiceAction>,
    relationship: Option<RelationshipStatus>,
    asset: Option<AssetGrant>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEvent {
    id: String,
    title: String,
    description: String,
    category: EventCategory,
    weight: Option<f64>,
    #[serde(default)]
    conditions: RawConditions,
    #[serde(default)]
    effects: BTreeMap<String, i64>,
    #[serde(default)]
    choices: Vec<RawChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCatalogFile {
    #[serde(default)]
    dynamic: Vec<RawEvent>,
    #[serde(default)]
    random: Vec<RawEvent>,
    #[serde(default, rename = "static")]
    static_pool: Vec<RawEvent>,
}

/// Resolves raw names into typed content.
#[derive(Debug, Clone, Copy)]
pub struct ContentLoader {
    pub strict: bool,
}

impl ContentLoader {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Surface a violation: an error in strict mode, a warning otherwise.
    pub fn violation(&self, err: ContentError) -> Result<(), ContentError> {
        if self.strict {
            Err(err)
        } else {
            log::warn!("content: skipping entry: {err}");
            Ok(())
        }
    }

    pub fn stat_map(
        &self,
        owner: &str,
        raw: &BTreeMap<String, i64>,
    ) -> Result<BTreeMap<Stat, i64>, ContentError> {
        let mut out = BTreeMap::new();
        for (name, value) in raw {
            match name.parse::<Stat>() {
                Ok(stat) => {
                    out.insert(stat, *value);
                }
                Err(name) => self.violation(ContentError::UnknownStat {
                    owner: owner.to_string(),
                    name,
                })?,
            }
        }
        Ok(out)
    }

    pub fn effects(&self, owner: &str, raw: &BTreeMap<String, i64>) -> Result<StatEffects, ContentError> {
        Ok(self.stat_map(owner, raw)?.into_iter().collect())
    }

    pub fn skills(
        &self,
        owner: &str,
        raw: &BTreeMap<String, i64>,
    ) -> Result<BTreeMap<Skill, i64>, ContentError> {
        let mut out = BTreeMap::new();
        for (name, value) in raw {
            match name.parse::<Skill>() {
                Ok(skill) => {
                    out.insert(skill, *value);
                }
                Err(name) => self.violation(ContentError::UnknownSkill {
                    owner: owner.to_string(),
                    name,
                })?,
            }
        }
        Ok(out)
    }

    fn conditions(&self, owner: &str, raw: &RawConditions) -> Result<Option<Conditions>, ContentError> {
        if let Some(p) = raw.probability {
            if !(p > 0.0 && p <= 1.0) {
                self.violation(ContentError::MalformedCondition {
                    owner: owner.to_string(),
                    reason: format!("probability {p} outside (0, 1]"),
                })?;
                return Ok(None);
            }
        }
        if let (Some(lo), Some(hi)) = (raw.min_age, raw.max_age) {
            if lo > hi {
                self.violation(ContentError::MalformedCondition {
                    owner: owner.to_string(),
                    reason: format!("min_age {lo} > max_age {hi}"),
                })?;
                return Ok(None);
            }
        }
        Ok(Some(Conditions {
            min_age: raw.min_age,
            max_age: raw.max_age,
            life_stage: raw.life_stage,
            min_stats: self.stat_map(owner, &raw.min_stats)?,
            max_stats: self.stat_map(owner, &raw.max_stats)?,
            has_job: raw.has_job,
            has_education: raw.has_education,
            probability: raw.probability,
            in_prison: raw.in_prison,
            crime_rank: raw.crime_rank,
            requires_flag: raw.requires_flag.clone(),
            excludes_flag: raw.excludes_flag.clone(),
        }))
    }

    fn choice(&self, event_id: &str, raw: &RawChoice) -> Result<Choice, ContentError> {
        let owner = format!("{event_id}/{}", raw.id);
        let delayed = match &raw.delayed {
            Some(d) => Some(FollowUp {
                years: d.years.max(1),
                description: d.description.clone(),
                effects: self.effects(&owner, &d.effects)?,
                skills: self.skills(&owner, &d.skills)?,
            }),
            None => None,
        };
        Ok(Choice {
            id: raw.id.clone(),
            text: raw.text.clone(),
            effects: self.effects(&owner, &raw.effects)?,
            skills: self.skills(&owner, &raw.skills)?,
            flags: raw.flags.clone(),
            consequences: raw.consequences.clone(),
            delayed,
            action: raw.action.clone(),
            relationship: raw.relationship,
            asset: raw.asset.clone(),
        })
    }

    fn event(&self, raw: &RawEvent) -> Result<Option<Event>, ContentError> {
        let Some(conditions) = self.conditions(&raw.id, &raw.conditions)? else {
            return Ok(None);
        };
        let mut seen = BTreeSet::new();
        let mut choices = Vec::with_capacity(raw.choices.len());
        for rc in &raw.choices {
            if !seen.insert(rc.id.clone()) {
                self.violation(ContentError::DuplicateId {
                    collection: "choices",
                    id: format!("{}/{}", raw.id, rc.id),
                })?;
                continue;
            }
            choices.push(self.choice(&raw.id, rc)?);
        }
        Ok(Some(Event {
            id: raw.id.clone(),
            title: raw.title.clone(),
            description: raw.description.clone(),
            category: raw.category,
            weight: raw.weight,
            conditions,
            effects: self.effects(&raw.id, &raw.effects)?,
            choices,
        }))
    }

    fn events(&self, raws: &[RawEvent], seen: &mut BTreeSet<String>) -> Result<Vec<Event>, ContentError> {
        let mut out = Vec::with_capacity(raws.len());
        for raw in raws {
            if !seen.insert(raw.id.clone()) {
                self.violation(ContentError::DuplicateId { collection: "events", id: raw.id.clone() })?;
                continue;
            }
            if let Some(event) = self.event(raw)? {
                out.push(event);
            }
        }
        Ok(out)
    }
}

/// Immutable collection of authored events, split by how the turn
/// pipeline consumes them.
#[derive(Debug, Clone, Default)]
pub struct EventCatalog {
    /// Fully conditioned, one-shot events.
    pub dynamic: Vec<Event>,
    /// Repeatable events gated only by age, job and probability.
    pub random_pool: Vec<Event>,
    /// Passive narrative events drawn when nothing else happened.
    pub static_pool: Vec<Event>,
}

impl EventCatalog {
    pub fn new(dynamic: Vec<Event>, random_pool: Vec<Event>, static_pool: Vec<Event>) -> Self {
        Self { dynamic, random_pool, static_pool }
    }

    pub fn from_json(source_name: &str, text: &str, loader: ContentLoader) -> Result<Self, ContentError> {
        let file: RawCatalogFile = serde_json::from_str(text).map_err(|e| ContentError::Parse {
            source_name: source_name.to_string(),
            reason: e.to_string(),
        })?;
        let mut seen = BTreeSet::new();
        Ok(Self {
            dynamic: loader.events(&file.dynamic, &mut seen)?,
            random_pool: loader.events(&file.random, &mut seen)?,
            static_pool: loader.events(&file.static_pool, &mut seen)?,
        })
    }

    /// Look up an event in any pool.
    pub fn get(&self, id: &str) -> Option<&Event> {
        self.all().find(|e| e.id == id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Event> {
        self.dynamic
            .iter()
            .chain(self.random_pool.iter())
            .chain(self.static_pool.iter())
    }

    pub fn len(&self) -> usize {
        self.dynamic.len() + self.random_pool.len() + self.static_pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BAD_STAT: &str = r#"{
        "dynamic": [{
            "id": "e1", "title": "T", "description": "D", "category": "random",
            "choices": [{ "id": "a", "text": "A", "effects": { "charisma": 5, "happiness": 3 } }]
        }]
    }"#;

    #[test]
    fn strict_loader_rejects_unknown_stat() {
        let err = EventCatalog::from_json("test", BAD_STAT, ContentLoader::new(true)).unwrap_err();
        assert!(matches!(err, ContentError::UnknownStat { ref name, .. } if name == "charisma"));
    }

    #[test]
    fn lenient_loader_skips_only_the_offending_effect() {
        let catalog = EventCatalog::from_json("test", BAD_STAT, ContentLoader::new(false)).unwrap();
        let choice = &catalog.dynamic[0].choices[0];
        assert_eq!(choice.effects.get(Stat::Happiness), Some(3));
        assert_eq!(choice.effects.iter().count(), 1);
    }

    #[test]
    fn malformed_probability_drops_event_when_lenient() {
        let text = r#"{ "dynamic": [{
            "id": "e2", "title": "T", "description": "D", "category": "random",
            "conditions": { "probability": 1.5 }
        }] }"#;
        let catalog = EventCatalog::from_json("test", text, ContentLoader::new(false)).unwrap();
        assert!(catalog.dynamic.is_empty());
        assert!(EventCatalog::from_json("test", text, ContentLoader::new(true)).is_err());
    }

    #[test]
    fn duplicate_ids_across_pools_are_rejected() {
        let text = r#"{
            "dynamic": [{ "id": "x", "title": "T", "description": "D", "category": "random" }],
            "static":  [{ "id": "x", "title": "T", "description": "D", "category": "random" }]
        }"#;
        let err = EventCatalog::from_json("test", text, ContentLoader::new(true)).unwrap_err();
        assert!(matches!(err, ContentError::DuplicateId { .. }));
    }
}
