//! Tunable constants for every phase of the simulation.
//!
//! `SimConfig::default()` carries the canonical values. A JSON file may
//! override any subset: every section and field falls back to its default.

use crate::character::LifeStage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    pub base_event_probability: f64,
    pub max_event_probability: f64,
    pub minor_age_factor: f64,
    pub senior_age_factor: f64,
    /// Health below this makes events more likely.
    pub low_health_threshold: i64,
    pub low_health_factor: f64,
    /// Chance of a passive static event when no event was presented.
    pub static_event_chance: f64,
    /// How many recent narrative lines the static draw checks for repeats.
    pub recency_window: usize,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            base_event_probability: 0.3,
            max_event_probability: 0.6,
            minor_age_factor: 0.8,
            senior_age_factor: 0.6,
            low_health_threshold: 30,
            low_health_factor: 1.2,
            static_event_chance: 0.5,
            recency_window: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub cooldown_years: u32,
    /// Lowest weight multiplier an event far from its ideal age can get.
    pub age_weight_floor: f64,
    pub major_event_factor: f64,
    pub career_event_factor: f64,
    /// Substrings of event ids that mark a major life event.
    pub major_event_markers: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            cooldown_years: 2,
            age_weight_floor: 0.5,
            major_event_factor: 0.3,
            career_event_factor: 1.5,
            major_event_markers: vec!["marriage".into(), "death".into(), "inheritance".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChoiceConfig {
    pub consequence_probability: f64,
    /// Positive wealth effects above this schedule a delayed reaction.
    pub wealth_attention_threshold: i64,
    pub wealth_attention_notoriety: i64,
    pub wealth_attention_happiness: i64,
}

impl Default for ChoiceConfig {
    fn default() -> Self {
        Self {
            consequence_probability: 0.8,
            wealth_attention_threshold: 50,
            wealth_attention_notoriety: 10,
            wealth_attention_happiness: -5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    pub recovery_min_age: u32,
    pub recovery_max_age: u32,
    pub recovery_health_threshold: i64,
    pub recovery_chance: f64,
    pub recovery_amount: i64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            recovery_min_age: 18,
            recovery_max_age: 35,
            recovery_health_threshold: 30,
            recovery_chance: 0.3,
            recovery_amount: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FinanceConfig {
    /// Yearly cost of living for adults, in thousands.
    pub living_cost: i64,
    pub investment_return_min: f64,
    pub investment_return_max: f64,
    pub missed_payment_happiness: i64,
    pub student_loan_rate: f64,
    pub student_loan_years: u32,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            living_cost: 8,
            investment_return_min: -0.08,
            investment_return_max: 0.12,
            missed_payment_happiness: -2,
            student_loan_rate: 0.05,
            student_loan_years: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Yearly chance of a new diagnosis per life stage.
    pub diagnosis_probability: BTreeMap<LifeStage, f64>,
    pub treatment_cure_chance: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        let diagnosis_probability = [
            (LifeStage::Baby, 0.02),
            (LifeStage::Toddler, 0.03),
            (LifeStage::Child, 0.03),
            (LifeStage::Teen, 0.03),
            (LifeStage::YoungAdult, 0.04),
            (LifeStage::Adult, 0.06),
            (LifeStage::MiddleAged, 0.10),
            (LifeStage::Senior, 0.15),
        ]
        .into_iter()
        .collect();
        Self { diagnosis_probability, treatment_cure_chance: 0.6 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerConfig {
    pub min_age: u32,
    pub promotion_performance: i64,
    /// Salary step per level on tracks without a level table.
    pub simplified_raise: i64,
    pub simplified_years_per_level: u32,
    pub simplified_max_level: u32,
}

impl Default for CareerConfig {
    fn default() -> Self {
        Self {
            min_age: 16,
            promotion_performance: 60,
            simplified_raise: 15,
            simplified_years_per_level: 2,
            simplified_max_level: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrimeConfig {
    pub join_min_crimes: u32,
    pub join_min_age: u32,
    pub min_age: u32,
    pub suspicion_decay: i64,
    /// Suspicion points per extra percentage point of arrest chance.
    pub suspicion_arrest_divisor: i64,
    pub informant_evidence_required: u32,
    pub informant_death_base: f64,
}

impl Default for CrimeConfig {
    fn default() -> Self {
        Self {
            join_min_crimes: 5,
            join_min_age: 18,
            min_age: 12,
            suspicion_decay: 5,
            suspicion_arrest_divisor: 5,
            informant_evidence_required: 10,
            informant_death_base: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrisonConfig {
    pub parole_base: f64,
    pub parole_reputation_factor: f64,
    pub parole_discipline_penalty: f64,
    pub parole_min: f64,
    pub parole_max: f64,
    pub parole_eligibility_fraction: f64,
    pub yearly_happiness_penalty: i64,
    pub health_penalty_chance: f64,
    pub health_penalty: i64,
    pub escape_chance: f64,
    pub failed_escape_extra_years: u32,
}

impl Default for PrisonConfig {
    fn default() -> Self {
        Self {
            parole_base: 30.0,
            parole_reputation_factor: 0.5,
            parole_discipline_penalty: 10.0,
            parole_min: 5.0,
            parole_max: 100.0,
            parole_eligibility_fraction: 0.5,
            yearly_happiness_penalty: -3,
            health_penalty_chance: 0.1,
            health_penalty: -5,
            escape_chance: 0.15,
            failed_escape_extra_years: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConfig {
    pub child_survival: f64,
    pub adult_survival: f64,
    pub senior_survival: f64,
    pub condition_factor: f64,
    pub wealth_threshold: i64,
    pub wealth_factor: f64,
    pub max_survival: f64,
    /// Health a character is left with after surviving a collapse.
    pub revive_health: i64,
    pub old_age_start: u32,
    pub old_age_step: f64,
    pub frail_health: i64,
    pub frail_bonus: f64,
    pub max_age: u32,
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            child_survival: 0.5,
            adult_survival: 0.3,
            senior_survival: 0.1,
            condition_factor: 0.5,
            wealth_threshold: 50,
            wealth_factor: 1.5,
            max_survival: 0.9,
            revive_health: 10,
            old_age_start: 75,
            old_age_step: 0.02,
            frail_health: 30,
            frail_bonus: 0.05,
            max_age: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Content contract violations abort loading instead of being skipped.
    pub strict_content: bool,
    pub turn: TurnConfig,
    pub selection: SelectionConfig,
    pub choice: ChoiceConfig,
    pub drift: DriftConfig,
    pub finance: FinanceConfig,
    pub health: HealthConfig,
    pub career: CareerConfig,
    pub crime: CrimeConfig,
    pub prison: PrisonConfig,
    pub termination: TerminationConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            strict_content: cfg!(debug_assertions),
            turn: TurnConfig::default(),
            selection: SelectionConfig::default(),
            choice: ChoiceConfig::default(),
            drift: DriftConfig::default(),
            finance: FinanceConfig::default(),
            health: HealthConfig::default(),
            career: CareerConfig::default(),
            crime: CrimeConfig::default(),
            prison: PrisonConfig::default(),
            termination: TerminationConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load overrides from a JSON file.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }
}
