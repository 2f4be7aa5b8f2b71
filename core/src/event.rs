//! Structured simulation events and the per-turn chronicle.
//!
//! RULE: Subsystems never notify or persist anything themselves.
//! They write narrative lines and structured events into the turn's
//! Chronicle; the engine persists the events and derives notifications.

use crate::{
    character::DeathCause,
    crime_subsystem::{CrimeType, Rank},
    prison_subsystem::Facility,
    types::{Age, CharacterId, EventId, RunId},
};
use serde::{Deserialize, Serialize};

/// Every structured event emitted during simulation.
/// Variants are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        run_id: RunId,
        character_id: CharacterId,
        seed: u64,
    },
    TurnStarted {
        age: Age,
    },
    TurnCompleted {
        age: Age,
    },

    // ── Event selection ────────────────────────────
    EventPresented {
        age: Age,
        event_id: EventId,
    },
    PassiveEventApplied {
        age: Age,
        event_id: EventId,
    },
    ChoiceResolved {
        age: Age,
        event_id: EventId,
        choice_id: String,
        magnitude: i64,
    },
    DelayedEffectApplied {
        age: Age,
        description: String,
    },

    // ── Subsystems ─────────────────────────────────
    ConditionDiagnosed {
        age: Age,
        condition_id: String,
    },
    ConditionCured {
        age: Age,
        condition_id: String,
    },
    EducationCompleted {
        age: Age,
        stage: String,
    },
    Hired {
        age: Age,
        career_id: String,
        title: String,
        salary: i64,
    },
    Promoted {
        age: Age,
        career_id: String,
        level: u32,
        title: String,
        salary: i64,
    },
    JobLost {
        age: Age,
        career_id: String,
    },
    CrimeCommitted {
        age: Age,
        operation_id: String,
        outcome: String,
        payout: i64,
    },
    RankChanged {
        age: Age,
        from: Rank,
        to: Rank,
    },
    InformantResolved {
        age: Age,
        protected: bool,
    },
    Arrested {
        age: Age,
        crime_type: CrimeType,
        sentence: u32,
        facility: Facility,
    },
    Released {
        age: Age,
        paroled: bool,
    },
    ParoleDenied {
        age: Age,
        chance: f64,
    },
    Escaped {
        age: Age,
    },
    RelativeDied {
        age: Age,
        relation: String,
        name: String,
    },
    MilestoneReached {
        age: Age,
    },
    AchievementUnlocked {
        age: Age,
        achievement_id: String,
    },
    GameOver {
        age: Age,
        cause: DeathCause,
    },
}

impl SimEvent {
    /// Stable string name, used for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. } => "run_initialized",
            Self::TurnStarted { .. } => "turn_started",
            Self::TurnCompleted { .. } => "turn_completed",
            Self::EventPresented { .. } => "event_presented",
            Self::PassiveEventApplied { .. } => "passive_event_applied",
            Self::ChoiceResolved { .. } => "choice_resolved",
            Self::DelayedEffectApplied { .. } => "delayed_effect_applied",
            Self::ConditionDiagnosed { .. } => "condition_diagnosed",
            Self::ConditionCured { .. } => "condition_cured",
            Self::EducationCompleted { .. } => "education_completed",
            Self::Hired { .. } => "hired",
            Self::Promoted { .. } => "promoted",
            Self::JobLost { .. } => "job_lost",
            Self::CrimeCommitted { .. } => "crime_committed",
            Self::RankChanged { .. } => "rank_changed",
            Self::InformantResolved { .. } => "informant_resolved",
            Self::Arrested { .. } => "arrested",
            Self::Released { .. } => "released",
            Self::ParoleDenied { .. } => "parole_denied",
            Self::Escaped { .. } => "escaped",
            Self::RelativeDied { .. } => "relative_died",
            Self::MilestoneReached { .. } => "milestone_reached",
            Self::AchievementUnlocked { .. } => "achievement_unlocked",
            Self::GameOver { .. } => "game_over",
        }
    }
}

/// Narrative lines and structured events produced by one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Chronicle {
    pub narrative: Vec<String>,
    pub events: Vec<(&'static str, SimEvent)>,
}

impl Chronicle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn narrate(&mut self, line: impl Into<String>) {
        self.narrative.push(line.into());
    }

    /// Record a structured event attributed to `source`.
    pub fn emit(&mut self, source: &'static str, event: SimEvent) {
        self.events.push((source, event));
    }

    pub fn extend(&mut self, other: Chronicle) {
        self.narrative.extend(other.narrative);
        self.events.extend(other.events);
    }

    pub fn has_event(&self, pred: impl Fn(&SimEvent) -> bool) -> bool {
        self.events.iter().any(|(_, e)| pred(e))
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub run_id: RunId,
    pub age: Age,
    pub source: String,
    pub event_type: String,
    pub payload: String, // JSON-serialized SimEvent
}
