//! Per-run bookkeeping that keeps repeated event selection fair.

use crate::types::{Age, EventId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One resolved choice, kept for history-based predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub age: Age,
    pub event_id: EventId,
    pub choice_id: String,
    /// |sum of the choice's numeric effects|
    pub magnitude: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTracker {
    pub triggered: BTreeSet<EventId>,
    pub cooldowns: BTreeMap<EventId, Age>,
    pub last_event_age: Option<Age>,
    pub choice_history: Vec<ChoiceRecord>,
}

impl EventTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_triggered(&self, event_id: &str) -> bool {
        self.triggered.contains(event_id)
    }

    /// True while `age` is less than `cooldown_years` past the last trigger.
    pub fn on_cooldown(&self, event_id: &str, age: Age, cooldown_years: u32) -> bool {
        match self.cooldowns.get(event_id) {
            Some(last) => age < last.saturating_add(cooldown_years),
            None => false,
        }
    }

    /// Mark a one-shot event as spent.
    pub fn mark_triggered(&mut self, event_id: &str, age: Age) {
        self.triggered.insert(event_id.to_string());
        self.touch(event_id, age);
    }

    /// Start the cooldown without marking the event as spent.
    pub fn touch(&mut self, event_id: &str, age: Age) {
        self.cooldowns.insert(event_id.to_string(), age);
        self.last_event_age = Some(age);
    }

    pub fn record_choice(&mut self, record: ChoiceRecord) {
        self.choice_history.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_lasts_two_years() {
        let mut t = EventTracker::new();
        t.touch("e", 20);
        assert!(t.on_cooldown("e", 20, 2));
        assert!(t.on_cooldown("e", 21, 2));
        assert!(!t.on_cooldown("e", 22, 2));
        assert!(!t.is_triggered("e"));
    }
}
