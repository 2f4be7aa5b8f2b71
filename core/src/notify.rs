//! Fire-and-forget player notifications.
//!
//! The engine derives notifications from the structured events of an
//! operation. Delivery is the notifier's concern; failures never reach
//! the simulation.

use crate::{achievements, event::SimEvent};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self { title: title.into(), description: description.into(), severity }
    }

    /// The notification a structured event warrants, if any.
    pub fn for_event(event: &SimEvent) -> Option<Self> {
        let n = match event {
            SimEvent::AchievementUnlocked { achievement_id, .. } => Self::new(
                "Achievement unlocked",
                achievements::title(achievement_id).unwrap_or(achievement_id.as_str()),
                Severity::Success,
            ),
            SimEvent::Promoted { title, salary, .. } => {
                Self::new("Promotion", format!("You are now {title} earning {salary}k."), Severity::Success)
            }
            SimEvent::Arrested { crime_type, sentence, .. } => Self::new(
                "Arrested",
                format!("Sentenced to {sentence} years for {}.", crime_type.label()),
                Severity::Warning,
            ),
            SimEvent::Released { paroled: true, .. } => Self::new("Paroled", "The board granted parole.", Severity::Success),
            SimEvent::Released { paroled: false, .. } => Self::new("Released", "You served your sentence.", Severity::Info),
            SimEvent::Escaped { .. } => Self::new("Escaped", "You are a fugitive.", Severity::Warning),
            SimEvent::GameOver { age, cause } => {
                Self::new("Game over", format!("You died at {age} from {cause}."), Severity::Critical)
            }
            _ => return None,
        };
        Some(n)
    }
}

pub trait Notifier: Send {
    fn notify(&self, notification: &Notification);
}

/// Forwards notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, n: &Notification) {
        log::info!("notify [{:?}] {}: {}", n.severity, n.title, n.description);
    }
}

/// Keeps every notification in a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        match self.seen.lock() {
            Ok(seen) => seen.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, n: &Notification) {
        match self.seen.lock() {
            Ok(mut seen) => seen.push(n.clone()),
            Err(poisoned) => poisoned.into_inner().push(n.clone()),
        }
    }
}
