use crate::{
    career_subsystem::CareerAction,
    crime_subsystem::CrimeAction,
    education_subsystem::EducationAction,
    finance_subsystem::FinanceAction,
    health_subsystem::HealthAction,
    prison_subsystem::PrisonAction,
};
use serde::{Deserialize, Serialize};

/// Direct actions a player can take outside of events.
/// Murder assignments, informing and escapes are only offered by events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    // ── Career ────────────────────────────────────
    ApplyJob { career_id: String },
    QuitJob,
    WorkHard,

    // ── Education ─────────────────────────────────
    EnrollUniversity,
    EnrollGraduate,
    DropOut,

    // ── Crime ─────────────────────────────────────
    CommitCrime { operation_id: String },
    JoinSyndicate,

    // ── Prison ────────────────────────────────────
    RequestParole,
    Workout,
    StartFight,

    // ── Health ────────────────────────────────────
    TreatCondition { condition_id: String },

    // ── Finance ───────────────────────────────────
    Invest { amount: i64 },
    Withdraw { amount: i64 },
}

/// The subsystem-level action a player action maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Career(CareerAction),
    Education(EducationAction),
    Crime(CrimeAction),
    Prison(PrisonAction),
    Health(HealthAction),
    Finance(FinanceAction),
}

impl PlayerAction {
    pub fn route(self) -> Routed {
        match self {
            Self::ApplyJob { career_id } => Routed::Career(CareerAction::ApplyJob { career_id }),
            Self::QuitJob => Routed::Career(CareerAction::QuitJob),
            Self::WorkHard => Routed::Career(CareerAction::WorkHard),
            Self::EnrollUniversity => Routed::Education(EducationAction::EnrollUniversity),
            Self::EnrollGraduate => Routed::Education(EducationAction::EnrollGraduate),
            Self::DropOut => Routed::Education(EducationAction::DropOut),
            Self::CommitCrime { operation_id } => Routed::Crime(CrimeAction::CommitCrime { operation_id }),
            Self::JoinSyndicate => Routed::Crime(CrimeAction::JoinSyndicate),
            Self::RequestParole => Routed::Prison(PrisonAction::RequestParole),
            Self::Workout => Routed::Prison(PrisonAction::Workout),
            Self::StartFight => Routed::Prison(PrisonAction::StartFight),
            Self::TreatCondition { condition_id } => Routed::Health(HealthAction::TreatCondition { condition_id }),
            Self::Invest { amount } => Routed::Finance(FinanceAction::Invest { amount }),
            Self::Withdraw { amount } => Routed::Finance(FinanceAction::Withdraw { amount }),
        }
    }
}

/// Line-delimited JSON commands accepted by the runner's IPC mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlayerCommand {
    AgeUp,
    Choose { choice_id: String },
    Act { action: PlayerAction },
    GetState,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_from_json_lines() {
        let cmd: PlayerCommand = serde_json::from_str(r#"{"cmd":"choose","choice_id":"yes"}"#).expect("parse");
        assert_eq!(cmd, PlayerCommand::Choose { choice_id: "yes".into() });

        let cmd: PlayerCommand =
            serde_json::from_str(r#"{"cmd":"act","action":{"action":"invest","amount":5}}"#).expect("parse");
        assert_eq!(cmd, PlayerCommand::Act { action: PlayerAction::Invest { amount: 5 } });
    }
}
