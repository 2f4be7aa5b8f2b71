use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Life of character '{character_id}' has already ended")]
    GameOver { character_id: String },

    #[error("No event is awaiting a choice")]
    NoPendingEvent,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

/// Violations of the contract between authored content and the engine.
/// Raised at load time, never mid-turn.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    #[error("{owner}: unknown stat '{name}'")]
    UnknownStat { owner: String, name: String },

    #[error("{owner}: unknown skill '{name}'")]
    UnknownSkill { owner: String, name: String },

    #[error("{owner}: malformed condition ({reason})")]
    MalformedCondition { owner: String, reason: String },

    #[error("duplicate id '{id}' in {collection}")]
    DuplicateId { collection: &'static str, id: String },

    #[error("{owner}: references unknown {kind} '{id}'")]
    UnknownReference { owner: String, kind: &'static str, id: String },

    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("cannot parse {source_name}: {reason}")]
    Parse { source_name: String, reason: String },
}
