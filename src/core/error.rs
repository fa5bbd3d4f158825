use std::fmt;
use thiserror::Error;

/// The kind of configuration entity an id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Talent,
    Event,
    Age,
    Achievement,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Talent => "talent",
            Self::Event => "event",
            Self::Age => "age",
            Self::Achievement => "achievement",
        })
    }
}

/// Errors a caller can observe. Everything else a rule table can get wrong
/// degrades to "no match" or "no effect" inside the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration not initialized; call init_config first")]
    NotInitialized,
    #[error("configuration already initialized")]
    AlreadyInitialized,
    #[error("unknown {kind} id: {id}")]
    UnknownEntity { kind: EntityKind, id: i32 },
    #[error("malformed configuration: {0}")]
    MalformedConfig(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The worker running a non-blocking simulation was shut down first.
    #[error("simulation interrupted: {0}")]
    Interrupted(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::MalformedConfig(err.to_string())
    }
}

impl From<ron::error::SpannedError> for EngineError {
    fn from(err: ron::error::SpannedError) -> Self {
        EngineError::MalformedConfig(err.to_string())
    }
}
