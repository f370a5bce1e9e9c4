//! Error types for sandql sessions

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The engine library could not be obtained (wrong or missing build).
    #[error("Engine load error: {0}")]
    EngineLoad(String),

    /// The engine was found but failed to start.
    #[error("Engine init error: {0}")]
    EngineInit(String),

    #[error("Exercise has no schema")]
    NoSchema,

    /// The schema script was rejected by the engine; carries the engine message.
    #[error("Schema execution error: {0}")]
    SchemaExecution(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

/// Extracts the bare engine message from a rusqlite error.
///
/// `rusqlite::Error::SqliteFailure` renders as the message alone when one is
/// attached, which is what users see in the results area.
pub(crate) fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) if !msg.is_empty() => msg.clone(),
        other => other.to_string(),
    }
}
