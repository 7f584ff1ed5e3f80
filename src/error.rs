//! Error types for the day planner.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid process configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    Config { key: String, message: String },

    /// A day plan must keep at least one variant
    #[error("cannot delete the last variant of a day plan")]
    LastVariant,

    /// Lookup miss used to abort a commit without publishing anything
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("persistence worker is not running")]
    PersistenceClosed,
}

pub type Result<T, E = PlannerError> = std::result::Result<T, E>;
