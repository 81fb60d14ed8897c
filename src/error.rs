//! Error types for the portfolio chat assistant.

use crate::dialogue::model::{InputMode, StepId};

/// Errors from loading configuration and content at startup.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while loading or validating a step graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Failed to parse step graph: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read step graph {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Step graph has {} integrity issue(s): {}", .0.len(), .0.join("; "))]
    Invalid(Vec<String>),
}

/// Reasons an interpreter operation was a no-op.
///
/// Every variant leaves the interpreter state untouched. None of these are
/// surfaced to the visitor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DialogueError {
    #[error("Step {0} is not in the graph")]
    MissingStep(StepId),

    #[error("Step {target} is not offered from {current}")]
    NotOffered { current: StepId, target: StepId },

    #[error("No choice at position {}", .index + 1)]
    NoSuchChoice { index: usize },

    #[error("No choice labelled {label:?}")]
    UnknownLabel { label: String },

    #[error("Input not accepted while input mode is {mode}")]
    InputUnavailable { mode: InputMode },

    #[error("Empty input ignored on step {0}")]
    EmptyInput(StepId),

    #[error("Widget is closed")]
    Closed,
}

/// Errors from the host shell that renders the widget.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Failed to write to host output: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
