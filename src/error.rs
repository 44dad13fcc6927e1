//! Error types for building and running tours.

use crate::runner::TourState;
use thiserror::Error;

/// A tour or plugin was configured incorrectly.
///
/// Raised while a [`TourScript`](crate::TourScript) is being built or
/// finalized, or while the plugin is registered. Never raised mid-run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A step was declared without a success criterion.
    #[error("step {index} has no expectation")]
    MissingExpectation { index: u32 },

    /// Two steps share the same index.
    #[error("step index {index} is declared more than once")]
    DuplicateIndex { index: u32 },

    /// The expectation can never be met, e.g. an empty key sequence.
    #[error("step {index} has an expectation that can never be satisfied")]
    Unsatisfiable { index: u32 },

    /// Step indices start at 1.
    #[error("step index must be positive, got 0")]
    ZeroIndex,

    /// A required plugin option was not supplied.
    #[error("plugin option `{0}` is required")]
    MissingOption(&'static str),

    /// Every violation found while finalizing a script.
    #[error("invalid tour: {}", summarize(.0))]
    Invalid(Vec<ConfigurationError>),
}

impl ConfigurationError {
    /// Flatten into the list of individual violations.
    pub fn violations(&self) -> Vec<ConfigurationError> {
        match self {
            ConfigurationError::Invalid(all) => all.iter().flat_map(|e| e.violations()).collect(),
            other => vec![other.clone()],
        }
    }
}

fn summarize(errors: &[ConfigurationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failure surfaced by a [`HostAdapter`](crate::HostAdapter) primitive.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("host I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input stream ended while the tour was listening.
    #[error("input closed")]
    InputClosed,

    /// The user interrupted the tour (e.g. Ctrl+C during key capture).
    #[error("interrupted")]
    Interrupted,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors returned by [`TourRunner::run`](crate::TourRunner::run).
///
/// Any of these leaves the runner in [`TourState::Aborted`], except
/// [`TourError::AlreadyStarted`], which leaves the state untouched.
#[derive(Debug, Error)]
pub enum TourError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// An expectation predicate failed internally; there is no safe verdict.
    #[error("expectation of step {index} failed: {source}")]
    Expectation {
        index: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("prepare hook failed: {0}")]
    Prepare(#[source] anyhow::Error),

    /// `run()` was called on a runner that already left `NotStarted`.
    #[error("tour runner cannot be restarted (state: {0})")]
    AlreadyStarted(TourState),
}
