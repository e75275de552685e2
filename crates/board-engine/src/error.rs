//! Engine Errors
//!
//! None of these are fatal: each one degrades a single feature for a single
//! pass and is logged by whoever observes it.

use thiserror::Error;

/// Failure to obtain an issue's child hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("response carried no hierarchy for issue {0}")]
    MissingHierarchy(String),

    #[error("could not schedule fetch: {0}")]
    Spawn(String),
}

/// Why the synthetic review column could not be created this pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewColumnError {
    #[error("no '{0}' column to use as a template")]
    TemplateMissing(&'static str),

    #[error("template column has an unexpected structure: {0}")]
    UnexpectedStructure(&'static str),
}
