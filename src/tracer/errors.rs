//! Error types for the tracer
//!
//! [`TraceError`] is the only hard failure of a trace. Everything a learner
//! can get wrong (unknown names, overflows, double frees) is explained in a
//! step instead; a `TraceError` means the synthetic memory image itself could
//! not be maintained, and the whole trace is reported as failed.
//!
//! [`ConfigError`] covers loading and validating a [`TracerConfig`].
//!
//! [`TracerConfig`]: super::config::TracerConfig

use std::path::PathBuf;
use thiserror::Error;

/// Internal faults that abort a trace
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    /// Reserving stack space would exceed the stack budget or address space
    #[error("stack exhausted at line {line}: cannot reserve {requested} more bytes (offset {offset}, limit {limit})")]
    StackExhausted {
        requested: usize,
        offset: u64,
        limit: usize,
        line: usize,
    },

    /// Placing a heap block would overflow the address space
    #[error("heap exhausted at line {line}: cannot place a {requested}-byte block")]
    HeapExhausted { requested: usize, line: usize },

    /// A name the recognizer resolved has no descriptor
    #[error("internal error at line {line}: no descriptor for '{name}'")]
    MissingDescriptor { name: String, line: usize },
}

impl TraceError {
    /// Source line the fault occurred on
    pub fn line(&self) -> usize {
        match self {
            TraceError::StackExhausted { line, .. }
            | TraceError::HeapExhausted { line, .. }
            | TraceError::MissingDescriptor { line, .. } => *line,
        }
    }
}

/// Configuration loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
