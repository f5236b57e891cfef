//! Memory model and step builder
//!
//! This module drives a trace:
//! - [`engine::Tracer`]: Applies each recognized statement to a fresh stack and
//!   heap and renders a full [`Step`](crate::snapshot::Step) after it
//! - [`explain`]: The explanation text for every outcome
//! - [`config::TracerConfig`]: Layout constants and limits
//! - [`errors`]: The internal faults that make a trace fail
//!
//! [`trace`] is the public entry point. It never returns an error: internal
//! faults are folded into an unsuccessful [`TraceResult`].

pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod explain;

use crate::snapshot::TraceResult;
use config::TracerConfig;
use constants::{NO_MAIN_MESSAGE, SIMULATION_ERROR};
use engine::Tracer;
use tracing::{debug, info, warn};

/// Trace `source` with the default configuration.
///
/// `stdin` is accepted so callers can pass the same inputs they would give a
/// real run; the tracer never reads it.
pub fn trace(source: &str, stdin: Option<&str>) -> TraceResult {
    trace_with_config(source, stdin, &TracerConfig::default())
}

#[tracing::instrument(skip_all)]
pub fn trace_with_config(source: &str, stdin: Option<&str>, config: &TracerConfig) -> TraceResult {
    if let Some(input) = stdin {
        debug!(bytes = input.len(), "ignoring stdin");
    }

    let source_lines: Vec<String> = source.lines().map(str::to_string).collect();
    let mut tracer = Tracer::new(config);

    match tracer.run(source) {
        Ok(()) if !tracer.main_found() => {
            info!("no main() function found");
            TraceResult::completed(Vec::new(), source_lines, Some(NO_MAIN_MESSAGE.to_string()))
        }
        Ok(()) => {
            info!(
                statements = tracer.statements_seen(),
                steps = tracer.steps().len(),
                "trace finished"
            );
            TraceResult::completed(tracer.into_steps(), source_lines, None)
        }
        Err(err) => {
            warn!(line = err.line(), "trace aborted: {}", err);
            TraceResult::failed(source_lines, SIMULATION_ERROR, err.to_string())
        }
    }
}
