//! # Introduction
//!
//! memtrace is a symbolic memory tracer for a tiny subset of C, aimed at
//! students learning how variables, pointers and `malloc` map onto memory.
//! It never compiles or runs the program. Instead it recognizes a fixed set
//! of statement shapes inside `main` and, after each one, renders a full
//! snapshot of an invented stack and heap together with an explanation.
//!
//! ## Tracing pipeline
//!
//! ```text
//! Source → Lexer → main body → Statements → Recognizer → Memory model → Steps
//! ```
//!
//! 1. [`parser`]: tokenizes the source, finds `main` and classifies each
//!    statement of its body.
//! 2. [`memory`]: the synthetic stack (downward from a fixed base) and heap
//!    (upward, freed blocks kept as tombstones).
//! 3. [`tracer`]: applies statements, builds explanations, and folds internal
//!    faults into an unsuccessful result.
//! 4. [`snapshot`]: the [`Step`](snapshot::Step) and
//!    [`TraceResult`](snapshot::TraceResult) types and their JSON form.
//! 5. [`ui`]: ratatui step viewer; not part of the stable library API.
//!
//! ## Recognized statements
//!
//! `int x;`, `int x = 5;`, `x = 7;`, `int a[3];`, `int a[3] = {1, 2};`,
//! `a[1] = 4;`, `int *p = &x;`, `*p = 9;`, `int *p = malloc(sizeof(int) * 4);`,
//! `p[2] = 1;`, `free(p);`, output calls (`printf`, `puts`, `putchar`) and
//! `return`. Only decimal integer literals are understood as values.
//!
//! ```
//! let result = memtrace::trace("int main() { int x = 5; int *p = &x; *p = 20; return 0; }", None);
//! assert!(result.success);
//! assert_eq!(result.steps.len(), 4);
//! assert_eq!(result.steps[2].variable("x").unwrap().value, "20");
//! ```

pub mod memory;
pub mod parser;
pub mod snapshot;
pub mod tracer;
pub mod ui;

pub use snapshot::{MemoryBlock, Step, TraceResult};
pub use tracer::config::TracerConfig;
pub use tracer::{trace, trace_with_config};
