//! TUI pane rendering modules
//!
//! Every pane renders one finished [`Step`](crate::snapshot::Step); none of
//! them keeps state beyond its scroll position.
//!
//! # Pane Modules
//!
//! - [`source`]: Source code with syntax highlighting and the current line
//! - [`stack`]: Variables in declaration order with bytes and points-to arrows
//! - [`heap`]: Heap blocks with live/freed state and hex dumps
//! - [`explanation`]: Registers and the explanation text of the step
//! - [`status`]: Status bar with keybindings and position markers
//! - `utils`: Shared block, scrolling and wrapping helpers

mod utils;

pub mod explanation;
pub mod heap;
pub mod source;
pub mod stack;
pub mod status;

// Re-export render functions for convenience
pub use explanation::{render_explanation_pane, ExplanationContent};
pub use heap::{render_heap_pane, HeapScrollState};
pub use source::{render_source_pane, SourceScrollState};
pub use stack::{render_stack_pane, StackScrollState};
pub use status::render_status_bar;
