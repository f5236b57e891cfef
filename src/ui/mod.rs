//! Terminal step viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The viewer browses a finished [`TraceResult`]; it never runs the tracer
//! itself. It is organized into three layers:
//!
//! - **[`app`]**: application state, keyboard event loop, pane focus, auto-play
//! - **[`panes`]**: render functions for each visible pane (source, stack,
//!   heap, explanation, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a
//! [`TraceResult`] and call [`App::run`] to start the event loop.
//!
//! [`TraceResult`]: crate::snapshot::TraceResult
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
