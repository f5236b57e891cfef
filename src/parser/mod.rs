//! Source scanning and statement recognition
//!
//! This module turns C source text into classified statements:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`statements`]: Finds `main` and splits its body into raw statements
//! - [`recognizer`]: Classifies each raw statement into a [`recognizer::Statement`]
//!
//! # Recognized subset
//!
//! There is no grammar and no AST. Each statement inside `main` is matched
//! against a fixed list of shapes (declarations, assignments, pointer
//! operations, `malloc`/`free`, output calls); everything else is skipped.
//! No external parser generator dependencies.

pub mod lexer;
pub mod recognizer;
pub mod statements;
