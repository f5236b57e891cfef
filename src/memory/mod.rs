//! Synthetic process memory for a trace
//!
//! This module provides the memory image the tracer mutates:
//! - [`bytes`]: Little-endian encoding and address/byte formatting helpers
//! - [`stack`]: Variable descriptors laid out downward from the stack base
//! - [`heap`]: Heap blocks laid out upward from the heap base, with freed-block
//!   tracking
//!
//! # Type Sizes
//!
//! Only `int` and its derived types exist, with fixed sizes:
//! - `int`: 4 bytes
//! - `int*`: 8 bytes
//! - `int[N]`: 4 × N bytes
//!
//! Nothing here is a real allocator. Addresses are invented so a learner sees
//! plausible values, and every region keeps its bytes for display.

pub mod bytes;
pub mod heap;
pub mod stack;

/// Memory address type (64-bit)
pub type Address = u64;

/// Size of `int` in bytes
pub const INT_SIZE: usize = 4;

/// Size of any pointer in bytes
pub const POINTER_SIZE: usize = 8;
