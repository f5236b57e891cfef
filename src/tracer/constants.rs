// Default layout constants for the synthetic memory image

/// Stack base (`rbp`); stack addresses are handed out downward from here
pub const STACK_BASE: u64 = 0x7fff_ffff_de00;

/// Heap base; heap addresses are handed out upward from here
pub const HEAP_BASE: u64 = 0x5555_5555_9000;

/// Gap left after each heap block, purely for display
pub const HEAP_PADDING: u64 = 16;

/// Size used when a `malloc` argument cannot be understood
pub const DEFAULT_MALLOC_BYTES: usize = 20;

/// Largest single array or heap block, in bytes
pub const MAX_REGION_BYTES: usize = 64 * 1024;

/// Total stack budget, in bytes
pub const MAX_STACK_BYTES: usize = 1024 * 1024;

/// `error` tag of a trace that ended in an internal fault
pub const SIMULATION_ERROR: &str = "simulation_error";

/// `message` of a successful trace over a program without `main`
pub const NO_MAIN_MESSAGE: &str = "no main() function found";
