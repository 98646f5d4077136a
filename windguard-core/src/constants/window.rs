//! Window and Tensor Geometry
//!
//! The model consumes one tensor per time step: every selected channel's
//! last `DEFAULT_WINDOW_LEN` readings folded into a square block.

/// Number of samples in one window (L).
///
/// At the typical 1 Hz device reporting rate this covers the last
/// 100 seconds of turbine motion.
pub const DEFAULT_WINDOW_LEN: usize = 100;

/// Rows of the per-channel block (R). `DEFAULT_ROWS * DEFAULT_COLS`
/// must equal `DEFAULT_WINDOW_LEN`.
pub const DEFAULT_ROWS: usize = 10;

/// Columns of the per-channel block (C).
pub const DEFAULT_COLS: usize = 10;

/// Samples to advance between consecutive tensors.
pub const DEFAULT_STRIDE: usize = 1;

/// Capacity of the edge replay's pending-tensor queue.
///
/// Tensors are encoded from a finished block as they are popped. Only
/// frames left unread when the next block finishes are encoded into this
/// queue, so a consumer that drains between blocks never overflows it.
pub const REPLAY_QUEUE_CAPACITY: usize = 256;
