//! Constants for WindGuard Core
//!
//! All tunable defaults and fixed numeric tables live here, grouped by
//! domain, so that fit-time and edge-time builds read the same values.
//!
//! ## Organization
//!
//! - **Window**: tensor geometry and stride defaults
//! - **Wavelet**: orthogonal filter-bank coefficients and denoising defaults
//! - **Normalize**: limits for usable channel statistics
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Changing any default here changes the configuration fingerprint of
//!    configurations built from `Default`, which invalidates stored baselines

/// Tensor geometry and sliding-window defaults.
pub mod window;

/// Wavelet filter coefficients and denoising defaults.
pub mod wavelet;

/// Statistics limits.
pub mod normalize;

pub use window::{DEFAULT_WINDOW_LEN, DEFAULT_ROWS, DEFAULT_COLS, DEFAULT_STRIDE};
pub use wavelet::{DEFAULT_LEVELS, MIN_DENOISE_LEN, MAD_TO_SIGMA};
pub use normalize::MIN_RELATIVE_STD;
