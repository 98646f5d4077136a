//! Deterministic preprocessing for wind-turbine sensor streams
//!
//! Turns ordered multi-sensor readings from turbine edge devices into
//! fixed-shape tensors for an anomaly-detection model:
//!
//! 1. Quaternion attitude to roll, pitch and yaw
//! 2. Wavelet shrinkage denoising per channel
//! 3. Z-score standardization against a frozen baseline
//! 4. Sliding windows folded into `(channels, R, C)` tensors
//!
//! The same code runs on a training workstation and on the device, and both
//! produce the same bits for the same input.
//!
//! Key constraints:
//! - `no_std + alloc` capable, all math through `libm`
//! - No randomness, no global state
//! - Baselines are immutable values bound to their configuration
//!
//! ```no_run
//! use windguard_core::{Pipeline, PipelineConfig, Sample};
//!
//! # fn load_reference() -> Vec<Sample> { Vec::new() }
//! # fn load_live() -> Vec<Sample> { Vec::new() }
//! let pipeline = Pipeline::new(PipelineConfig::default())?;
//! let baseline = pipeline.fit(&load_reference())?;
//!
//! for tensor in pipeline.transform(&load_live(), &baseline)? {
//!     let (channels, rows, cols) = tensor.shape();
//!     assert_eq!(tensor.as_slice().len(), channels * rows * cols);
//! }
//! # Ok::<(), windguard_core::PipelineError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

pub mod buffer;
pub mod channels;
pub mod config;
pub mod constants;
pub mod denoise;
pub mod errors;
pub mod pipeline;
pub mod quaternion;
pub mod sample;
pub mod stats;
pub mod stream;
pub mod time;
pub mod traits;
pub mod window;

// Public API
pub use channels::{Channel, ChannelMatrix};
pub use config::{ConfigBuilder, Fingerprint, PipelineConfig, WindowConfig};
pub use denoise::{DenoiseMode, Denoiser, NoiseScale, WaveletFamily};
pub use errors::{PipelineError, PipelineResult, Stage};
pub use pipeline::{Pipeline, PreparedSequence};
pub use quaternion::{quaternion_to_euler, EulerAngles, Quaternion};
pub use sample::{Sample, SampleBuilder, StreamId};
pub use stats::{Baseline, ChannelStats};
pub use stream::{EdgeReplay, TensorStream};
pub use window::{Tensor, WindowEncoder, Windows};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn identity_quaternion_has_no_rotation() {
        let angles = quaternion_to_euler(0.0, 0.0, 0.0, 1.0).unwrap();
        assert_eq!((angles.roll, angles.pitch, angles.yaw), (0.0, 0.0, 0.0));
    }
}
