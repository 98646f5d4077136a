//! Error Types for the Preprocessing Pipeline
//!
//! ## Design Philosophy
//!
//! The pipeline runs both on a training workstation and on turbine edge
//! devices, so the error type follows the same rules everywhere:
//!
//! 1. **Small Size**: variants carry only numbers, channel ids and
//!    `&'static str` reasons.
//!
//! 2. **No Heap Allocation**: no `String` payloads, errors can be returned
//!    from the hot path and stored in fixed-capacity queues.
//!
//! 3. **Copy Semantics**: errors are `Copy` and `PartialEq`, which keeps
//!    matching in tests and callers trivial.
//!
//! ## Error Categories
//!
//! ### Input Problems
//! - `InvalidInput`: a sample field is missing or malformed (e.g. no `qw`)
//! - `OutOfOrder`: timestamps went backwards within one device stream
//! - `InsufficientData`: a sequence is too short for the requested operation
//!
//! ### Baseline Problems
//! - `DegenerateChannel`: zero or non-finite variance at fit time
//! - `MissingChannel`: the baseline does not cover a configured channel
//! - `ConfigMismatch`: the baseline was fitted under another configuration
//!
//! ### Configuration and Numerics
//! - `InvalidConfig`: a configuration that can never produce valid tensors
//! - `Numeric`: NaN or infinity appeared mid-pipeline
//!
//! Not having enough samples for a window is *not* an error: the windower
//! simply yields nothing, so callers can tell "no output yet" apart from a
//! hard failure.
//!
//! ```rust
//! use windguard_core::{PipelineError, Stage};
//!
//! fn describe(err: PipelineError) -> &'static str {
//!     match err {
//!         PipelineError::DegenerateChannel { .. } => "drop the channel or collect more data",
//!         PipelineError::ConfigMismatch { .. } => "refit the baseline",
//!         PipelineError::Numeric { stage: Stage::Denoise, .. } => "inspect raw readings",
//!         _ => "reject the batch",
//!     }
//! }
//! # let _ = describe(PipelineError::InvalidConfig { reason: "x" });
//! ```

use core::fmt;

use thiserror_no_std::Error;

use crate::channels::Channel;
use crate::config::Fingerprint;
use crate::time::Timestamp;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pipeline stage where a numeric failure surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Channel extraction and quaternion conversion
    Extract,
    /// Wavelet shrinkage
    Denoise,
    /// Statistics fit
    Fit,
    /// Z-score standardization
    Normalize,
    /// Tensor encoding
    Window,
}

impl Stage {
    /// Stable lowercase name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Denoise => "denoise",
            Self::Fit => "fit",
            Self::Normalize => "normalize",
            Self::Window => "window",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline errors - kept small and `Copy` for edge use
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum PipelineError {
    /// A sample field is missing or malformed
    #[error("Invalid input in field {field}: {reason}")]
    InvalidInput {
        /// Name of the offending sample field
        field: &'static str,
        /// What was wrong with it
        reason: &'static str,
    },

    /// Timestamp regression inside one device stream
    #[error("Samples out of order: {current} follows {previous}")]
    OutOfOrder {
        /// Timestamp of the earlier sample
        previous: Timestamp,
        /// Timestamp of the sample that went backwards
        current: Timestamp,
    },

    /// Zero or non-finite standard deviation at fit time
    #[error("Degenerate channel {channel}: standard deviation {std_dev}")]
    DegenerateChannel {
        /// Channel that cannot be normalized
        channel: Channel,
        /// The offending standard deviation
        std_dev: f64,
    },

    /// Not enough samples for the requested operation
    #[error("Insufficient data: need {required}, have {available}")]
    InsufficientData {
        /// Minimum number of samples needed
        required: usize,
        /// Number of samples supplied
        available: usize,
    },

    /// Baseline fitted under a different configuration
    #[error("Configuration mismatch: baseline {expected}, active {found}")]
    ConfigMismatch {
        /// Fingerprint stored with the baseline
        expected: Fingerprint,
        /// Fingerprint of the active configuration
        found: Fingerprint,
    },

    /// Configuration that cannot produce valid tensors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What the configuration got wrong
        reason: &'static str,
    },

    /// NaN or infinity appeared mid-pipeline
    #[error("Non-finite value during {stage} on channel {channel} at index {index}")]
    Numeric {
        /// Stage that produced or received the value
        stage: Stage,
        /// Channel carrying the value
        channel: Channel,
        /// Sample index within the sequence
        index: usize,
    },

    /// Baseline has no statistics for a configured channel
    #[error("Baseline has no statistics for channel {channel}")]
    MissingChannel {
        /// Configured channel without statistics
        channel: Channel,
    },
}

impl PipelineError {
    /// True for errors caused by the data rather than the configuration.
    ///
    /// Callers replaying live streams usually drop the batch on data errors
    /// and halt on everything else.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::OutOfOrder { .. }
                | Self::InsufficientData { .. }
                | Self::Numeric { .. }
        )
    }
}

/// Scan a sequence and report the first non-finite value.
pub(crate) fn ensure_finite(
    values: &[f64],
    stage: Stage,
    channel: Channel,
) -> PipelineResult<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(PipelineError::Numeric { stage, channel, index }),
        None => Ok(()),
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PipelineError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidInput { field, reason } =>
                defmt::write!(fmt, "Invalid {}: {}", field, reason),
            Self::OutOfOrder { previous, current } =>
                defmt::write!(fmt, "Out of order: {} after {}", current, previous),
            Self::DegenerateChannel { channel, std_dev } =>
                defmt::write!(fmt, "Degenerate {}: std {}", channel.as_str(), std_dev),
            Self::InsufficientData { required, available } =>
                defmt::write!(fmt, "Need {} samples, have {}", required, available),
            Self::ConfigMismatch { .. } =>
                defmt::write!(fmt, "Configuration mismatch"),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Invalid config: {}", reason),
            Self::Numeric { stage, channel, index } =>
                defmt::write!(fmt, "Non-finite in {} on {} at {}", stage.as_str(), channel.as_str(), index),
            Self::MissingChannel { channel } =>
                defmt::write!(fmt, "Missing channel {}", channel.as_str()),
        }
    }
}
