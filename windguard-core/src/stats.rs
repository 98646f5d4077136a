//! Statistics Store and Z-Score Normalizer
//!
//! ## Fit Once, Apply Forever
//!
//! A [`Baseline`] is fitted a single time on denoised normal-operation data
//! and then frozen. Every later normalization uses the stored mean and
//! standard deviation, never statistics of the batch being transformed, so
//! the model sees operational data on the scale it was trained on.
//!
//! ```text
//! fit:          reference ──► mean_c, std_c  (per channel, population)
//! normalize:    z = (v − mean_c) / std_c
//! denormalize:  v = z · std_c + mean_c
//! ```
//!
//! ## Binding to Configuration
//!
//! The baseline stores the [`Fingerprint`] of the configuration it was
//! fitted under. Applying it under any other configuration fails with
//! `ConfigMismatch` instead of silently producing mis-scaled tensors.
//!
//! ## Degenerate Channels
//!
//! A channel with zero or non-finite standard deviation cannot be
//! standardized. Fitting fails with `DegenerateChannel` and no baseline is
//! produced, so nothing can be persisted.

use alloc::vec::Vec;

use crate::channels::{Channel, ChannelMatrix};
use crate::config::{Fingerprint, PipelineConfig};
use crate::constants::normalize::MIN_RELATIVE_STD;
use crate::errors::{ensure_finite, PipelineError, PipelineResult, Stage};

/// Arithmetic mean; zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation, two-pass; zero for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    libm::sqrt(variance)
}

/// Frozen statistics of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelStats {
    /// Channel the statistics describe
    pub channel: Channel,
    /// Mean of the denoised reference values
    pub mean: f64,
    /// Population standard deviation, always positive
    pub std_dev: f64,
}

impl ChannelStats {
    /// Validated statistics; `std_dev` must be finite and clear of zero.
    pub fn new(channel: Channel, mean: f64, std_dev: f64) -> PipelineResult<Self> {
        if !mean.is_finite() {
            return Err(PipelineError::Numeric { stage: Stage::Fit, channel, index: 0 });
        }
        let floor = MIN_RELATIVE_STD * libm::fabs(mean).max(1.0);
        if !std_dev.is_finite() || std_dev <= floor {
            return Err(PipelineError::DegenerateChannel { channel, std_dev });
        }
        Ok(Self { channel, mean, std_dev })
    }

    /// Fit from one column of reference data
    pub fn fit(channel: Channel, values: &[f64]) -> PipelineResult<Self> {
        if values.is_empty() {
            return Err(PipelineError::InsufficientData { required: 1, available: 0 });
        }
        ensure_finite(values, Stage::Fit, channel)?;
        Self::new(channel, mean(values), population_std(values))
    }

    /// `(v − mean) / std`
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    /// `z · std + mean`
    #[inline]
    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.std_dev + self.mean
    }
}

/// Immutable per-channel statistics bound to one configuration
///
/// Only serialized directly; loading goes through [`Baseline::from_parts`]
/// so stored values are re-validated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Baseline {
    fingerprint: Fingerprint,
    stats: Vec<ChannelStats>,
}

impl Baseline {
    /// Fit statistics from a denoised reference matrix.
    ///
    /// Fails with `InsufficientData` on an empty reference and with
    /// `DegenerateChannel` on the first channel without spread.
    pub fn fit(reference: &ChannelMatrix, fingerprint: Fingerprint) -> PipelineResult<Self> {
        if reference.is_empty() {
            return Err(PipelineError::InsufficientData { required: 1, available: 0 });
        }
        let stats = reference
            .channels()
            .iter()
            .zip(reference.columns())
            .map(|(channel, column)| ChannelStats::fit(*channel, column))
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(Self { fingerprint, stats })
    }

    /// Rebuild a baseline from stored parts, re-validating every entry.
    pub fn from_parts(fingerprint: Fingerprint, stats: Vec<ChannelStats>) -> PipelineResult<Self> {
        for (i, entry) in stats.iter().enumerate() {
            ChannelStats::new(entry.channel, entry.mean, entry.std_dev)?;
            if stats[..i].iter().any(|s| s.channel == entry.channel) {
                return Err(PipelineError::InvalidInput { field: "stats", reason: "duplicate channel" });
            }
        }
        Ok(Self { fingerprint, stats })
    }

    /// Fingerprint of the configuration this baseline was fitted under
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Per-channel statistics in fit order
    pub fn stats(&self) -> &[ChannelStats] {
        &self.stats
    }

    /// Statistics for one channel
    pub fn get(&self, channel: Channel) -> Option<&ChannelStats> {
        self.stats.iter().find(|s| s.channel == channel)
    }

    /// Fail with `ConfigMismatch` unless fitted under `config`.
    pub fn check(&self, config: &PipelineConfig) -> PipelineResult<()> {
        let active = config.fingerprint();
        if active != self.fingerprint {
            return Err(PipelineError::ConfigMismatch { expected: self.fingerprint, found: active });
        }
        Ok(())
    }

    /// Statistics for `channels`, in that order.
    pub fn select(&self, channels: &[Channel]) -> PipelineResult<Vec<ChannelStats>> {
        channels
            .iter()
            .map(|c| self.get(*c).copied().ok_or(PipelineError::MissingChannel { channel: *c }))
            .collect()
    }

    /// Standardize a matrix with the frozen statistics.
    pub fn normalize(&self, matrix: &ChannelMatrix) -> PipelineResult<ChannelMatrix> {
        self.apply(matrix, ChannelStats::normalize)
    }

    /// Map standardized values back to the original scale.
    pub fn denormalize(&self, matrix: &ChannelMatrix) -> PipelineResult<ChannelMatrix> {
        self.apply(matrix, ChannelStats::denormalize)
    }

    fn apply(&self, matrix: &ChannelMatrix, op: fn(&ChannelStats, f64) -> f64) -> PipelineResult<ChannelMatrix> {
        let stats = self.select(matrix.channels())?;
        let mut next = stats.iter();
        matrix.map_columns(|channel, column| {
            let entry = next.next().ok_or(PipelineError::MissingChannel { channel })?;
            let out: Vec<f64> = column.iter().map(|v| op(entry, *v)).collect();
            ensure_finite(&out, Stage::Normalize, channel)?;
            Ok(out)
        })
    }
}

/// Standardize one frame in place; `stats` follows the frame's channel order.
///
/// `index` is the frame's position in its sequence, used for error reports.
pub fn normalize_frame(stats: &[ChannelStats], frame: &mut [f64], index: usize) -> PipelineResult<()> {
    for (value, entry) in frame.iter_mut().zip(stats) {
        *value = entry.normalize(*value);
        if !value.is_finite() {
            return Err(PipelineError::Numeric { stage: Stage::Normalize, channel: entry.channel, index });
        }
    }
    Ok(())
}
