//! Wavelet Shrinkage Denoising
//!
//! ## Overview
//!
//! Each channel is denoised independently over its whole ordered sequence:
//!
//! 1. Pad the sequence at the right edge by mirror extension up to a
//!    multiple of `2^levels`
//! 2. Decompose with the periodic DWT
//! 3. Soft-threshold every detail level with the universal threshold
//!    `t = σ · sqrt(2 · ln N)`, N being the *unpadded* length and σ the
//!    supplied noise scale
//! 4. Reconstruct and truncate back to N samples
//!
//! Output length always equals input length; the padding is the only
//! boundary treatment and is removed again before returning.
//!
//! ## Noise Scale
//!
//! By default σ is the population standard deviation of the channel
//! itself ([`NoiseScale::StdDev`]). The median absolute deviation of the
//! finest detail coefficients ([`NoiseScale::Mad`]) is available for
//! channels where the signal dominates the variance.
//!
//! ## Batch vs. Edge
//!
//! The transform is whole-sequence, not a per-sample filter. To replay the
//! exact same arithmetic on a device that only sees a stream, the
//! configuration can split the sequence into fixed blocks
//! ([`DenoiseMode::Blocked`]); each block is denoised as if it were a whole
//! sequence. A batch run and an edge replay configured with the same block
//! length produce identical output.
//!
//! ## Determinism
//!
//! No randomness, no data-dependent iteration order, `libm` for all
//! transcendental functions: identical input, noise scale and family
//! always give identical bits.

mod wavelet;

pub use wavelet::{Decomposition, FilterBank, WaveletFamily};

use alloc::vec::Vec;
use core::str::FromStr;

use crate::channels::{Channel, ChannelMatrix};
use crate::constants::wavelet::{DEFAULT_LEVELS, MAD_TO_SIGMA, MIN_DENOISE_LEN};
use crate::errors::{ensure_finite, PipelineError, PipelineResult, Stage};
use crate::stats::population_std;

/// How the noise scale of a block is estimated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NoiseScale {
    /// Population standard deviation of the raw block
    #[default]
    StdDev,
    /// Median absolute deviation of the finest detail level / 0.6745
    Mad,
}

impl NoiseScale {
    /// Identifier used in fingerprints
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StdDev => "std",
            Self::Mad => "mad",
        }
    }
}

impl FromStr for NoiseScale {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "std" => Ok(Self::StdDev),
            "mad" => Ok(Self::Mad),
            _ => Err(PipelineError::InvalidConfig { reason: "unknown noise scale" }),
        }
    }
}

/// Segmentation of a channel before denoising
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DenoiseMode {
    /// The whole sequence is one block
    #[default]
    WholeSequence,
    /// Consecutive non-overlapping blocks of `block_len` samples
    Blocked {
        /// Samples per block
        block_len: usize,
    },
}

/// Wavelet shrinkage denoiser for a single channel
#[derive(Debug, Clone)]
pub struct Denoiser {
    family: WaveletFamily,
    bank: FilterBank,
    levels: usize,
}

impl Denoiser {
    /// Create a denoiser with the given family and decomposition depth.
    ///
    /// `levels` is an upper bound; short sequences use fewer levels.
    pub fn new(family: WaveletFamily, levels: usize) -> Self {
        Self {
            family,
            bank: FilterBank::new(family),
            levels: levels.max(1),
        }
    }

    /// Wavelet family in use
    pub fn family(&self) -> WaveletFamily {
        self.family
    }

    /// Configured decomposition depth
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Decomposition depth actually used for a sequence of length `n`
    pub fn effective_levels(&self, n: usize) -> usize {
        self.levels.min(self.bank.max_levels(n))
    }

    /// Denoise a whole sequence using the supplied noise scale.
    ///
    /// Fails with `InsufficientData` below two samples, with `Numeric` on
    /// non-finite input or output, and with `InvalidInput` on a negative or
    /// non-finite noise scale.
    pub fn denoise(&self, signal: &[f64], noise_scale: f64, channel: Channel) -> PipelineResult<Vec<f64>> {
        if signal.len() < MIN_DENOISE_LEN {
            return Err(PipelineError::InsufficientData { required: MIN_DENOISE_LEN, available: signal.len() });
        }
        if !noise_scale.is_finite() || noise_scale < 0.0 {
            return Err(PipelineError::InvalidInput { field: "noise_scale", reason: "must be finite and non-negative" });
        }
        ensure_finite(signal, Stage::Denoise, channel)?;

        let n = signal.len();
        let levels = self.effective_levels(n);
        let padded = mirror_pad(signal, 1 << levels);

        let mut decomposition = self.bank.decompose(&padded, levels);
        let threshold = universal_threshold(noise_scale, n);
        for detail in decomposition.details.iter_mut() {
            soft_threshold(detail, threshold);
        }

        let mut result = self.bank.reconstruct(&decomposition);
        result.truncate(n);
        ensure_finite(&result, Stage::Denoise, channel)?;
        Ok(result)
    }

    /// Denoise a sequence with a noise scale estimated from itself.
    pub fn denoise_channel(&self, signal: &[f64], scale: NoiseScale, channel: Channel) -> PipelineResult<Vec<f64>> {
        let sigma = self.noise_scale(signal, scale, channel)?;
        self.denoise(signal, sigma, channel)
    }

    /// Estimate the noise scale of a sequence.
    ///
    /// Fails with `Numeric` when the estimate itself overflows, pointing at
    /// the largest-magnitude sample.
    pub fn noise_scale(&self, signal: &[f64], scale: NoiseScale, channel: Channel) -> PipelineResult<f64> {
        if signal.len() < MIN_DENOISE_LEN {
            return Err(PipelineError::InsufficientData { required: MIN_DENOISE_LEN, available: signal.len() });
        }
        ensure_finite(signal, Stage::Denoise, channel)?;
        let sigma = match scale {
            NoiseScale::StdDev => population_std(signal),
            NoiseScale::Mad => {
                let padded = mirror_pad(signal, 2);
                let decomposition = self.bank.decompose(&padded, 1);
                let mut magnitudes: Vec<f64> = decomposition.details[0].iter().map(|d| libm::fabs(*d)).collect();
                median(&mut magnitudes) / MAD_TO_SIGMA
            }
        };
        // finite input can still overflow the estimate
        if !sigma.is_finite() {
            return Err(PipelineError::Numeric { stage: Stage::Denoise, channel, index: largest_magnitude(signal) });
        }
        Ok(sigma)
    }

    /// Denoise a sequence block by block.
    ///
    /// With `WholeSequence` this is [`Denoiser::denoise_channel`]. With
    /// `Blocked`, every full block is denoised on its own; a trailing partial
    /// block is denoised if it holds at least two samples and passed through
    /// unchanged otherwise.
    pub fn denoise_blocks(
        &self,
        signal: &[f64],
        mode: DenoiseMode,
        scale: NoiseScale,
        channel: Channel,
    ) -> PipelineResult<Vec<f64>> {
        match mode {
            DenoiseMode::WholeSequence => self.denoise_channel(signal, scale, channel),
            DenoiseMode::Blocked { block_len } => {
                if block_len < MIN_DENOISE_LEN {
                    return Err(PipelineError::InvalidConfig { reason: "denoise block shorter than two samples" });
                }
                let mut out = Vec::with_capacity(signal.len());
                for block in signal.chunks(block_len) {
                    if block.len() < MIN_DENOISE_LEN {
                        ensure_finite(block, Stage::Denoise, channel)?;
                        out.extend_from_slice(block);
                    } else {
                        out.extend(self.denoise_channel(block, scale, channel)?);
                    }
                }
                Ok(out)
            }
        }
    }

    /// Denoise every column of a matrix, keeping channel order.
    pub fn denoise_matrix(
        &self,
        matrix: &ChannelMatrix,
        mode: DenoiseMode,
        scale: NoiseScale,
    ) -> PipelineResult<ChannelMatrix> {
        matrix.map_columns(|channel, column| self.denoise_blocks(column, mode, scale, channel))
    }

    /// Denoise every column on its own thread, reassembled in channel order.
    ///
    /// Produces exactly the same matrix as [`Denoiser::denoise_matrix`].
    #[cfg(feature = "std")]
    pub fn denoise_matrix_parallel(
        &self,
        matrix: &ChannelMatrix,
        mode: DenoiseMode,
        scale: NoiseScale,
    ) -> PipelineResult<ChannelMatrix> {
        let results: Vec<PipelineResult<Vec<f64>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = matrix
                .channels()
                .iter()
                .zip(matrix.columns())
                .map(|(channel, column)| scope.spawn(move || self.denoise_blocks(column, mode, scale, *channel)))
                .collect();
            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .unwrap_or(Err(PipelineError::InvalidInput { field: "columns", reason: "denoise worker panicked" }))
                })
                .collect()
        });

        let columns = results.into_iter().collect::<PipelineResult<Vec<_>>>()?;
        ChannelMatrix::from_columns(matrix.channels().to_vec(), columns, matrix.timestamps().to_vec())
    }
}

impl Default for Denoiser {
    fn default() -> Self {
        Self::new(WaveletFamily::default(), DEFAULT_LEVELS)
    }
}

/// Universal (VisuShrink) threshold: `σ · sqrt(2 · ln N)`.
pub fn universal_threshold(noise_scale: f64, n: usize) -> f64 {
    if n <= 1 {
        return 0.0;
    }
    noise_scale * libm::sqrt(2.0 * libm::log(n as f64))
}

/// Shrink coefficients toward zero: `sgn(x) · max(|x| − t, 0)`.
pub fn soft_threshold(coeffs: &mut [f64], threshold: f64) {
    for c in coeffs.iter_mut() {
        let magnitude = libm::fabs(*c) - threshold;
        *c = if magnitude > 0.0 { libm::copysign(magnitude, *c) } else { 0.0 };
    }
}

/// Extend `signal` by mirroring its tail until the length is a multiple of
/// `multiple`.
fn mirror_pad(signal: &[f64], multiple: usize) -> Vec<f64> {
    let n = signal.len();
    let target = n.div_ceil(multiple) * multiple;
    let mut padded = Vec::with_capacity(target);
    padded.extend_from_slice(signal);
    while padded.len() < target {
        let offset = padded.len() - n;
        let mirror = if offset < n { n - 1 - offset } else { 0 };
        padded.push(signal[mirror]);
    }
    padded
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Index of the first value with the largest magnitude
fn largest_magnitude(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if libm::fabs(*v) > libm::fabs(values[best]) {
            best = i;
        }
    }
    best
}
