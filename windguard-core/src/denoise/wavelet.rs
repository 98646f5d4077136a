//! Orthogonal wavelet filter banks
//!
//! Periodic-extension discrete wavelet transform with perfect
//! reconstruction. Analysis convolves with the low-pass `h` and high-pass
//! `g` filters and decimates by two; synthesis is the exact transpose.
//!
//! ```text
//! a[k] = Σ_j h[j] · x[(2k − j) mod N]
//! d[k] = Σ_j g[j] · x[(2k − j) mod N]
//! ```
//!
//! Only even-length inputs are transformed; the denoiser pads beforehand.

use alloc::vec;
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::constants::wavelet::{DB4, DB8, HAAR, SYM4};
use crate::errors::PipelineError;

/// Supported wavelet families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WaveletFamily {
    /// Haar (2 taps)
    Haar,
    /// Daubechies-4 (8 taps)
    #[default]
    Db4,
    /// Daubechies-8 (16 taps)
    Db8,
    /// Symlet-4 (8 taps)
    Sym4,
}

impl WaveletFamily {
    /// Identifier used in configuration files and fingerprints
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Haar => "haar",
            Self::Db4 => "db4",
            Self::Db8 => "db8",
            Self::Sym4 => "sym4",
        }
    }

    /// Scaling (low-pass) filter coefficients
    pub fn scaling_filter(&self) -> &'static [f64] {
        match self {
            Self::Haar => &HAAR,
            Self::Db4 => &DB4,
            Self::Db8 => &DB8,
            Self::Sym4 => &SYM4,
        }
    }
}

impl fmt::Display for WaveletFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WaveletFamily {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "haar" => Ok(Self::Haar),
            "db4" => Ok(Self::Db4),
            "db8" => Ok(Self::Db8),
            "sym4" => Ok(Self::Sym4),
            _ => Err(PipelineError::InvalidConfig { reason: "unknown wavelet family" }),
        }
    }
}

/// Multi-level decomposition result.
///
/// `details[0]` is the finest scale, `details[last]` the coarsest.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Approximation coefficients of the deepest level
    pub approx: Vec<f64>,
    /// Detail coefficients, finest level first
    pub details: Vec<Vec<f64>>,
}

/// Analysis/synthesis filter pair for one wavelet family
#[derive(Debug, Clone)]
pub struct FilterBank {
    h: &'static [f64],
    g: Vec<f64>,
}

impl FilterBank {
    /// Build the filter pair; the high-pass filter follows the
    /// alternating flip `g[n] = (−1)^n · h[L−1−n]`.
    pub fn new(family: WaveletFamily) -> Self {
        let h = family.scaling_filter();
        let len = h.len();
        let g = (0..len)
            .map(|n| {
                let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
                sign * h[len - 1 - n]
            })
            .collect();
        Self { h, g }
    }

    /// Number of filter taps
    pub fn filter_len(&self) -> usize {
        self.h.len()
    }

    /// Deepest decomposition a sequence of length `n` supports.
    ///
    /// Each level halves the length; stop once it drops below the filter
    /// length. Always at least one level for `n >= 2`.
    pub fn max_levels(&self, n: usize) -> usize {
        if n < 2 {
            return 0;
        }
        let mut len = n;
        let mut levels = 0;
        while len >= self.h.len() && len >= 2 {
            len /= 2;
            levels += 1;
        }
        levels.max(1)
    }

    /// Forward transform. The length must be divisible by `2^levels`.
    pub fn decompose(&self, signal: &[f64], levels: usize) -> Decomposition {
        let mut approx = signal.to_vec();
        let mut details = Vec::with_capacity(levels);
        for _ in 0..levels {
            let (a, d) = self.analysis_step(&approx);
            details.push(d);
            approx = a;
        }
        Decomposition { approx, details }
    }

    /// Inverse transform, coarsest level first.
    pub fn reconstruct(&self, decomposition: &Decomposition) -> Vec<f64> {
        let mut current = decomposition.approx.clone();
        for detail in decomposition.details.iter().rev() {
            current = self.synthesis_step(&current, detail);
        }
        current
    }

    fn analysis_step(&self, signal: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let n = signal.len();
        let half = n / 2;
        let mut approx = vec![0.0; half];
        let mut detail = vec![0.0; half];

        for k in 0..half {
            let mut a = 0.0;
            let mut d = 0.0;
            for (j, (h, g)) in self.h.iter().zip(&self.g).enumerate() {
                let idx = periodic_index(2 * k, j, n);
                a += h * signal[idx];
                d += g * signal[idx];
            }
            approx[k] = a;
            detail[k] = d;
        }

        (approx, detail)
    }

    fn synthesis_step(&self, approx: &[f64], detail: &[f64]) -> Vec<f64> {
        let half = approx.len();
        let n = half * 2;
        let mut result = vec![0.0; n];

        for k in 0..half {
            for (j, (h, g)) in self.h.iter().zip(&self.g).enumerate() {
                let idx = periodic_index(2 * k, j, n);
                result[idx] += h * approx[k] + g * detail[k];
            }
        }

        result
    }
}

/// `(pos − offset) mod n` for a filter tap that may wrap several times
fn periodic_index(pos: usize, offset: usize, n: usize) -> usize {
    (pos as isize - offset as isize).rem_euclid(n as isize) as usize
}
