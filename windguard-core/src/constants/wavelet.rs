//! Wavelet Filter Banks and Denoising Defaults
//!
//! Low-pass (scaling) decomposition filters for the supported orthogonal
//! wavelet families. High-pass filters are derived with the quadrature
//! mirror relation, so only the scaling filters are tabulated.
//!
//! Every table has unit energy (sum of squares == 1) and sums to sqrt(2).

/// Haar scaling filter (2 taps).
pub const HAAR: [f64; 2] = [
    core::f64::consts::FRAC_1_SQRT_2,
    core::f64::consts::FRAC_1_SQRT_2,
];

/// Daubechies-4 scaling filter (8 taps, 4 vanishing moments).
pub const DB4: [f64; 8] = [
    -0.010597401784997278,
     0.032883011666982945,
     0.030841381835986965,
    -0.187034811718881060,
    -0.027983769416983849,
     0.630880767929590380,
     0.714846570552541600,
     0.230377813308855140,
];

/// Daubechies-8 scaling filter (16 taps, 8 vanishing moments).
pub const DB8: [f64; 16] = [
    -0.00011747678400228192,
     0.00067544940599855680,
    -0.00039174037299597710,
    -0.00487035299301066000,
     0.00874609404701565500,
     0.01398102791701551600,
    -0.04408825393106472000,
    -0.01736930100202211000,
     0.12874742662018600000,
     0.00047248457399797254,
    -0.28401554296242810000,
    -0.01582910525602389300,
     0.58535468365486910000,
     0.67563073629801280000,
     0.31287159091446590000,
     0.05441584224308161000,
];

/// Symlet-4 scaling filter (8 taps, near-symmetric).
pub const SYM4: [f64; 8] = [
    -0.075765714789273330,
    -0.029635527645954480,
     0.497618667632563040,
     0.803738751805916220,
     0.297857795605605200,
    -0.099219543576847220,
    -0.012603967262037833,
     0.032223100604071270,
];

/// Default number of decomposition levels.
pub const DEFAULT_LEVELS: usize = 1;

/// Shortest sequence the denoiser accepts.
pub const MIN_DENOISE_LEN: usize = 2;

/// Converts a median absolute deviation into a Gaussian sigma estimate.
pub const MAD_TO_SIGMA: f64 = 0.6745;
