//! Z-Score Normalization Limits

/// Smallest standard deviation accepted, relative to `max(|mean|, 1)`.
///
/// Denoising a constant channel leaves rounding noise of a few ulps; that
/// spread is treated as zero.
pub const MIN_RELATIVE_STD: f64 = 1e-12;
