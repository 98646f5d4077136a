//! Pipeline Configuration and Fingerprinting
//!
//! Everything that changes the numbers a tensor contains lives in
//! [`PipelineConfig`]: the ordered channel list, the wavelet family and
//! depth, the denoising mode and the window geometry.
//!
//! ## Fingerprint
//!
//! A baseline is only valid for the configuration it was fitted under. The
//! [`Fingerprint`] is the MD5 digest of a canonical text encoding of the
//! configuration:
//!
//! ```text
//! windguard/v1;channels=roll,pitch,yaw,gyro_x,gyro_y,gyro_z;wavelet=db4;
//! levels=1;denoise=whole;noise=std;window=100;rows=10;cols=10;stride=1
//! ```
//!
//! The encoding only uses stable names, so the digest is identical across
//! platforms and builds.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::{self, Write};
use core::str::FromStr;

use crate::channels::Channel;
use crate::constants::wavelet::{DEFAULT_LEVELS, MIN_DENOISE_LEN};
use crate::constants::window::{DEFAULT_COLS, DEFAULT_ROWS, DEFAULT_STRIDE, DEFAULT_WINDOW_LEN};
use crate::denoise::{DenoiseMode, NoiseScale, WaveletFamily};
use crate::errors::{PipelineError, PipelineResult};

/// Version tag at the head of the canonical encoding
const FINGERPRINT_VERSION: &str = "windguard/v1";

/// Channels used when none are configured explicitly
pub const DEFAULT_CHANNELS: [Channel; 6] = [
    Channel::Roll,
    Channel::Pitch,
    Channel::Yaw,
    Channel::GyroX,
    Channel::GyroY,
    Channel::GyroZ,
];

/// Sliding-window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowConfig {
    /// Samples per window (L)
    pub len: usize,
    /// Rows of each channel block (R)
    pub rows: usize,
    /// Columns of each channel block (C)
    pub cols: usize,
    /// Samples between consecutive windows (S)
    pub stride: usize,
}

impl WindowConfig {
    /// Square-ish window of `rows × cols` samples
    pub const fn new(rows: usize, cols: usize, stride: usize) -> Self {
        Self { len: rows * cols, rows, cols, stride }
    }

    /// Check the geometry on its own.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.len == 0 {
            return Err(PipelineError::InvalidConfig { reason: "window length must be positive" });
        }
        if self.rows.checked_mul(self.cols) != Some(self.len) {
            return Err(PipelineError::InvalidConfig { reason: "rows * cols must equal window length" });
        }
        if self.stride == 0 {
            return Err(PipelineError::InvalidConfig { reason: "stride must be at least 1" });
        }
        Ok(())
    }

    /// Number of full windows over a sequence of `n` samples.
    ///
    /// `floor((n − L) / S) + 1` when `n >= L`, zero otherwise.
    pub fn expected_count(&self, n: usize) -> usize {
        if self.stride == 0 || n < self.len {
            0
        } else {
            (n - self.len) / self.stride + 1
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            len: DEFAULT_WINDOW_LEN,
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            stride: DEFAULT_STRIDE,
        }
    }
}

/// Complete preprocessing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PipelineConfig {
    /// Channels in tensor axis-0 order
    pub channels: Vec<Channel>,
    /// Wavelet used by the denoiser
    pub wavelet: WaveletFamily,
    /// Maximum decomposition depth
    pub levels: usize,
    /// Whole-sequence or blocked denoising
    pub denoise_mode: DenoiseMode,
    /// Noise scale estimator
    pub noise_scale: NoiseScale,
    /// Window geometry
    pub window: WindowConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS.to_vec(),
            wavelet: WaveletFamily::default(),
            levels: DEFAULT_LEVELS,
            denoise_mode: DenoiseMode::default(),
            noise_scale: NoiseScale::default(),
            window: WindowConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Start from the defaults
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Reject configurations that can never produce valid tensors.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.channels.is_empty() {
            return Err(PipelineError::InvalidConfig { reason: "channel list is empty" });
        }
        for (i, channel) in self.channels.iter().enumerate() {
            if self.channels[..i].contains(channel) {
                return Err(PipelineError::InvalidConfig { reason: "duplicate channel" });
            }
        }
        if self.levels == 0 {
            return Err(PipelineError::InvalidConfig { reason: "decomposition levels must be positive" });
        }
        self.window.validate()?;
        if let DenoiseMode::Blocked { block_len } = self.denoise_mode {
            if block_len < MIN_DENOISE_LEN {
                return Err(PipelineError::InvalidConfig { reason: "denoise block shorter than two samples" });
            }
            if block_len < self.window.len {
                return Err(PipelineError::InvalidConfig { reason: "denoise block shorter than the window" });
            }
        }
        Ok(())
    }

    /// Canonical text encoding hashed into the fingerprint
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_canonical(&mut out);
        out
    }

    fn write_canonical<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "{};channels=", FINGERPRINT_VERSION)?;
        for (i, channel) in self.channels.iter().enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }
            out.write_str(channel.as_str())?;
        }
        write!(out, ";wavelet={};levels={};denoise=", self.wavelet, self.levels)?;
        match self.denoise_mode {
            DenoiseMode::WholeSequence => out.write_str("whole")?,
            DenoiseMode::Blocked { block_len } => write!(out, "blocked:{}", block_len)?,
        }
        write!(
            out,
            ";noise={};window={};rows={};cols={};stride={}",
            self.noise_scale.as_str(),
            self.window.len,
            self.window.rows,
            self.window.cols,
            self.window.stride,
        )
    }

    /// Deterministic digest binding a baseline to this configuration
    pub fn fingerprint(&self) -> Fingerprint {
        let digest = md5::compute(self.canonical().as_bytes());
        Fingerprint(u128::from_be_bytes(digest.0))
    }
}

/// Builder for [`PipelineConfig`]
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: PipelineConfig,
}

impl ConfigBuilder {
    /// Builder seeded with the defaults
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    /// Replace the channel list
    pub fn channels(mut self, channels: &[Channel]) -> Self {
        self.config.channels = channels.to_vec();
        self
    }

    /// Set the wavelet family
    pub fn wavelet(mut self, family: WaveletFamily) -> Self {
        self.config.wavelet = family;
        self
    }

    /// Set the decomposition depth
    pub fn levels(mut self, levels: usize) -> Self {
        self.config.levels = levels;
        self
    }

    /// Denoise in fixed blocks instead of whole sequences
    pub fn blocked(mut self, block_len: usize) -> Self {
        self.config.denoise_mode = DenoiseMode::Blocked { block_len };
        self
    }

    /// Set the noise scale estimator
    pub fn noise_scale(mut self, scale: NoiseScale) -> Self {
        self.config.noise_scale = scale;
        self
    }

    /// Set window geometry; the length is `rows * cols`
    pub fn window(mut self, rows: usize, cols: usize) -> Self {
        self.config.window.rows = rows;
        self.config.window.cols = cols;
        self.config.window.len = rows.saturating_mul(cols);
        self
    }

    /// Set the stride
    pub fn stride(mut self, stride: usize) -> Self {
        self.config.window.stride = stride;
        self
    }

    /// Validate and finish
    pub fn build(self) -> PipelineResult<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 128-bit configuration digest, shown as 32 lowercase hex digits
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(pub u128);

impl Fingerprint {
    /// Raw digest value
    pub const fn value(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl FromStr for Fingerprint {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(PipelineError::InvalidInput { field: "fingerprint", reason: "expected 32 hex digits" });
        }
        u128::from_str_radix(s, 16)
            .map(Fingerprint)
            .map_err(|_| PipelineError::InvalidInput { field: "fingerprint", reason: "expected 32 hex digits" })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Fingerprint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.channels.len(), 6);
        assert_eq!(config.window.len, 100);
    }

    #[test]
    fn canonical_encoding_is_stable() {
        assert_eq!(
            PipelineConfig::default().canonical(),
            "windguard/v1;channels=roll,pitch,yaw,gyro_x,gyro_y,gyro_z;wavelet=db4;levels=1;\
             denoise=whole;noise=std;window=100;rows=10;cols=10;stride=1"
        );
    }

    #[test]
    fn fingerprint_tracks_every_field() {
        let base = PipelineConfig::default().fingerprint();
        assert_eq!(base, PipelineConfig::default().fingerprint());

        let reordered = PipelineConfig::builder()
            .channels(&[Channel::Pitch, Channel::Roll, Channel::Yaw, Channel::GyroX, Channel::GyroY, Channel::GyroZ])
            .build()
            .unwrap();
        assert_ne!(reordered.fingerprint(), base);

        let strided = PipelineConfig::builder().stride(5).build().unwrap();
        assert_ne!(strided.fingerprint(), base);

        let blocked = PipelineConfig::builder().blocked(200).build().unwrap();
        assert_ne!(blocked.fingerprint(), base);
    }

    #[test]
    fn fingerprint_text_round_trip() {
        let fp = PipelineConfig::default().fingerprint();
        let text = fp.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(text.parse::<Fingerprint>().unwrap(), fp);
        assert!("xyz".parse::<Fingerprint>().is_err());
        assert!("+0000000000000000000000000000000".parse::<Fingerprint>().is_err());
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let cases = [
            PipelineConfig::builder().channels(&[]).build(),
            PipelineConfig::builder().channels(&[Channel::Roll, Channel::Roll]).build(),
            PipelineConfig::builder().levels(0).build(),
            PipelineConfig::builder().stride(0).build(),
            PipelineConfig::builder().blocked(1).build(),
            PipelineConfig::builder().blocked(50).build(),
        ];
        for case in cases {
            assert!(matches!(case, Err(PipelineError::InvalidConfig { .. })));
        }

        let mut mismatched = PipelineConfig::default();
        mismatched.window.len = 99;
        assert!(matches!(mismatched.validate(), Err(PipelineError::InvalidConfig { .. })));
    }

    #[test]
    fn expected_count_formula() {
        let window = WindowConfig::default();
        assert_eq!(window.expected_count(150), 51);
        assert_eq!(window.expected_count(100), 1);
        assert_eq!(window.expected_count(50), 0);
        assert_eq!(WindowConfig::new(5, 4, 3).expected_count(30), 4);
    }
}
