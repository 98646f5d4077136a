//! Portable baseline records
//!
//! A [`BaselineRecord`] is the storage shape of a frozen baseline: the
//! configuration it was fitted under, spelled out with stable names, the
//! fingerprint of that configuration, and one entry per channel. The same
//! record is written as JSON and as Avro.
//!
//! Restoring a record trusts nothing that was stored:
//!
//! ```text
//! record ─► parse config ─► validate ─► recompute fingerprint ══ stored?
//!                                              │
//!             Baseline::from_parts ◄── stats (finite, std > 0, known names)
//! ```

use serde::{Deserialize, Serialize};
use windguard_core::{Baseline, Channel, ChannelStats, DenoiseMode, PipelineConfig, WindowConfig};

use crate::SchemaError;

/// Configuration as stored next to the statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigRecord {
    /// Channel names in tensor order
    pub channels: Vec<String>,
    /// Wavelet family name
    pub wavelet: String,
    /// Decomposition depth
    pub levels: i64,
    /// Zero means whole-sequence denoising
    pub block_len: i64,
    /// Noise scale estimator name
    pub noise_scale: String,
    /// Samples per window
    pub window_len: i64,
    /// Rows of each channel block
    pub rows: i64,
    /// Columns of each channel block
    pub cols: i64,
    /// Samples between consecutive windows
    pub stride: i64,
}

/// Statistics of one channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatRecord {
    /// Channel name
    pub channel: String,
    pub mean: f64,
    pub std_dev: f64,
}

/// Everything needed to restore a baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineRecord {
    /// Hex fingerprint of `config`
    pub fingerprint: String,
    /// Configuration the statistics were fitted under
    pub config: ConfigRecord,
    /// One entry per channel
    pub stats: Vec<StatRecord>,
}

impl BaselineRecord {
    /// Capture a baseline together with the configuration it belongs to.
    ///
    /// Fails if the baseline was fitted under a different configuration.
    pub fn new(config: &PipelineConfig, baseline: &Baseline) -> Result<Self, SchemaError> {
        baseline.check(config).map_err(SchemaError::InvalidBaseline)?;

        let block_len = match config.denoise_mode {
            DenoiseMode::WholeSequence => 0,
            DenoiseMode::Blocked { block_len } => to_long(block_len)?,
        };

        Ok(Self {
            fingerprint: baseline.fingerprint().to_string(),
            config: ConfigRecord {
                channels: config.channels.iter().map(|c| c.as_str().to_string()).collect(),
                wavelet: config.wavelet.as_str().to_string(),
                levels: to_long(config.levels)?,
                block_len,
                noise_scale: config.noise_scale.as_str().to_string(),
                window_len: to_long(config.window.len)?,
                rows: to_long(config.window.rows)?,
                cols: to_long(config.window.cols)?,
                stride: to_long(config.window.stride)?,
            },
            stats: baseline
                .stats()
                .iter()
                .map(|s| StatRecord { channel: s.channel.as_str().to_string(), mean: s.mean, std_dev: s.std_dev })
                .collect(),
        })
    }

    /// Rebuild and verify the configuration and baseline.
    pub fn restore(&self) -> Result<(PipelineConfig, Baseline), SchemaError> {
        let config = self.config.to_config()?;

        let stored = self.fingerprint.parse().map_err(SchemaError::InvalidBaseline)?;
        let computed = config.fingerprint();
        if stored != computed {
            return Err(SchemaError::FingerprintMismatch {
                stored: self.fingerprint.clone(),
                computed: computed.to_string(),
            });
        }

        let stats = self
            .stats
            .iter()
            .map(|s| {
                let channel = s.channel.parse::<Channel>().map_err(SchemaError::InvalidBaseline)?;
                ChannelStats::new(channel, s.mean, s.std_dev).map_err(SchemaError::InvalidBaseline)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let baseline = Baseline::from_parts(stored, stats).map_err(SchemaError::InvalidBaseline)?;
        baseline.select(&config.channels).map_err(SchemaError::InvalidBaseline)?;
        Ok((config, baseline))
    }
}

impl ConfigRecord {
    fn to_config(&self) -> Result<PipelineConfig, SchemaError> {
        let channels = self
            .channels
            .iter()
            .map(|name| name.parse::<Channel>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(SchemaError::InvalidBaseline)?;

        let denoise_mode = match from_long(self.block_len, "block_len")? {
            0 => DenoiseMode::WholeSequence,
            block_len => DenoiseMode::Blocked { block_len },
        };

        let config = PipelineConfig {
            channels,
            wavelet: self.wavelet.parse().map_err(SchemaError::InvalidBaseline)?,
            levels: from_long(self.levels, "levels")?,
            denoise_mode,
            noise_scale: self.noise_scale.parse().map_err(SchemaError::InvalidBaseline)?,
            window: WindowConfig {
                len: from_long(self.window_len, "window_len")?,
                rows: from_long(self.rows, "rows")?,
                cols: from_long(self.cols, "cols")?,
                stride: from_long(self.stride, "stride")?,
            },
        };
        config.validate().map_err(SchemaError::InvalidBaseline)?;
        Ok(config)
    }
}

fn to_long(value: usize) -> Result<i64, SchemaError> {
    i64::try_from(value).map_err(|_| SchemaError::ValidationError(format!("{} does not fit an Avro long", value)))
}

fn from_long(value: i64, field: &str) -> Result<usize, SchemaError> {
    usize::try_from(value).map_err(|_| SchemaError::ValidationError(format!("{} out of range: {}", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use windguard_core::{Fingerprint, NoiseScale, WaveletFamily};

    fn config() -> PipelineConfig {
        PipelineConfig::builder()
            .channels(&[Channel::Roll, Channel::GyroX, Channel::Voltage])
            .wavelet(WaveletFamily::Sym4)
            .noise_scale(NoiseScale::Mad)
            .blocked(200)
            .build()
            .unwrap()
    }

    fn baseline(config: &PipelineConfig) -> Baseline {
        let stats = vec![
            ChannelStats::new(Channel::Roll, 0.01, 0.2).unwrap(),
            ChannelStats::new(Channel::GyroX, -0.002, 0.05).unwrap(),
            ChannelStats::new(Channel::Voltage, 24.1, 0.3).unwrap(),
        ];
        Baseline::from_parts(config.fingerprint(), stats).unwrap()
    }

    #[test]
    fn record_restores_config_and_stats() {
        let config = config();
        let baseline = baseline(&config);
        let record = BaselineRecord::new(&config, &baseline).unwrap();

        assert_eq!(record.config.block_len, 200);
        assert_eq!(record.config.noise_scale, "mad");
        assert_eq!(record.config.channels, vec!["roll", "gyro_x", "voltage"]);

        let (restored_config, restored) = record.restore().unwrap();
        assert_eq!(restored_config, config);
        assert_eq!(restored, baseline);
    }

    #[test]
    fn foreign_baseline_is_not_recorded() {
        let config = config();
        let other = Baseline::from_parts(Fingerprint(7), baseline(&config).stats().to_vec()).unwrap();
        assert!(matches!(
            BaselineRecord::new(&config, &other),
            Err(SchemaError::InvalidBaseline(_))
        ));
    }

    #[test]
    fn edited_config_fails_fingerprint() {
        let config = config();
        let mut record = BaselineRecord::new(&config, &baseline(&config)).unwrap();
        record.config.stride = 5;
        assert!(matches!(record.restore(), Err(SchemaError::FingerprintMismatch { .. })));
    }

    #[test]
    fn unknown_channel_and_bad_std_are_rejected() {
        let config = config();
        let good = BaselineRecord::new(&config, &baseline(&config)).unwrap();

        let mut record = good.clone();
        record.stats[1].channel = "rotor_speed".to_string();
        assert!(matches!(record.restore(), Err(SchemaError::InvalidBaseline(_))));

        let mut record = good.clone();
        record.stats[2].std_dev = 0.0;
        assert!(matches!(record.restore(), Err(SchemaError::InvalidBaseline(_))));

        let mut record = good;
        record.stats[0].mean = f64::NAN;
        assert!(matches!(record.restore(), Err(SchemaError::InvalidBaseline(_))));
    }

    #[test]
    fn missing_channel_is_rejected() {
        let config = config();
        let mut record = BaselineRecord::new(&config, &baseline(&config)).unwrap();
        record.stats.pop();
        assert!(matches!(record.restore(), Err(SchemaError::InvalidBaseline(_))));
    }
}
