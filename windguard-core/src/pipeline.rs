//! Preprocessing Pipeline
//!
//! Wires the stages together in a fixed order:
//!
//! ```text
//! samples ─► order check ─► extract (quaternion → roll/pitch/yaw)
//!         ─► denoise (per channel) ─► normalize (frozen baseline)
//!         ─► windows (channels × R × C tensors)
//! ```
//!
//! [`Pipeline::fit`] stops after denoising and fits the [`Baseline`];
//! [`Pipeline::transform`] runs the full chain against a baseline that was
//! fitted under the same configuration.
//!
//! ```rust
//! use windguard_core::{Pipeline, PipelineConfig, Sample};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let samples: Vec<Sample> = (0..150u64)
//!     .map(|i| {
//!         let a = i as f64 * 0.05;
//!         Sample::builder("wt01", "imu0", i * 1000)
//!             .unwrap()
//!             .quaternion(a.sin() * 0.1, 0.05 * a.cos(), 0.02, 0.99)
//!             .gyro(a.sin(), a.cos(), (2.0 * a).sin())
//!             .build()
//!     })
//!     .collect();
//!
//! let baseline = pipeline.fit(&samples).unwrap();
//! let tensors = pipeline.transform(&samples, &baseline).unwrap();
//! assert_eq!(tensors.len(), 51);
//! assert_eq!(tensors[0].shape(), (6, 10, 10));
//! ```

use alloc::vec::Vec;

use crate::channels::ChannelMatrix;
use crate::config::{Fingerprint, PipelineConfig};
use crate::denoise::Denoiser;
use crate::errors::PipelineResult;
use crate::sample::Sample;
use crate::stats::Baseline;
use crate::window::{Tensor, Windows};

/// Denoised, normalized sequence ready for windowing
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSequence {
    matrix: ChannelMatrix,
}

impl PreparedSequence {
    /// Normalized values, one column per channel
    pub fn matrix(&self) -> &ChannelMatrix {
        &self.matrix
    }

    /// Take ownership of the normalized matrix
    pub fn into_matrix(self) -> ChannelMatrix {
        self.matrix
    }

    /// Number of time steps
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    /// True when no time steps remain
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

/// Configured preprocessing pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    fingerprint: Fingerprint,
    denoiser: Denoiser,
    parallel_channels: bool,
    /// Concurrent streams in `transform_fleet`; zero follows the host
    fleet_workers: usize,
}

impl Pipeline {
    /// Validate `config` and build the stages.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let fingerprint = config.fingerprint();
        let denoiser = Denoiser::new(config.wavelet, config.levels);
        log_debug!("pipeline configured: {}", config.canonical());
        Ok(Self {
            config,
            fingerprint,
            denoiser,
            parallel_channels: false,
            fleet_workers: 0,
        })
    }

    /// Denoise channels on separate threads.
    ///
    /// Output is identical to the sequential path.
    #[cfg(feature = "std")]
    pub fn with_parallel_channels(mut self, enabled: bool) -> Self {
        self.parallel_channels = enabled;
        self
    }

    /// Cap the streams `transform_fleet` runs at once.
    ///
    /// Zero, the default, uses the host's available parallelism.
    #[cfg(feature = "std")]
    pub fn with_fleet_workers(mut self, workers: usize) -> Self {
        self.fleet_workers = workers;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fingerprint of the active configuration
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Per-channel denoiser
    pub fn denoiser(&self) -> &Denoiser {
        &self.denoiser
    }

    /// Order-check and extract the configured channels.
    pub fn extract(&self, samples: &[Sample]) -> PipelineResult<ChannelMatrix> {
        ChannelMatrix::from_samples(samples, &self.config.channels)
    }

    /// Denoise every channel of an extracted matrix.
    pub fn denoise(&self, matrix: &ChannelMatrix) -> PipelineResult<ChannelMatrix> {
        if self.parallel_channels {
            return self.denoise_parallel(matrix);
        }
        self.denoiser.denoise_matrix(matrix, self.config.denoise_mode, self.config.noise_scale)
    }

    #[cfg(feature = "std")]
    fn denoise_parallel(&self, matrix: &ChannelMatrix) -> PipelineResult<ChannelMatrix> {
        self.denoiser.denoise_matrix_parallel(matrix, self.config.denoise_mode, self.config.noise_scale)
    }

    #[cfg(not(feature = "std"))]
    fn denoise_parallel(&self, matrix: &ChannelMatrix) -> PipelineResult<ChannelMatrix> {
        self.denoiser.denoise_matrix(matrix, self.config.denoise_mode, self.config.noise_scale)
    }

    /// Fit a baseline on normal-operation reference samples.
    ///
    /// Nothing is returned unless every channel has usable spread.
    pub fn fit(&self, reference: &[Sample]) -> PipelineResult<Baseline> {
        let extracted = self.extract(reference)?;
        let denoised = self.denoise(&extracted)?;
        let baseline = Baseline::fit(&denoised, self.fingerprint)?;
        log_debug!("fitted baseline {} on {} samples", self.fingerprint, reference.len());
        Ok(baseline)
    }

    /// Extract, denoise and normalize with a frozen baseline.
    pub fn prepare(&self, samples: &[Sample], baseline: &Baseline) -> PipelineResult<PreparedSequence> {
        if let Err(err) = baseline.check(&self.config) {
            log_warn!("rejecting baseline: {}", err);
            return Err(err);
        }
        let extracted = self.extract(samples)?;
        let denoised = self.denoise(&extracted)?;
        let matrix = baseline.normalize(&denoised)?;
        Ok(PreparedSequence { matrix })
    }

    /// Lazy tensors over a prepared sequence
    pub fn windows<'a>(&self, prepared: &'a PreparedSequence) -> Windows<'a> {
        Windows::new(&prepared.matrix, self.config.window)
    }

    /// Run the full chain and collect every tensor.
    ///
    /// Fewer samples than one window yields an empty result once the
    /// baseline matches and the samples extract cleanly.
    pub fn transform(&self, samples: &[Sample], baseline: &Baseline) -> PipelineResult<Vec<Tensor>> {
        if samples.len() < self.config.window.len {
            baseline.check(&self.config)?;
            self.extract(samples)?;
            log_debug!("{} samples, window needs {}", samples.len(), self.config.window.len);
            return Ok(Vec::new());
        }
        let prepared = self.prepare(samples, baseline)?;
        Ok(self.windows(&prepared).collect())
    }

    /// Transform a mixed set of samples stream by stream.
    ///
    /// Samples are grouped by (turbine, device), keeping arrival order inside
    /// each group. Streams run on scoped threads, at most `fleet_workers` at
    /// a time; the result is keyed and ordered by stream id, and the first
    /// failing stream in that order determines the error.
    #[cfg(feature = "std")]
    pub fn transform_fleet(
        &self,
        samples: &[Sample],
        baseline: &Baseline,
    ) -> PipelineResult<std::collections::BTreeMap<crate::sample::StreamId, Vec<Tensor>>> {
        use crate::errors::PipelineError;

        baseline.check(&self.config)?;
        let streams = crate::sample::partition_by_stream(samples);

        let workers = match self.fleet_workers {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            n => n,
        };
        let streams: Vec<_> = streams.into_iter().collect();

        let mut out = std::collections::BTreeMap::new();
        for chunk in streams.chunks(workers) {
            let results: Vec<_> = std::thread::scope(|scope| {
                let handles: Vec<_> = chunk
                    .iter()
                    .map(|(id, stream)| (*id, scope.spawn(move || self.transform(stream, baseline))))
                    .collect();
                handles
                    .into_iter()
                    .map(|(id, handle)| {
                        let result = handle.join().unwrap_or(Err(PipelineError::InvalidInput {
                            field: "samples",
                            reason: "stream worker panicked",
                        }));
                        (id, result)
                    })
                    .collect()
            });

            for (id, result) in results {
                match result {
                    Ok(tensors) => {
                        out.insert(id, tensors);
                    }
                    Err(err) => {
                        log_warn!("stream {} failed: {}", id, err);
                        return Err(err);
                    }
                }
            }
        }
        Ok(out)
    }
}
