//! Turbine Sensor Samples
//!
//! ## Overview
//!
//! A [`Sample`] is one timestamped reading from a turbine-mounted edge
//! device: the attitude quaternion reported by the IMU, the three angular
//! rates, the supply voltage and the nacelle environment readings.
//!
//! ## Memory Model
//!
//! Samples are `Copy` and fixed-size so that edge devices can keep them in
//! stack buffers. Identifiers use [`InlineId`], a short inline string, so a
//! sample never owns heap memory:
//!
//! ```text
//! Sample size breakdown:
//! ├── turbine_id, device_id: 2 × 17 bytes (inline ids)
//! ├── timestamp: 8 bytes
//! ├── quaternion: 4 × 16 bytes (Option<f64>)
//! └── gyro, voltage, environment: 7 × 8 bytes
//! ```
//!
//! ## Ordering
//!
//! Within one (turbine, device) stream, timestamps must be non-decreasing.
//! Denoising and windowing are order-sensitive, so [`check_order`] runs
//! before any transform and a regression fails with `OutOfOrder` instead of
//! being silently re-sorted.
//!
//! ## Missing Quaternion Components
//!
//! Ingestion may leave quaternion components empty (a dropped CSV cell,
//! a partial IMU frame). They are kept as `None` so that the quaternion
//! converter can reject them; no default is ever substituted.

use core::fmt;

use crate::errors::{PipelineError, PipelineResult};
use crate::time::{first_regression, Timestamp};

/// Maximum length for inline turbine/device ids
pub const MAX_INLINE_ID: usize = 16;

/// Inline string for turbine and device ids
///
/// Avoids heap allocation; ordered like the string it holds so it can key
/// a `BTreeMap`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InlineId {
    len: u8,
    data: [u8; MAX_INLINE_ID],
}

impl InlineId {
    /// Create from string slice
    pub fn new(s: &str) -> PipelineResult<Self> {
        let bytes = s.as_bytes();
        if bytes.is_empty() {
            return Err(PipelineError::InvalidInput { field: "id", reason: "empty identifier" });
        }
        if bytes.len() > MAX_INLINE_ID {
            return Err(PipelineError::InvalidInput { field: "id", reason: "identifier too long" });
        }

        let mut data = [0u8; MAX_INLINE_ID];
        data[..bytes.len()].copy_from_slice(bytes);

        Ok(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// Get as string slice
    pub fn as_str(&self) -> &str {
        // Only valid UTF-8 is ever stored by new()
        core::str::from_utf8(&self.data[..self.len as usize]).unwrap_or("")
    }
}

impl Ord for InlineId {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for InlineId {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for InlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Display for InlineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of one independent sample stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId {
    /// Turbine the device is mounted on
    pub turbine: InlineId,
    /// Edge device on that turbine
    pub device: InlineId,
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.turbine, self.device)
    }
}

/// One timestamped reading from a turbine edge device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Turbine identifier
    pub turbine_id: InlineId,
    /// Device identifier
    pub device_id: InlineId,
    /// Device-local timestamp in milliseconds
    pub timestamp: Timestamp,
    /// Attitude quaternion, x component
    pub qx: Option<f64>,
    /// Attitude quaternion, y component
    pub qy: Option<f64>,
    /// Attitude quaternion, z component
    pub qz: Option<f64>,
    /// Attitude quaternion, scalar component
    pub qw: Option<f64>,
    /// Angular rate about x (rad/s)
    pub gyro_x: f64,
    /// Angular rate about y (rad/s)
    pub gyro_y: f64,
    /// Angular rate about z (rad/s)
    pub gyro_z: f64,
    /// Device supply voltage (V)
    pub voltage: f64,
    /// Nacelle temperature (°C)
    pub temperature: f64,
    /// Nacelle relative humidity (%)
    pub humidity: f64,
    /// Nacelle air pressure (hPa)
    pub pressure: f64,
}

impl Sample {
    /// Start building a sample for the given stream and timestamp
    pub fn builder(turbine: &str, device: &str, timestamp: Timestamp) -> PipelineResult<SampleBuilder> {
        Ok(SampleBuilder {
            sample: Sample {
                turbine_id: InlineId::new(turbine)?,
                device_id: InlineId::new(device)?,
                timestamp,
                qx: None,
                qy: None,
                qz: None,
                qw: None,
                gyro_x: 0.0,
                gyro_y: 0.0,
                gyro_z: 0.0,
                voltage: 0.0,
                temperature: 0.0,
                humidity: 0.0,
                pressure: 0.0,
            },
        })
    }

    /// Stream this sample belongs to
    pub fn stream_id(&self) -> StreamId {
        StreamId {
            turbine: self.turbine_id,
            device: self.device_id,
        }
    }
}

/// Builder for [`Sample`]
///
/// Fields not set stay at zero; quaternion components stay missing.
#[derive(Debug, Clone, Copy)]
pub struct SampleBuilder {
    sample: Sample,
}

impl SampleBuilder {
    /// Set all four quaternion components
    pub fn quaternion(mut self, qx: f64, qy: f64, qz: f64, qw: f64) -> Self {
        self.sample.qx = Some(qx);
        self.sample.qy = Some(qy);
        self.sample.qz = Some(qz);
        self.sample.qw = Some(qw);
        self
    }

    /// Set the angular rates
    pub fn gyro(mut self, x: f64, y: f64, z: f64) -> Self {
        self.sample.gyro_x = x;
        self.sample.gyro_y = y;
        self.sample.gyro_z = z;
        self
    }

    /// Set the supply voltage
    pub fn voltage(mut self, volts: f64) -> Self {
        self.sample.voltage = volts;
        self
    }

    /// Set temperature, humidity and pressure
    pub fn environment(mut self, temperature: f64, humidity: f64, pressure: f64) -> Self {
        self.sample.temperature = temperature;
        self.sample.humidity = humidity;
        self.sample.pressure = pressure;
        self
    }

    /// Finish the sample
    pub fn build(self) -> Sample {
        self.sample
    }
}

/// Verify that a single stream is in non-decreasing timestamp order.
///
/// Every sample must also belong to the same stream as the first one;
/// mixed streams go through `Pipeline::transform_fleet` instead.
pub fn check_order(samples: &[Sample]) -> PipelineResult<()> {
    if let Some(first) = samples.first() {
        let stream = first.stream_id();
        if samples.iter().any(|s| s.stream_id() != stream) {
            return Err(PipelineError::InvalidInput {
                field: "device_id",
                reason: "samples from more than one stream",
            });
        }
    }

    let mut previous: Option<Timestamp> = None;
    for sample in samples {
        if let Some(prev) = previous {
            if sample.timestamp < prev {
                return Err(PipelineError::OutOfOrder { previous: prev, current: sample.timestamp });
            }
        }
        previous = Some(sample.timestamp);
    }
    Ok(())
}

/// Verify ordering of a bare timestamp column.
pub fn check_timestamps(timestamps: &[Timestamp]) -> PipelineResult<()> {
    match first_regression(timestamps) {
        Some((previous, current)) => Err(PipelineError::OutOfOrder { previous, current }),
        None => Ok(()),
    }
}

/// Split a mixed sample set into per-stream sequences.
///
/// Arrival order is kept within each stream; streams are ordered by id so
/// the result is deterministic regardless of how devices interleave.
#[cfg(feature = "std")]
pub fn partition_by_stream(samples: &[Sample]) -> std::collections::BTreeMap<StreamId, Vec<Sample>> {
    let mut streams: std::collections::BTreeMap<StreamId, Vec<Sample>> = std::collections::BTreeMap::new();
    for sample in samples {
        streams.entry(sample.stream_id()).or_default().push(*sample);
    }
    streams
}
