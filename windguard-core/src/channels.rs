//! Feature Channels and Channel Extraction
//!
//! ## Overview
//!
//! A [`Channel`] names one scalar time series the model can see. Raw
//! channels are read straight from [`Sample`] fields, while roll, pitch and
//! yaw are derived from the attitude quaternion.
//!
//! The configured channel list is ordered, and that order is the tensor's
//! axis 0. It is part of the configuration fingerprint, so a baseline fitted
//! with `[roll, pitch]` can never be applied to `[pitch, roll]`.
//!
//! ## Storage
//!
//! [`ChannelMatrix`] stores the extracted data column-major, one `Vec<f64>`
//! per channel, because every transform after extraction (denoising, fitting,
//! normalizing) walks a single channel at a time:
//!
//! ```text
//! columns[0] = roll:    [r0, r1, r2, ... rN-1]
//! columns[1] = pitch:   [p0, p1, p2, ... pN-1]
//! ...
//! timestamps:           [t0, t1, t2, ... tN-1]
//! ```

use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::errors::{ensure_finite, PipelineError, PipelineResult, Stage};
use crate::quaternion::{sample_to_euler, EulerAngles};
use crate::sample::{check_order, check_timestamps, Sample};
use crate::time::Timestamp;

/// Named scalar series available to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// Derived from the quaternion
    Roll,
    /// Derived from the quaternion
    Pitch,
    /// Derived from the quaternion
    Yaw,
    /// Angular rate about the x axis
    GyroX,
    /// Angular rate about the y axis
    GyroY,
    /// Angular rate about the z axis
    GyroZ,
    /// Supply voltage
    Voltage,
    /// Ambient temperature
    Temperature,
    /// Relative humidity
    Humidity,
    /// Barometric pressure
    Pressure,
}

impl Channel {
    /// Every channel, in declaration order
    pub const ALL: [Channel; 10] = [
        Channel::Roll,
        Channel::Pitch,
        Channel::Yaw,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
        Channel::Voltage,
        Channel::Temperature,
        Channel::Humidity,
        Channel::Pressure,
    ];

    /// Stable name used in persisted baselines and fingerprints
    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Roll => "roll",
            Channel::Pitch => "pitch",
            Channel::Yaw => "yaw",
            Channel::GyroX => "gyro_x",
            Channel::GyroY => "gyro_y",
            Channel::GyroZ => "gyro_z",
            Channel::Voltage => "voltage",
            Channel::Temperature => "temperature",
            Channel::Humidity => "humidity",
            Channel::Pressure => "pressure",
        }
    }

    /// Unit of measurement
    pub const fn unit(&self) -> &'static str {
        match self {
            Channel::Roll | Channel::Pitch | Channel::Yaw => "rad",
            Channel::GyroX | Channel::GyroY | Channel::GyroZ => "rad/s",
            Channel::Voltage => "V",
            Channel::Temperature => "°C",
            Channel::Humidity => "%",
            Channel::Pressure => "hPa",
        }
    }

    /// True for channels computed from the attitude quaternion
    pub const fn is_derived(&self) -> bool {
        matches!(self, Channel::Roll | Channel::Pitch | Channel::Yaw)
    }

    /// Read this channel from a sample whose angles are already known
    fn read(&self, sample: &Sample, angles: &EulerAngles) -> f64 {
        match self {
            Channel::Roll => angles.roll,
            Channel::Pitch => angles.pitch,
            Channel::Yaw => angles.yaw,
            Channel::GyroX => sample.gyro_x,
            Channel::GyroY => sample.gyro_y,
            Channel::GyroZ => sample.gyro_z,
            Channel::Voltage => sample.voltage,
            Channel::Temperature => sample.temperature,
            Channel::Humidity => sample.humidity,
            Channel::Pressure => sample.pressure,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Channel::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or(PipelineError::InvalidInput { field: "channel", reason: "unknown channel name" })
    }
}

/// Extract one sample's values for the given channels into `out`.
///
/// The quaternion is only converted when a derived channel is requested,
/// so streams without an IMU can still feed raw channels.
pub fn extract_frame(sample: &Sample, channels: &[Channel], out: &mut [f64]) -> PipelineResult<()> {
    let angles = if channels.iter().any(Channel::is_derived) {
        sample_to_euler(sample)?
    } else {
        EulerAngles::default()
    };
    for (slot, channel) in out.iter_mut().zip(channels) {
        *slot = channel.read(sample, &angles);
    }
    Ok(())
}

/// Ordered multi-channel sequence, stored one column per channel
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMatrix {
    channels: Vec<Channel>,
    columns: Vec<Vec<f64>>,
    timestamps: Vec<Timestamp>,
}

impl ChannelMatrix {
    /// Extract the configured channels from an ordered sample stream.
    ///
    /// Fails on out-of-order or mixed-stream input, on missing quaternion
    /// components when a derived channel is selected, and on non-finite raw
    /// readings.
    pub fn from_samples(samples: &[Sample], channels: &[Channel]) -> PipelineResult<Self> {
        check_order(samples)?;

        let mut columns: Vec<Vec<f64>> = channels.iter().map(|_| Vec::with_capacity(samples.len())).collect();
        let mut frame = alloc::vec![0.0; channels.len()];
        for sample in samples {
            extract_frame(sample, channels, &mut frame)?;
            for (column, value) in columns.iter_mut().zip(&frame) {
                column.push(*value);
            }
        }

        for (channel, column) in channels.iter().zip(&columns) {
            ensure_finite(column, Stage::Extract, *channel)?;
        }

        Ok(Self {
            channels: channels.to_vec(),
            columns,
            timestamps: samples.iter().map(|s| s.timestamp).collect(),
        })
    }

    /// Assemble from already extracted columns.
    pub fn from_columns(
        channels: Vec<Channel>,
        columns: Vec<Vec<f64>>,
        timestamps: Vec<Timestamp>,
    ) -> PipelineResult<Self> {
        if channels.len() != columns.len() {
            return Err(PipelineError::InvalidInput { field: "columns", reason: "one column per channel required" });
        }
        if columns.iter().any(|c| c.len() != timestamps.len()) {
            return Err(PipelineError::InvalidInput { field: "columns", reason: "columns differ in length" });
        }
        check_timestamps(&timestamps)?;
        Ok(Self { channels, columns, timestamps })
    }

    /// Channels in axis order
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True when no samples are stored
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// One channel's values by axis position
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// One channel's values by name
    pub fn column_for(&self, channel: Channel) -> Option<&[f64]> {
        self.channels
            .iter()
            .position(|c| *c == channel)
            .map(|i| self.columns[i].as_slice())
    }

    /// All columns in axis order
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Source timestamps
    pub fn timestamps(&self) -> &[Timestamp] {
        &self.timestamps
    }

    /// Copy one time step across all channels into `out`
    pub fn frame(&self, index: usize, out: &mut [f64]) {
        for (slot, column) in out.iter_mut().zip(&self.columns) {
            *slot = column[index];
        }
    }

    /// Apply a fallible per-channel transform, keeping channel order.
    pub fn map_columns<F>(&self, mut f: F) -> PipelineResult<Self>
    where
        F: FnMut(Channel, &[f64]) -> PipelineResult<Vec<f64>>,
    {
        let mut columns = Vec::with_capacity(self.columns.len());
        for (channel, column) in self.channels.iter().zip(&self.columns) {
            let mapped = f(*channel, column)?;
            if mapped.len() != column.len() {
                return Err(PipelineError::InvalidInput { field: "columns", reason: "transform changed length" });
            }
            columns.push(mapped);
        }
        Ok(Self {
            channels: self.channels.clone(),
            columns,
            timestamps: self.timestamps.clone(),
        })
    }
}
