//! Quaternion to Euler Angle Conversion
//!
//! Turbine IMUs report attitude as a quaternion `(qx, qy, qz, qw)`. The
//! model works on roll, pitch and yaw instead, extracted with the aerospace
//! Z-Y-X (yaw-pitch-roll) convention:
//!
//! ```text
//! roll  = atan2(2(qw·qx + qy·qz), 1 − 2(qx² + qy²))
//! pitch = asin(clamp(2(qw·qy − qz·qx), −1, 1))
//! yaw   = atan2(2(qw·qz + qx·qy), 1 − 2(qy² + qz²))
//! ```
//!
//! The input is not renormalized. Near gimbal lock the arcsine argument of a
//! slightly non-unit quaternion can overshoot ±1, so it is clamped instead,
//! which keeps pitch inside [−π/2, π/2].
//!
//! All trigonometry goes through `libm` so that a fit on a workstation and
//! a replay on an edge device produce identical bits.

use crate::errors::{PipelineError, PipelineResult};
use crate::sample::Sample;

/// Attitude quaternion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quaternion {
    /// First vector component
    pub x: f64,
    /// Second vector component
    pub y: f64,
    /// Third vector component
    pub z: f64,
    /// Scalar component
    pub w: f64,
}

/// Euler angles in radians
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAngles {
    /// Rotation about x
    pub roll: f64,
    /// Rotation about y, always within [−π/2, π/2]
    pub pitch: f64,
    /// Rotation about z
    pub yaw: f64,
}

impl Quaternion {
    /// Create from components
    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// The identity rotation
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Collect the quaternion of a sample, rejecting missing components
    pub fn from_sample(sample: &Sample) -> PipelineResult<Self> {
        Ok(Self::new(
            component(sample.qx, "qx")?,
            component(sample.qy, "qy")?,
            component(sample.qz, "qz")?,
            component(sample.qw, "qw")?,
        ))
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        libm::sqrt(self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w)
    }

    /// Convert to Euler angles
    pub fn to_euler(&self) -> PipelineResult<EulerAngles> {
        quaternion_to_euler(self.x, self.y, self.z, self.w)
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::identity()
    }
}

impl EulerAngles {
    /// Build the quaternion for these angles (Z-Y-X order).
    pub fn to_quaternion(&self) -> Quaternion {
        let (sr, cr) = (libm::sin(self.roll * 0.5), libm::cos(self.roll * 0.5));
        let (sp, cp) = (libm::sin(self.pitch * 0.5), libm::cos(self.pitch * 0.5));
        let (sy, cy) = (libm::sin(self.yaw * 0.5), libm::cos(self.yaw * 0.5));

        Quaternion {
            x: sr * cp * cy - cr * sp * sy,
            y: cr * sp * cy + sr * cp * sy,
            z: cr * cp * sy - sr * sp * cy,
            w: cr * cp * cy + sr * sp * sy,
        }
    }
}

fn component(value: Option<f64>, field: &'static str) -> PipelineResult<f64> {
    match value {
        None => Err(PipelineError::InvalidInput { field, reason: "missing quaternion component" }),
        Some(v) if !v.is_finite() => {
            Err(PipelineError::InvalidInput { field, reason: "non-finite quaternion component" })
        }
        Some(v) => Ok(v),
    }
}

/// Convert a quaternion to roll, pitch and yaw.
///
/// Non-finite components fail with `InvalidInput`. An all-zero quaternion is
/// not a rotation and is rejected as well.
pub fn quaternion_to_euler(qx: f64, qy: f64, qz: f64, qw: f64) -> PipelineResult<EulerAngles> {
    for (value, field) in [(qx, "qx"), (qy, "qy"), (qz, "qz"), (qw, "qw")] {
        if !value.is_finite() {
            return Err(PipelineError::InvalidInput { field, reason: "non-finite quaternion component" });
        }
    }
    if qx == 0.0 && qy == 0.0 && qz == 0.0 && qw == 0.0 {
        return Err(PipelineError::InvalidInput { field: "qw", reason: "zero quaternion" });
    }

    let sinr_cosp = 2.0 * (qw * qx + qy * qz);
    let cosr_cosp = 1.0 - 2.0 * (qx * qx + qy * qy);
    let roll = libm::atan2(sinr_cosp, cosr_cosp);

    let sinp = (2.0 * (qw * qy - qz * qx)).clamp(-1.0, 1.0);
    let pitch = libm::asin(sinp);

    let siny_cosp = 2.0 * (qw * qz + qx * qy);
    let cosy_cosp = 1.0 - 2.0 * (qy * qy + qz * qz);
    let yaw = libm::atan2(siny_cosp, cosy_cosp);

    Ok(EulerAngles { roll, pitch, yaw })
}

/// Convert the quaternion of one sample.
pub fn sample_to_euler(sample: &Sample) -> PipelineResult<EulerAngles> {
    Quaternion::from_sample(sample)?.to_euler()
}
