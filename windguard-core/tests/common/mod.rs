//! Shared fixtures for integration tests
//!
//! - Deterministic turbine sample generator (tower sway, yaw tracking,
//!   sensor noise from a fixed-seed LCG)
//! - Float comparison helpers

#![allow(dead_code)]

use windguard_core::{EulerAngles, Sample, Tensor};

/// Synthetic turbine IMU and environment stream
///
/// Models:
/// - Tower fore-aft sway (pitch) and side-side sway (roll), ~0.3 Hz
/// - Slow nacelle yaw tracking the wind direction
/// - Gyro rates as the derivative of the attitude plus noise
/// - Supply voltage ripple and slowly drifting environment readings
pub struct TurbineGenerator {
    turbine: &'static str,
    device: &'static str,
    start: u64,
    interval_ms: u64,
    noise: f64,
    seed: u32,
}

impl TurbineGenerator {
    /// 10 Hz stream with moderate sensor noise
    pub fn new(turbine: &'static str, device: &'static str) -> Self {
        Self {
            turbine,
            device,
            start: 0,
            interval_ms: 100,
            noise: 0.01,
            seed: 42,
        }
    }

    /// First timestamp in ms
    pub fn starting_at(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Noise amplitude applied to every channel
    pub fn noise(mut self, amplitude: f64) -> Self {
        self.noise = amplitude;
        self
    }

    /// Generate `n` ordered samples
    pub fn generate(&mut self, n: usize) -> Vec<Sample> {
        (0..n).map(|i| self.sample(i)).collect()
    }

    fn sample(&mut self, i: usize) -> Sample {
        let t = (self.start + i as u64 * self.interval_ms) as f64 / 1000.0;
        let w = 2.0 * std::f64::consts::PI * 0.3;

        let angles = EulerAngles {
            roll: 0.02 * (w * t).sin() + self.random_noise(self.noise * 0.1),
            pitch: 0.05 * (w * t + 0.7).sin() + self.random_noise(self.noise * 0.1),
            yaw: 0.4 * (t / 120.0).sin() + self.random_noise(self.noise * 0.1),
        };
        let q = angles.to_quaternion();

        Sample::builder(self.turbine, self.device, self.start + i as u64 * self.interval_ms)
            .expect("fixture ids fit inline")
            .quaternion(q.x, q.y, q.z, q.w)
            .gyro(
                0.02 * w * (w * t).cos() + self.random_noise(self.noise),
                0.05 * w * (w * t + 0.7).cos() + self.random_noise(self.noise),
                0.4 / 120.0 * (t / 120.0).cos() + self.random_noise(self.noise),
            )
            .voltage(24.0 + 0.2 * (t * 5.0).sin() + self.random_noise(self.noise))
            .environment(
                12.0 + t / 600.0 + self.random_noise(self.noise),
                65.0 + 3.0 * (t / 300.0).sin() + self.random_noise(self.noise),
                1013.0 + (t / 900.0).cos() + self.random_noise(self.noise),
            )
            .build()
    }

    fn random_noise(&mut self, amplitude: f64) -> f64 {
        self.seed = self.seed.wrapping_mul(1664525).wrapping_add(1013904223);
        let uniform = self.seed as f64 / u32::MAX as f64;
        (uniform - 0.5) * 2.0 * amplitude
    }
}

/// Interleave several streams sample by sample, as a gateway would receive them
pub fn interleave(streams: &[Vec<Sample>]) -> Vec<Sample> {
    let longest = streams.iter().map(Vec::len).max().unwrap_or(0);
    let mut mixed = Vec::new();
    for i in 0..longest {
        for stream in streams {
            if let Some(sample) = stream.get(i) {
                mixed.push(*sample);
            }
        }
    }
    mixed
}

/// Assert two floats agree within `tolerance`
pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

/// True when two tensor sequences are identical bit for bit
pub fn bit_identical(a: &[Tensor], b: &[Tensor]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.shape() == y.shape()
                && x.timestamp() == y.timestamp()
                && x.as_slice().iter().zip(y.as_slice()).all(|(u, v)| u.to_bits() == v.to_bits())
        })
}
