//! Sliding-Window Tensor Encoding
//!
//! ## Shape
//!
//! Every full window of L samples becomes one tensor of shape
//! `(channels, R, C)` with `R * C = L`. Axis 0 follows the configured channel
//! order. Within a channel block the L-step history is folded row-major,
//! oldest sample first:
//!
//! ```text
//! window steps t = 0 (oldest) .. L-1 (newest), R = 3, C = 4
//!
//!   [0][0]=t0   [0][1]=t1   [0][2]=t2   [0][3]=t3
//!   [1][0]=t4   [1][1]=t5   [1][2]=t6   [1][3]=t7
//!   [2][0]=t8   [2][1]=t9   [2][2]=t10  [2][3]=t11
//! ```
//!
//! The flat buffer returned by [`Tensor::as_slice`] is `[c][r][col]`
//! row-major, the layout the model collaborator reads directly.
//!
//! ## Count
//!
//! Over N samples with stride S, `floor((N − L) / S) + 1` tensors are
//! produced when `N >= L`, none otherwise. Too few samples is not an error.
//!
//! ## Two Encoders
//!
//! [`Windows`] walks a finished [`ChannelMatrix`] lazily. [`WindowEncoder`]
//! is fed one frame at a time and keeps the history in a [`FrameRing`].
//! Given the same frames both produce identical tensors.

use alloc::vec;
use alloc::vec::Vec;

use crate::buffer::FrameRing;
use crate::channels::{Channel, ChannelMatrix};
use crate::config::WindowConfig;
use crate::errors::PipelineResult;
use crate::time::Timestamp;

/// One encoded window, shape `(channels, rows, cols)`
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    channels: usize,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    timestamp: Timestamp,
}

impl Tensor {
    fn zeroed(channels: usize, window: &WindowConfig, timestamp: Timestamp) -> Self {
        Self {
            channels,
            rows: window.rows,
            cols: window.cols,
            data: vec![0.0; channels * window.len],
            timestamp,
        }
    }

    /// `(channels, rows, cols)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.channels, self.rows, self.cols)
    }

    /// Value at channel `c`, row `r`, column `col`
    pub fn get(&self, c: usize, r: usize, col: usize) -> Option<f64> {
        if c >= self.channels || r >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[(c * self.rows + r) * self.cols + col])
    }

    /// One channel's `rows * cols` block, oldest step first
    pub fn channel(&self, c: usize) -> Option<&[f64]> {
        let block = self.rows * self.cols;
        self.data.get(c * block..(c + 1) * block)
    }

    /// Flat row-major buffer
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume into the flat buffer
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Timestamp of the newest sample in the window
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

/// Lazy iterator over every full window of a matrix
#[derive(Debug, Clone)]
pub struct Windows<'a> {
    matrix: &'a ChannelMatrix,
    window: WindowConfig,
    next: usize,
    remaining: usize,
}

impl<'a> Windows<'a> {
    /// Windows over `matrix`; the geometry is assumed validated.
    pub fn new(matrix: &'a ChannelMatrix, window: WindowConfig) -> Self {
        Self {
            matrix,
            window,
            next: 0,
            remaining: window.expected_count(matrix.len()),
        }
    }

    /// Channels on axis 0
    pub fn channels(&self) -> &'a [Channel] {
        self.matrix.channels()
    }
}

impl Iterator for Windows<'_> {
    type Item = Tensor;

    fn next(&mut self) -> Option<Tensor> {
        if self.remaining == 0 {
            return None;
        }
        let start = self.next;
        let end = start + self.window.len;
        let mut tensor = Tensor::zeroed(self.matrix.num_channels(), &self.window, self.matrix.timestamps()[end - 1]);
        for (c, column) in self.matrix.columns().iter().enumerate() {
            let block = c * self.window.len;
            tensor.data[block..block + self.window.len].copy_from_slice(&column[start..end]);
        }

        self.next += self.window.stride;
        self.remaining -= 1;
        Some(tensor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

/// Frame-at-a-time window encoder
#[derive(Debug, Clone)]
pub struct WindowEncoder {
    window: WindowConfig,
    ring: FrameRing,
    seen: usize,
}

impl WindowEncoder {
    /// Encoder for frames of `channels` values.
    pub fn new(window: WindowConfig, channels: usize) -> PipelineResult<Self> {
        window.validate()?;
        Ok(Self {
            window,
            ring: FrameRing::new(window.len, channels),
            seen: 0,
        })
    }

    /// Push one normalized frame; returns a tensor when a window completes
    /// on a stride boundary.
    pub fn push(&mut self, frame: &[f64], timestamp: Timestamp) -> Option<Tensor> {
        self.ring.push(frame, timestamp);
        self.seen += 1;

        if self.seen < self.window.len || (self.seen - self.window.len) % self.window.stride != 0 {
            return None;
        }

        let mut tensor = Tensor::zeroed(self.ring.width(), &self.window, timestamp);
        for (t, frame) in self.ring.iter().enumerate() {
            for (c, value) in frame.iter().enumerate() {
                tensor.data[c * self.window.len + t] = *value;
            }
        }
        Some(tensor)
    }

    /// Tensors the next `frames` pushes will complete
    pub fn completions(&self, frames: usize) -> usize {
        let (len, stride) = (self.window.len, self.window.stride);
        let first = core::cmp::max(self.seen + 1, len);
        let last = self.seen + frames;
        if last < first {
            return 0;
        }
        (last - len) / stride + 1 - (first - len).div_ceil(stride)
    }

    /// Frames pushed since creation or the last reset
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Forget all history
    pub fn reset(&mut self) {
        self.ring.clear();
        self.seen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PipelineError;
    use proptest::prelude::*;

    fn ramp(channels: usize, n: usize) -> ChannelMatrix {
        let columns = (0..channels)
            .map(|c| (0..n).map(|i| (c * 1000 + i) as f64).collect())
            .collect();
        ChannelMatrix::from_columns(Channel::ALL[..channels].to_vec(), columns, (0..n as u64).collect()).unwrap()
    }

    #[test]
    fn default_geometry_counts() {
        let window = WindowConfig::default();
        let tensors: Vec<Tensor> = Windows::new(&ramp(6, 150), window).collect();
        assert_eq!(tensors.len(), 51);
        assert!(tensors.iter().all(|t| t.shape() == (6, 10, 10)));
        assert_eq!(Windows::new(&ramp(6, 50), window).count(), 0);
    }

    #[test]
    fn layout_is_row_major_oldest_first() {
        let window = WindowConfig::new(3, 4, 2);
        let matrix = ramp(2, 20);
        let second = Windows::new(&matrix, window).nth(1).unwrap();
        // second window starts at sample 2
        assert_eq!(second.get(0, 0, 0), Some(2.0));
        assert_eq!(second.get(0, 1, 2), Some(2.0 + 6.0));
        assert_eq!(second.get(1, 2, 3), Some(1000.0 + 2.0 + 11.0));
        assert_eq!(second.get(2, 0, 0), None);
        assert_eq!(second.timestamp(), 13);
    }

    #[test]
    fn encoder_matches_batch_windows() {
        let window = WindowConfig::new(2, 3, 2);
        let matrix = ramp(3, 17);
        let batch: Vec<Tensor> = Windows::new(&matrix, window).collect();

        let mut encoder = WindowEncoder::new(window, 3).unwrap();
        assert_eq!(encoder.completions(matrix.len()), batch.len());
        let mut frame = [0.0; 3];
        let mut streamed = Vec::new();
        for i in 0..matrix.len() {
            matrix.frame(i, &mut frame);
            streamed.extend(encoder.push(&frame, matrix.timestamps()[i]));
        }
        assert_eq!(streamed, batch);
    }

    #[test]
    fn encoder_rejects_invalid_geometry() {
        assert!(matches!(
            WindowEncoder::new(WindowConfig { len: 6, rows: 2, cols: 3, stride: 0 }, 3),
            Err(PipelineError::InvalidConfig { .. })
        ));
        assert!(matches!(
            WindowEncoder::new(WindowConfig { len: 7, rows: 2, cols: 3, stride: 1 }, 3),
            Err(PipelineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn completions_count_upcoming_tensors() {
        let window = WindowConfig::new(2, 3, 4);
        let mut encoder = WindowEncoder::new(window, 1).unwrap();
        assert_eq!(encoder.completions(5), 0);
        assert_eq!(encoder.completions(6), 1);
        assert_eq!(encoder.completions(19), 4);

        let mut produced = 0;
        for i in 0..11u64 {
            produced += usize::from(encoder.push(&[i as f64], i).is_some());
        }
        assert_eq!(produced, 2);
        assert_eq!(encoder.completions(0), 0);
        assert_eq!(encoder.completions(3), 1);
        assert_eq!(encoder.completions(4), 1);
        assert_eq!(encoder.completions(8), 2);
    }

    proptest! {
        #[test]
        fn window_count_formula(n in 0usize..400, rows in 1usize..12, cols in 1usize..12, stride in 1usize..20) {
            let window = WindowConfig::new(rows, cols, stride);
            let expected = if n >= window.len { (n - window.len) / stride + 1 } else { 0 };
            let data = ramp(2, n);
            let windows = Windows::new(&data, window);
            prop_assert_eq!(windows.len(), expected);
            prop_assert_eq!(windows.count(), expected);
        }
    }
}
