//! Ring Buffer of Multi-Channel Frames
//!
//! ## Overview
//!
//! The streaming window encoder needs the last L frames, each holding one
//! value per configured channel. [`FrameRing`] keeps them in a single flat
//! allocation sized once at construction and overwrites the oldest frame
//! when full, so pushing a frame never allocates.
//!
//! ### Memory Layout
//!
//! Frames are stored back to back, `width` values each:
//!
//! ```text
//! FrameRing { capacity: 4, width: 3 } after 6 pushes (f0..f5):
//!
//! slot:     0          1          2          3
//!        ┌──────────┬──────────┬──────────┬──────────┐
//! data:  │ f4[0..3] │ f5[0..3] │ f2[0..3] │ f3[0..3] │
//!        └──────────┴──────────┴──────────┴──────────┘
//!                      write_pos = 2 ──┘
//!
//! logical view (oldest → newest): f2, f3, f4, f5
//! ```
//!
//! Logical index `i` maps to slot `(write_pos + i) % capacity` once full,
//! and to slot `i` before that.

use alloc::vec;
use alloc::vec::Vec;

use crate::time::Timestamp;

/// Fixed-capacity history of equally sized frames
#[derive(Debug, Clone)]
pub struct FrameRing {
    /// Frame values, `capacity * width` long
    data: Vec<f64>,
    /// Timestamp of the frame in each slot
    timestamps: Vec<Timestamp>,
    /// Values per frame
    width: usize,
    /// Frames retained
    capacity: usize,
    /// Slot of the next write
    write_pos: usize,
    /// Frames currently stored
    len: usize,
}

impl FrameRing {
    /// Allocate a ring for `capacity` frames of `width` values.
    pub fn new(capacity: usize, width: usize) -> Self {
        Self {
            data: vec![0.0; capacity * width],
            timestamps: vec![0; capacity],
            width,
            capacity,
            write_pos: 0,
            len: 0,
        }
    }

    /// Append a frame, overwriting the oldest when full.
    ///
    /// Only the first `width` values of `frame` are kept; a shorter frame
    /// leaves the remaining slots at their previous contents.
    pub fn push(&mut self, frame: &[f64], timestamp: Timestamp) {
        if self.capacity == 0 {
            return;
        }
        let start = self.write_pos * self.width;
        let take = frame.len().min(self.width);
        self.data[start..start + take].copy_from_slice(&frame[..take]);
        self.timestamps[self.write_pos] = timestamp;

        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.len < self.capacity {
            self.len += 1;
        }
    }

    /// Frames currently stored
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed since creation or `clear`
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True once `capacity` frames are stored
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Maximum frames retained
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Values per frame
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame by logical index (0 = oldest)
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        let slot = self.slot(index)?;
        Some(&self.data[slot * self.width..(slot + 1) * self.width])
    }

    /// Timestamp of the newest frame
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        let slot = self.slot(self.len.checked_sub(1)?)?;
        Some(self.timestamps[slot])
    }

    /// Iterate frames from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }

    /// Drop every stored frame
    pub fn clear(&mut self) {
        self.write_pos = 0;
        self.len = 0;
    }

    fn slot(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }
        Some(if self.len < self.capacity {
            index
        } else {
            (self.write_pos + index) % self.capacity
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring() {
        let ring = FrameRing::new(4, 2);
        assert!(ring.is_empty());
        assert!(ring.get(0).is_none());
        assert!(ring.last_timestamp().is_none());
    }

    #[test]
    fn overwrite_keeps_newest_frames_in_order() {
        let mut ring = FrameRing::new(3, 2);
        for i in 0..5u64 {
            ring.push(&[i as f64, -(i as f64)], i * 10);
        }
        assert!(ring.is_full());
        let firsts: Vec<f64> = ring.iter().map(|f| f[0]).collect();
        assert_eq!(firsts, vec![2.0, 3.0, 4.0]);
        assert_eq!(ring.get(2), Some(&[4.0, -4.0][..]));
        assert_eq!(ring.last_timestamp(), Some(40));
    }

    #[test]
    fn clear_resets_length() {
        let mut ring = FrameRing::new(2, 1);
        ring.push(&[1.0], 0);
        ring.push(&[2.0], 1);
        ring.clear();
        assert!(ring.is_empty());
        ring.push(&[3.0], 2);
        assert_eq!(ring.get(0), Some(&[3.0][..]));
    }
}
