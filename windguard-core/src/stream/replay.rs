//! Sample-at-a-time Replay of the Batch Pipeline
//!
//! ## Block Buffering
//!
//! Wavelet shrinkage needs a whole sequence, so a device cannot denoise one
//! sample on arrival. [`EdgeReplay`] collects `block_len` extracted frames,
//! denoises that block exactly as the batch pipeline denoises the matching
//! block of a recording, then normalizes the frames with the frozen baseline
//! and feeds them to a [`WindowEncoder`]:
//!
//! ```text
//! sample ─► extract ─► block buffer ──(full)──► denoise block
//!                                                   │
//!            pending ◄── WindowEncoder ◄── normalize ┘
//! ```
//!
//! Because block boundaries, noise scales and arithmetic are the same, the
//! tensors match a batch run configured with the same
//! `DenoiseMode::Blocked { block_len }` bit for bit. Call
//! [`EdgeReplay::flush`] at the end of a recording to process the trailing
//! partial block.
//!
//! ## Pending Tensors
//!
//! A finished block is not encoded all at once. Its normalized frames are
//! kept and fed to the encoder from [`EdgeReplay::pop`], one tensor per
//! call, so a consumer that drains after every push never loses a tensor
//! however long the block is. Frames still unread when the next block
//! completes are encoded into a fixed-capacity `heapless::Deque`; when that
//! overflows the oldest tensor is dropped and counted.
//!
//! A block whose denoising or normalization fails is discarded whole and
//! the window history restarts with the next block.

use alloc::vec::Vec;

use heapless::Deque;

use crate::channels::{extract_frame, Channel};
use crate::config::PipelineConfig;
use crate::constants::window::REPLAY_QUEUE_CAPACITY;
use crate::denoise::{DenoiseMode, Denoiser, NoiseScale};
use crate::errors::{PipelineError, PipelineResult, Stage};
use crate::sample::{Sample, StreamId};
use crate::stats::{normalize_frame, Baseline, ChannelStats};
use crate::time::Timestamp;
use crate::window::{Tensor, WindowEncoder};

use super::{Stream, StreamError};

/// Edge-side replay of one device stream
#[derive(Debug)]
pub struct EdgeReplay {
    channels: Vec<Channel>,
    stats: Vec<ChannelStats>,
    denoiser: Denoiser,
    noise_scale: NoiseScale,
    block_len: usize,
    /// Raw extracted values of the current block, one column per channel
    block: Vec<Vec<f64>>,
    block_timestamps: Vec<Timestamp>,
    /// Normalized frames of the last finished block, row per frame
    ready: Vec<f64>,
    ready_timestamps: Vec<Timestamp>,
    ready_next: usize,
    encoder: WindowEncoder,
    pending: Deque<Tensor, REPLAY_QUEUE_CAPACITY>,
    stream: Option<StreamId>,
    last_timestamp: Option<Timestamp>,
    accepted: usize,
    dropped: usize,
}

impl EdgeReplay {
    /// Prepare a replay for `config` using a frozen baseline.
    ///
    /// The configuration must use blocked denoising and match the
    /// baseline's fingerprint.
    pub fn new(config: &PipelineConfig, baseline: &Baseline) -> PipelineResult<Self> {
        config.validate()?;
        let block_len = match config.denoise_mode {
            DenoiseMode::Blocked { block_len } => block_len,
            DenoiseMode::WholeSequence => {
                return Err(PipelineError::InvalidConfig { reason: "edge replay requires blocked denoising" })
            }
        };
        baseline.check(config)?;
        let stats = baseline.select(&config.channels)?;

        Ok(Self {
            channels: config.channels.clone(),
            stats,
            denoiser: Denoiser::new(config.wavelet, config.levels),
            noise_scale: config.noise_scale,
            block_len,
            block: config.channels.iter().map(|_| Vec::with_capacity(block_len)).collect(),
            block_timestamps: Vec::with_capacity(block_len),
            ready: Vec::new(),
            ready_timestamps: Vec::with_capacity(block_len),
            ready_next: 0,
            encoder: WindowEncoder::new(config.window, config.channels.len())?,
            pending: Deque::new(),
            stream: None,
            last_timestamp: None,
            accepted: 0,
            dropped: 0,
        })
    }

    /// Accept the next sample of the stream.
    ///
    /// The first sample fixes the stream; later samples must come from the
    /// same device in non-decreasing timestamp order. A sample rejected for
    /// its stream, order or content leaves the replay state unchanged.
    ///
    /// A sample that completes a block is always consumed. If that block
    /// fails to denoise or normalize, the error is returned, the block is
    /// discarded and later samples start a fresh block.
    pub fn push(&mut self, sample: &Sample) -> PipelineResult<()> {
        let id = sample.stream_id();
        match self.stream {
            Some(stream) if stream != id => {
                return Err(PipelineError::InvalidInput { field: "device_id", reason: "sample from another stream" });
            }
            _ => {}
        }
        if let Some(previous) = self.last_timestamp {
            if sample.timestamp < previous {
                return Err(PipelineError::OutOfOrder { previous, current: sample.timestamp });
            }
        }

        let mut frame = alloc::vec![0.0; self.channels.len()];
        extract_frame(sample, &self.channels, &mut frame)?;
        if let Some(c) = frame.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::Numeric { stage: Stage::Extract, channel: self.channels[c], index: self.accepted });
        }

        self.stream = Some(id);
        self.last_timestamp = Some(sample.timestamp);
        self.accepted += 1;
        for (column, value) in self.block.iter_mut().zip(&frame) {
            column.push(*value);
        }
        self.block_timestamps.push(sample.timestamp);

        if self.block_timestamps.len() >= self.block_len {
            self.process_block()?;
        }
        Ok(())
    }

    /// Process a trailing partial block, if any.
    pub fn flush(&mut self) -> PipelineResult<()> {
        if self.block_timestamps.is_empty() {
            return Ok(());
        }
        self.process_block()
    }

    /// Take the oldest completed tensor
    pub fn pop(&mut self) -> Option<Tensor> {
        if let Some(tensor) = self.pending.pop_front() {
            return Some(tensor);
        }
        self.encode_next()
    }

    /// Tensors `pop` can return before the next block completes
    pub fn pending(&self) -> usize {
        let unread = self.ready_timestamps.len() - self.ready_next;
        self.pending.len() + self.encoder.completions(unread)
    }

    /// Tensors discarded because the queue was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Samples accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    /// Feed unread frames to the encoder until one completes a tensor.
    fn encode_next(&mut self) -> Option<Tensor> {
        let width = self.channels.len();
        while self.ready_next < self.ready_timestamps.len() {
            let i = self.ready_next;
            self.ready_next += 1;
            let frame = &self.ready[i * width..(i + 1) * width];
            if let Some(tensor) = self.encoder.push(frame, self.ready_timestamps[i]) {
                return Some(tensor);
            }
        }
        None
    }

    /// Encode every unread frame into the bounded queue.
    fn spill_ready(&mut self) {
        while let Some(tensor) = self.encode_next() {
            if let Err(tensor) = self.pending.push_back(tensor) {
                self.pending.pop_front();
                self.dropped += 1;
                log_warn!("replay queue full, dropped tensor ({} total)", self.dropped);
                let _ = self.pending.push_back(tensor);
            }
        }
    }

    fn process_block(&mut self) -> PipelineResult<()> {
        let result = self.normalize_block();

        self.spill_ready();
        for column in self.block.iter_mut() {
            column.clear();
        }

        match result {
            Ok(frames) => {
                self.ready = frames;
                self.ready_timestamps.clear();
                core::mem::swap(&mut self.ready_timestamps, &mut self.block_timestamps);
                self.ready_next = 0;
                Ok(())
            }
            Err(e) => {
                log_warn!("discarded block of {} samples: {}", self.block_timestamps.len(), e);
                self.block_timestamps.clear();
                self.encoder.reset();
                Err(e)
            }
        }
    }

    /// Denoised and normalized frames of the current block, row per frame
    fn normalize_block(&self) -> PipelineResult<Vec<f64>> {
        let len = self.block_timestamps.len();
        let block_start = self.accepted - len;
        let mode = DenoiseMode::Blocked { block_len: self.block_len };

        let mut denoised = Vec::with_capacity(self.channels.len());
        for (channel, column) in self.channels.iter().zip(&self.block) {
            denoised.push(self.denoiser.denoise_blocks(column, mode, self.noise_scale, *channel)?);
        }

        let width = self.channels.len();
        let mut frames = alloc::vec![0.0; len * width];
        for (i, frame) in frames.chunks_exact_mut(width).enumerate() {
            for (slot, column) in frame.iter_mut().zip(&denoised) {
                *slot = column[i];
            }
            normalize_frame(&self.stats, frame, block_start + i)?;
        }
        Ok(frames)
    }
}

/// Adapts a sample stream into a tensor stream
///
/// Each poll pulls at most one sample from the source and answers
/// `WouldBlock` while no window has completed. At the end of the source the
/// trailing block is flushed before `EndOfStream` is reported.
#[derive(Debug)]
pub struct TensorStream<S> {
    source: S,
    replay: EdgeReplay,
    flushed: bool,
}

impl<S> TensorStream<S> {
    /// Wrap `source`
    pub fn new(source: S, replay: EdgeReplay) -> Self {
        Self { source, replay, flushed: false }
    }

    /// The replay state
    pub fn replay(&self) -> &EdgeReplay {
        &self.replay
    }

    /// Give back the source and replay state
    pub fn into_parts(self) -> (S, EdgeReplay) {
        (self.source, self.replay)
    }
}

impl<S, E> Stream for TensorStream<S>
where
    S: Stream<Item = Sample, Error = StreamError<E>>,
{
    type Item = Tensor;
    type Error = StreamError<E>;

    fn poll_next(&mut self) -> nb::Result<Tensor, Self::Error> {
        if let Some(tensor) = self.replay.pop() {
            return Ok(tensor);
        }
        if self.flushed {
            return Err(nb::Error::Other(StreamError::EndOfStream));
        }

        match self.source.poll_next() {
            Ok(sample) => {
                self.replay.push(&sample).map_err(|e| nb::Error::Other(StreamError::from(e)))?;
            }
            Err(nb::Error::Other(StreamError::EndOfStream)) => {
                self.flushed = true;
                self.replay.flush().map_err(|e| nb::Error::Other(StreamError::from(e)))?;
            }
            Err(other) => return Err(other),
        }

        match self.replay.pop() {
            Some(tensor) => Ok(tensor),
            None if self.flushed => Err(nb::Error::Other(StreamError::EndOfStream)),
            None => Err(nb::Error::WouldBlock),
        }
    }
}
