//! Streaming Sources and Edge Replay
//!
//! ## Overview
//!
//! The batch [`Pipeline`](crate::Pipeline) sees a whole recording at once.
//! A turbine edge device only ever sees the next sample. This module runs
//! the same transform on that second shape of input:
//!
//! ```text
//! MemoryStream ─┐
//! sensor bus  ──┼─→ Stream<Item = Sample> ─→ TensorStream ─→ Tensor
//! file replay ──┘                              (EdgeReplay)
//! ```
//!
//! - `memory`: replay a recorded slice of samples
//! - `replay`: block-buffered denoising, frozen normalization and window
//!   encoding, one sample at a time

use core::fmt;

use crate::errors::PipelineError;

pub mod memory;
pub mod replay;

pub use memory::MemoryStream;
pub use replay::{EdgeReplay, TensorStream};

pub use crate::traits::Stream;

/// Errors surfaced by streams
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError<E> {
    /// Error from the underlying transport
    Transport(E),
    /// A sample was rejected by the pipeline
    Pipeline(PipelineError),
    /// Source is exhausted
    EndOfStream,
}

impl<E> From<PipelineError> for StreamError<E> {
    fn from(err: PipelineError) -> Self {
        Self::Pipeline(err)
    }
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            Self::EndOfStream => write!(f, "End of stream"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::Channel;

    #[test]
    fn stream_error_display() {
        let err: StreamError<&str> = StreamError::Transport("bus reset");
        assert_eq!(format!("{}", err), "Transport error: bus reset");

        let err: StreamError<&str> = PipelineError::MissingChannel { channel: Channel::Yaw }.into();
        assert_eq!(format!("{}", err), "Pipeline error: Baseline has no statistics for channel yaw");

        let err: StreamError<&str> = StreamError::EndOfStream;
        assert_eq!(format!("{}", err), "End of stream");
    }
}
