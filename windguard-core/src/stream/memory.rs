//! In-memory sample streams for tests and replay of recordings

use crate::sample::Sample;

use super::{Stream, StreamError};

/// Replays a slice of samples in order
///
/// ```rust
/// use windguard_core::stream::{MemoryStream, Stream};
/// use windguard_core::Sample;
///
/// let samples = vec![
///     Sample::builder("wt01", "imu0", 0).unwrap().voltage(24.1).build(),
///     Sample::builder("wt01", "imu0", 100).unwrap().voltage(24.0).build(),
/// ];
///
/// let mut stream = MemoryStream::new(&samples);
/// while let Ok(sample) = stream.poll_next() {
///     assert!(sample.voltage > 24.0 - 1e-9);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStream<'a> {
    samples: &'a [Sample],
    position: usize,
}

impl<'a> MemoryStream<'a> {
    /// Stream over `samples`
    pub fn new(samples: &'a [Sample]) -> Self {
        Self { samples, position: 0 }
    }

    /// Rewind to the first sample
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Samples already handed out
    pub fn position(&self) -> usize {
        self.position
    }

    /// True once every sample has been handed out
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl Stream for MemoryStream<'_> {
    type Item = Sample;
    type Error = StreamError<()>;

    fn poll_next(&mut self) -> nb::Result<Sample, Self::Error> {
        let sample = self
            .samples
            .get(self.position)
            .copied()
            .ok_or(nb::Error::Other(StreamError::EndOfStream))?;
        self.position += 1;
        Ok(sample)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> [Sample; 2] {
        [
            Sample::builder("wt01", "imu0", 1000).unwrap().voltage(24.0).build(),
            Sample::builder("wt01", "imu0", 2000).unwrap().voltage(23.5).build(),
        ]
    }

    #[test]
    fn replays_in_order_then_ends() {
        let data = samples();
        let mut stream = MemoryStream::new(&data);
        assert_eq!(stream.size_hint(), (2, Some(2)));

        assert_eq!(stream.poll_next().unwrap().timestamp, 1000);
        assert_eq!(stream.size_hint(), (1, Some(1)));
        assert_eq!(stream.poll_next().unwrap().voltage, 23.5);

        assert!(stream.is_exhausted());
        assert_eq!(stream.poll_next(), Err(nb::Error::Other(StreamError::EndOfStream)));
    }

    #[test]
    fn reset_rewinds() {
        let data = samples();
        let mut stream = MemoryStream::new(&data);
        stream.poll_next().unwrap();
        stream.poll_next().unwrap();
        stream.reset();
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.poll_next().unwrap().timestamp, 1000);
    }
}
