//! Stream Traits
//!
//! Edge devices pull readings instead of being pushed into: the consumer
//! decides when to poll, and a source with nothing ready answers
//! `nb::Error::WouldBlock` rather than blocking. No async runtime is needed.
//!
//! ```rust
//! use windguard_core::traits::Stream;
//!
//! fn drain<S: Stream>(stream: &mut S) -> Result<usize, S::Error> {
//!     let mut count = 0;
//!     loop {
//!         match stream.poll_next() {
//!             Ok(_) => count += 1,
//!             Err(nb::Error::WouldBlock) => return Ok(count),
//!             Err(nb::Error::Other(e)) => return Err(e),
//!         }
//!     }
//! }
//! ```

/// Pull-based source of items
///
/// Two-level errors:
/// - `nb::Error::WouldBlock`: nothing ready yet, poll again later
/// - `nb::Error::Other(E)`: the stream failed or ended
pub trait Stream {
    /// Items produced
    type Item;

    /// Failure type
    type Error;

    /// Try to pull the next item without blocking.
    fn poll_next(&mut self) -> nb::Result<Self::Item, Self::Error>;

    /// Bounds on remaining items, as for `Iterator::size_hint`
    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, None)
    }
}
