//! Device-local time
//!
//! Turbine edge devices stamp readings with a millisecond counter that is
//! only guaranteed to be monotonic within one device stream. Nothing in the
//! pipeline compares timestamps across devices.

/// Timestamp in milliseconds (device-local)
pub type Timestamp = u64;

/// Find the first position where a timestamp sequence goes backwards.
///
/// Equal neighbours are allowed: several sensors on one board may be read
/// within the same millisecond tick.
pub fn first_regression(timestamps: &[Timestamp]) -> Option<(Timestamp, Timestamp)> {
    timestamps
        .windows(2)
        .find(|pair| pair[1] < pair[0])
        .map(|pair| (pair[0], pair[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_timestamps_are_ordered() {
        assert_eq!(first_regression(&[0, 10, 10, 20]), None);
        assert_eq!(first_regression(&[]), None);
    }

    #[test]
    fn regression_is_reported_with_both_stamps() {
        assert_eq!(first_regression(&[0, 10, 5, 2]), Some((10, 5)));
    }
}
