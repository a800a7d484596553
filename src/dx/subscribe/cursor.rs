//! # Subscription cursor
//!
//! Position of a subscription in its event stream.

use std::fmt::Display;

/// Timestamp of the most recent event received by a subscription.
///
/// Sent with every poll as `last` so events at or before it aren't delivered
/// again. `0` reads from the beginning of the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionCursor {
    /// Event timestamp.
    pub timestamp: u64,
}

impl SubscriptionCursor {
    /// Move cursor to `timestamp` unless it's already past it.
    ///
    /// Returns `true` when the cursor moved.
    pub(crate) fn advance(&mut self, timestamp: Option<u64>) -> bool {
        match timestamp {
            Some(timestamp) if timestamp > self.timestamp => {
                self.timestamp = timestamp;
                true
            }
            _ => false,
        }
    }
}

impl From<u64> for SubscriptionCursor {
    fn from(timestamp: u64) -> Self {
        Self { timestamp }
    }
}

impl Display for SubscriptionCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.timestamp)
    }
}

#[cfg(test)]
mod should {
    use super::*;
    use test_case::test_case;

    #[test_case(10, Some(12) => (12, true); "newer timestamp")]
    #[test_case(10, Some(10) => (10, false); "same timestamp")]
    #[test_case(10, Some(3) => (10, false); "older timestamp")]
    #[test_case(10, None => (10, false); "empty batch")]
    fn advance_monotonically(current: u64, timestamp: Option<u64>) -> (u64, bool) {
        let mut cursor = SubscriptionCursor::from(current);
        let moved = cursor.advance(timestamp);

        (cursor.timestamp, moved)
    }
}
