//! "Latest request wins" bookkeeping for fetches that may complete out of order.
//!
//! Every fetch-triggering action takes a fresh token before its first await. When the
//! response arrives the token is compared with the latest one issued; anything older
//! is dropped without touching state or surfacing an error.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    #[cfg(test)]
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn latest(&self) -> RequestToken {
        RequestToken(self.latest.load(Ordering::SeqCst))
    }

    #[cfg(test)]
    pub fn is_current(&self, token: RequestToken) -> bool {
        is_current(token, self.latest())
    }
}

pub fn is_current(token: RequestToken, latest: RequestToken) -> bool {
    token == latest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_increase_monotonically() {
        let sequencer = RequestSequencer::new();

        let first = sequencer.issue();
        let second = sequencer.issue();

        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
        assert!(second > first);
        assert_eq!(sequencer.latest(), second);
    }

    #[test]
    fn only_the_latest_token_is_current() {
        let sequencer = RequestSequencer::new();

        let first = sequencer.issue();
        assert!(sequencer.is_current(first));

        let second = sequencer.issue();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
    }

    #[test]
    fn comparison_is_a_plain_function() {
        assert!(is_current(RequestToken(3), RequestToken(3)));
        assert!(!is_current(RequestToken(2), RequestToken(3)));
    }
}
