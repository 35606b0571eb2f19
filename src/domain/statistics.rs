//! Shared Reception Statistics
//!
//! The poll loop writes and the display reads the same [`Statistics`] value.
//! Every access goes through a short-lived lock guard so a reader always sees
//! an `(rssi, packet_count)` pair taken from a single sample.

use crate::domain::models::{RadioSample, Statistics};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Default)]
pub struct SharedStatistics {
    inner: Arc<Mutex<Statistics>>,
}

impl SharedStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new sample and return the committed statistics.
    ///
    /// The guard is dropped before returning.
    pub fn record(&self, sample: RadioSample) -> Statistics {
        let mut stats = self.lock();
        stats.rssi = sample.rssi;
        stats.packet_count = sample.packet_count;
        stats.samples = stats.samples.wrapping_add(1);
        *stats
    }

    pub fn snapshot(&self) -> Statistics {
        *self.lock()
    }

    // Statistics is plain data, a panicked writer cannot leave it half-updated
    // since the pair is assigned inside one guard.
    fn lock(&self) -> MutexGuard<'_, Statistics> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    fn rssi_for(count: u16) -> i8 {
        -((count % 100) as i8)
    }

    #[test]
    fn test_record_updates_pair_and_counts_samples() {
        let shared = SharedStatistics::new();
        shared.record(RadioSample::new(-40, 1));
        let committed = shared.record(RadioSample::new(-42, 5));

        assert_eq!(committed.rssi, -42);
        assert_eq!(committed.packet_count, 5);
        assert_eq!(committed.samples, 2);
        assert_eq!(shared.snapshot(), committed);
    }

    #[test]
    fn test_clones_share_the_same_value() {
        let writer = SharedStatistics::new();
        let reader = writer.clone();
        writer.record(RadioSample::new(-71, 9));
        assert_eq!(reader.snapshot().packet_count, 9);
    }

    #[test]
    fn test_reader_never_sees_torn_pair() {
        let shared = SharedStatistics::new();
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let shared = shared.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut reads = 0u64;
                loop {
                    let stats = shared.snapshot();
                    assert_eq!(stats.rssi, rssi_for(stats.packet_count));
                    reads += 1;
                    if done.load(Ordering::Acquire) {
                        return reads;
                    }
                }
            })
        };

        for count in 0..20_000u16 {
            shared.record(RadioSample::new(rssi_for(count), count));
        }
        done.store(true, Ordering::Release);

        let reads = reader.join().expect("reader thread panicked");
        assert!(reads > 0);
        assert_eq!(shared.snapshot().packet_count, 19_999);
    }
}
