//! Simulated Radio
//!
//! Produces samples without any hardware. `random_walk` drifts the RSSI around
//! a base level while packets trickle in; `scripted` replays fixed samples.

use super::{RadioSession, MAX_CHANNEL};
use crate::domain::error::ScanError;
use crate::domain::models::RadioSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Maximum RSSI drift from the base level in dBm
const RSSI_SPREAD: i16 = 15;

/// Counts of driver calls, readable after the radio has been handed off.
#[derive(Debug, Default)]
pub struct RadioCalls {
    starts: AtomicU32,
    stops: AtomicU32,
    samples: AtomicU32,
}

#[cfg(test)]
impl RadioCalls {
    pub fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn samples(&self) -> u32 {
        self.samples.load(Ordering::SeqCst)
    }
}

enum Source {
    RandomWalk { rng: StdRng, base: i8, rssi: i8 },
    Scripted {
        queue: VecDeque<RadioSample>,
        last: Option<RadioSample>,
    },
}

pub struct SimulatedRadio {
    source: Source,
    receiving: bool,
    packets: u16,
    calls: Arc<RadioCalls>,
    fail_start: bool,
    fail_sample_at: Option<u32>,
}

impl SimulatedRadio {
    pub fn random_walk(seed: u64, base_rssi: i8) -> Self {
        Self::with_source(Source::RandomWalk {
            rng: StdRng::seed_from_u64(seed),
            base: base_rssi,
            rssi: base_rssi,
        })
    }

    /// Replay `samples` in order, repeating the last one once exhausted.
    pub fn scripted(samples: impl IntoIterator<Item = (i8, u16)>) -> Self {
        Self::with_source(Source::Scripted {
            queue: samples
                .into_iter()
                .map(|(rssi, packet_count)| RadioSample::new(rssi, packet_count))
                .collect(),
            last: None,
        })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            receiving: false,
            packets: 0,
            calls: Arc::new(RadioCalls::default()),
            fail_start: false,
            fail_sample_at: None,
        }
    }

    /// Make every `start` report a hardware fault.
    #[cfg(test)]
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Make the `n`th call to `sample` (1-based) report a hardware fault.
    pub fn failing_sample_at(mut self, n: u32) -> Self {
        self.fail_sample_at = Some(n);
        self
    }

    #[cfg(test)]
    pub fn calls(&self) -> Arc<RadioCalls> {
        self.calls.clone()
    }

    fn next_sample(&mut self) -> RadioSample {
        match &mut self.source {
            Source::RandomWalk { rng, base, rssi } => {
                let drift: i16 = rng.gen_range(-3..=3);
                let low = (*base as i16 - RSSI_SPREAD).max(i8::MIN as i16);
                let high = (*base as i16 + RSSI_SPREAD).min(i8::MAX as i16);
                *rssi = (*rssi as i16 + drift).clamp(low, high) as i8;
                self.packets = self.packets.saturating_add(rng.gen_range(0..=4));
                RadioSample::new(*rssi, self.packets)
            }
            Source::Scripted { queue, last } => {
                let sample = queue
                    .pop_front()
                    .or(*last)
                    .unwrap_or(RadioSample::new(0, self.packets));
                *last = Some(sample);
                self.packets = sample.packet_count;
                sample
            }
        }
    }
}

impl RadioSession for SimulatedRadio {
    fn start(&mut self, channel: u8, rate: u8) -> Result<(), ScanError> {
        self.calls.starts.fetch_add(1, Ordering::SeqCst);
        if channel > MAX_CHANNEL {
            return Err(ScanError::hardware(format!(
                "channel {} is out of range (0-{})",
                channel, MAX_CHANNEL
            )));
        }
        if self.fail_start {
            return Err(ScanError::hardware("simulated adapter did not respond"));
        }
        debug!("Simulated radio receiving on channel {} (rate {})", channel, rate);
        self.receiving = true;
        self.packets = 0;
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.stops.fetch_add(1, Ordering::SeqCst);
        self.receiving = false;
    }

    fn sample(&mut self) -> Result<RadioSample, ScanError> {
        let n = self.calls.samples.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.receiving {
            return Err(ScanError::hardware("radio is not receiving"));
        }
        if self.fail_sample_at == Some(n) {
            return Err(ScanError::hardware("simulated receive buffer overrun"));
        }
        Ok(self.next_sample())
    }
}
