//! Display Event Channel
//!
//! A single-slot signal channel between the scan loop and the display, built
//! on [`tokio::sync::watch`]. Events carry no payload: on
//! [`ScanEvent::StatusChanged`] the consumer reads the shared statistics
//! itself.
//!
//! Publishing never blocks and never fails. An undrained event is replaced by
//! the newest one, except that a pending [`ScanEvent::StopRequested`] is kept
//! until the consumer takes it.

use crate::domain::models::ScanEvent;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

/// Channel contents. The subscriber compares the counters with what it has
/// already taken to decide what is pending.
#[derive(Debug, Clone, Copy, Default)]
struct Signal {
    latest: Option<ScanEvent>,
    stop_requests: u64,
    issued: u64,
}

/// Create a connected publisher/subscriber pair.
pub fn channel() -> (EventPublisher, EventSubscriber) {
    let (tx, rx) = watch::channel(Signal::default());
    (
        EventPublisher { tx: Arc::new(tx) },
        EventSubscriber {
            rx,
            issued_seen: 0,
            stops_seen: 0,
        },
    )
}

/// Sending side. Cloned by everything that raises display events; the channel
/// closes when the last clone is dropped.
#[derive(Clone)]
pub struct EventPublisher {
    tx: Arc<watch::Sender<Signal>>,
}

impl EventPublisher {
    pub fn publish(&self, event: ScanEvent) {
        // send_modify updates the value even when the subscriber is gone
        self.tx.send_modify(|signal| {
            signal.latest = Some(event);
            signal.issued += 1;
            if event == ScanEvent::StopRequested {
                signal.stop_requests += 1;
            }
        });
        trace!(?event, "Display event published");
    }

    /// Total number of events published through this channel.
    pub fn issued(&self) -> u64 {
        self.tx.borrow().issued
    }
}

/// Receiving side. There is exactly one per channel.
pub struct EventSubscriber {
    rx: watch::Receiver<Signal>,
    issued_seen: u64,
    stops_seen: u64,
}

impl EventSubscriber {
    /// Take the pending event without waiting.
    pub fn try_recv(&mut self) -> Option<ScanEvent> {
        let signal = *self.rx.borrow_and_update();
        if signal.issued == self.issued_seen {
            return None;
        }
        self.issued_seen = signal.issued;

        if signal.stop_requests != self.stops_seen {
            self.stops_seen = signal.stop_requests;
            return Some(ScanEvent::StopRequested);
        }
        signal.latest
    }

    /// Wait for the next event. Returns `None` once every publisher is gone
    /// and nothing is pending.
    pub async fn recv(&mut self) -> Option<ScanEvent> {
        loop {
            if let Some(event) = self.try_recv() {
                return Some(event);
            }
            if self.rx.changed().await.is_err() {
                // Closed, but the last publisher may have sent just before
                return self.try_recv();
            }
        }
    }
}
