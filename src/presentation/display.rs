//! Display event callback shared by the window and console front ends.

use crate::domain::models::{EventOutcome, ScanEvent, StatusText};
use crate::domain::statistics::SharedStatistics;
use crate::infrastructure::scan_worker::ScanHandle;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Something that can show the latest status text.
pub trait StatusDisplay {
    fn show_status(&mut self, text: &StatusText);
}

/// React to one display event.
///
/// `StatusChanged` refreshes `display` from the current statistics;
/// `StopRequested` asks the scan worker to stop.
pub fn handle_scan_event(
    event: ScanEvent,
    statistics: &SharedStatistics,
    display: &mut dyn StatusDisplay,
    scanner: &ScanHandle,
) -> EventOutcome {
    match event {
        ScanEvent::StatusChanged => {
            let text = statistics.snapshot().status_text();
            display.show_status(&text);
            EventOutcome::Handled
        }
        ScanEvent::StopRequested => {
            if scanner.stop() {
                debug!("Stop forwarded to scan worker");
                EventOutcome::Handled
            } else {
                warn!("Stop requested but the scan worker is not running");
                EventOutcome::Unhandled
            }
        }
    }
}

/// Holds the fault that last ended a scan until scanning is started again.
///
/// Front ends turn a latched fault into a failing exit status.
#[derive(Debug, Clone, Default)]
pub struct FaultLatch {
    inner: Arc<Mutex<Option<String>>>,
}

impl FaultLatch {
    pub fn record(&self, message: &str) {
        *self.lock() = Some(message.to_string());
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// `Err` carrying the latched fault message, if any.
    pub fn outcome(&self) -> anyhow::Result<()> {
        match self.lock().as_deref() {
            Some(message) => Err(anyhow::anyhow!("{}", message)),
            None => Ok(()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
