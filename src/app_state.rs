//! Application ownership root.
//!
//! Built once at startup. Holds the shared statistics, the display event
//! publisher and the scan worker; everything else receives clones of these
//! handles. Resources are released in reverse order of acquisition.

use crate::domain::controller::{ScanConfig, ScanController};
use crate::domain::events::{self, EventPublisher, EventSubscriber};
use crate::domain::models::WorkerEvent;
use crate::domain::settings::ScanSettings;
use crate::domain::statistics::SharedStatistics;
use crate::infrastructure::radio::RadioSession;
use crate::infrastructure::scan_worker::{ScanHandle, ScanWorker};
use tokio::sync::mpsc;
use tracing::info;

/// Receiving ends handed to the single display consumer.
pub struct ConsumerEndpoints {
    pub events: EventSubscriber,
    pub worker_events: mpsc::UnboundedReceiver<WorkerEvent>,
}

/// Cloned handles a display front end works with.
#[derive(Clone)]
pub struct DisplayHandles {
    pub statistics: SharedStatistics,
    pub publisher: EventPublisher,
    pub scanner: ScanHandle,
}

// Field order is the reverse of acquisition so drops run newest first
pub struct AppState {
    worker: Option<ScanWorker>,
    scanner: ScanHandle,
    publisher: EventPublisher,
    statistics: SharedStatistics,
}

impl AppState {
    /// Build the shared state and start the scan worker.
    pub fn launch(
        settings: &ScanSettings,
        radio: Box<dyn RadioSession>,
    ) -> anyhow::Result<(Self, ConsumerEndpoints)> {
        let statistics = SharedStatistics::new();
        let (publisher, events) = events::channel();
        let (worker_tx, worker_events) = mpsc::unbounded_channel();

        let controller = ScanController::new(
            radio,
            ScanConfig::from(settings),
            statistics.clone(),
            publisher.clone(),
        );
        let (worker, scanner) = ScanWorker::spawn(controller, worker_tx)?;

        if settings.auto_start {
            scanner.start();
        }

        Ok((
            Self {
                worker: Some(worker),
                scanner,
                publisher,
                statistics,
            },
            ConsumerEndpoints {
                events,
                worker_events,
            },
        ))
    }

    pub fn display_handles(&self) -> DisplayHandles {
        DisplayHandles {
            statistics: self.statistics.clone(),
            publisher: self.publisher.clone(),
            scanner: self.scanner.clone(),
        }
    }

    /// Stop scanning and wait for the worker to exit.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn stop_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.scanner.shutdown();
            worker.join();
            info!("Scan worker shut down");
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        self.stop_worker();
    }
}
