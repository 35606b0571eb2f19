//! Headless front end: logs status text until scanning stops.

use crate::app_state::{ConsumerEndpoints, DisplayHandles};
use crate::domain::models::{EventOutcome, MessageSeverity, ScanEvent, ScanState, StatusText, WorkerEvent};
use crate::presentation::display::{handle_scan_event, FaultLatch, StatusDisplay};
use tracing::{error, info, warn};

#[derive(Default)]
pub struct ConsoleDisplay {
    refreshes: u64,
}

#[cfg(test)]
impl ConsoleDisplay {
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

impl StatusDisplay for ConsoleDisplay {
    fn show_status(&mut self, text: &StatusText) {
        self.refreshes += 1;
        info!("{}", text.as_str().replace('\n', " | "));
    }
}

/// Run the console front end on the calling thread.
pub fn run_console(handles: DisplayHandles, endpoints: ConsumerEndpoints) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut display = ConsoleDisplay::default();
    rt.block_on(console_loop(handles, endpoints, &mut display))
}

/// Start scanning and consume events until the worker reports idle.
///
/// Ctrl+C publishes `StopRequested`. Returns an error if scanning ended on a
/// hardware fault.
pub async fn console_loop(
    handles: DisplayHandles,
    endpoints: ConsumerEndpoints,
    display: &mut ConsoleDisplay,
) -> anyhow::Result<()> {
    let DisplayHandles {
        statistics,
        publisher,
        scanner,
    } = handles;
    let ConsumerEndpoints {
        mut events,
        mut worker_events,
    } = endpoints;

    if !scanner.start() {
        anyhow::bail!("Scan worker is not running");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;
    let faults = FaultLatch::default();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if handle_scan_event(event, &statistics, display, &scanner)
                        == EventOutcome::Unhandled
                    {
                        break;
                    }
                }
                None => break,
            },
            notice = worker_events.recv() => match notice {
                Some(WorkerEvent::StateChanged(ScanState::Scanning)) => {
                    info!("Scanning, press Ctrl+C to stop");
                }
                Some(WorkerEvent::StateChanged(ScanState::Idle)) | None => break,
                Some(WorkerEvent::LogMessage(msg)) => match msg.severity {
                    MessageSeverity::Error => {
                        error!("{}", msg.message);
                        faults.record(&msg.message);
                    }
                    _ => info!("{}", msg.message),
                },
            },
            result = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl+C: {}", e);
                } else {
                    publisher.publish(ScanEvent::StopRequested);
                }
            }
        }
    }

    info!(
        "Final status: {}",
        statistics.snapshot().status_text().as_str().replace('\n', " | ")
    );

    faults.outcome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use crate::domain::settings::ScanSettings;
    use crate::infrastructure::radio::SimulatedRadio;
    use std::time::Duration;

    fn settings() -> ScanSettings {
        ScanSettings {
            poll_interval_ms: 2,
            auto_start: false,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_console_stops_on_request() {
        let radio = SimulatedRadio::scripted([(-40, 1), (-42, 5), (-50, 9)]);
        let (state, endpoints) = AppState::launch(&settings(), Box::new(radio)).unwrap();
        let handles = state.display_handles();

        let publisher = handles.publisher.clone();
        let statistics = handles.statistics.clone();
        tokio::spawn(async move {
            while statistics.snapshot().samples < 3 {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            publisher.publish(ScanEvent::StopRequested);
        });

        let mut display = ConsoleDisplay::default();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            console_loop(handles, endpoints, &mut display),
        )
        .await
        .expect("console loop did not finish");

        assert!(result.is_ok());
        assert!(display.refreshes() >= 1);
        state.shutdown();
    }

    #[tokio::test]
    async fn test_console_reports_hardware_fault() {
        let radio = SimulatedRadio::scripted([(-40, 1)]).failing_sample_at(3);
        let (state, endpoints) = AppState::launch(&settings(), Box::new(radio)).unwrap();

        let mut display = ConsoleDisplay::default();
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            console_loop(state.display_handles(), endpoints, &mut display),
        )
        .await
        .expect("console loop did not finish");

        let err = result.unwrap_err();
        assert!(err.to_string().contains("hardware fault"));
        state.shutdown();
    }
}
