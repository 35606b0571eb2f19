//! Scan Worker
//!
//! Hosts the [`ScanController`] on a dedicated thread with its own
//! current-thread tokio runtime, so the inter-poll delay never blocks the
//! display. The display drives it through a [`ScanHandle`].

use crate::domain::controller::{LoopExit, ScanController};
use crate::domain::error::ScanError;
use crate::domain::models::{MessageSeverity, ScanCommand, ScanState, StatusMessage, WorkerEvent};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Command side of the scan worker.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    commands: mpsc::UnboundedSender<ScanCommand>,
}

impl ScanHandle {
    pub fn new(commands: mpsc::UnboundedSender<ScanCommand>) -> Self {
        Self { commands }
    }

    /// Returns `false` when the worker is no longer running.
    pub fn start(&self) -> bool {
        self.send(ScanCommand::Start)
    }

    pub fn stop(&self) -> bool {
        self.send(ScanCommand::Stop)
    }

    pub fn shutdown(&self) -> bool {
        self.send(ScanCommand::Shutdown)
    }

    fn send(&self, cmd: ScanCommand) -> bool {
        self.commands.send(cmd).is_ok()
    }
}

pub struct ScanWorker {
    thread: thread::JoinHandle<()>,
}

impl ScanWorker {
    pub fn spawn(
        controller: ScanController,
        worker_events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> anyhow::Result<(Self, ScanHandle)> {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime for scanning: {}", e))?;

        let thread = thread::Builder::new()
            .name("scan-worker".to_string())
            .spawn(move || rt.block_on(worker_loop(controller, cmd_rx, worker_events)))?;

        Ok((Self { thread }, ScanHandle::new(cmd_tx)))
    }

    /// Wait for the worker thread to exit. Send `Shutdown` first.
    pub fn join(self) {
        if self.thread.join().is_err() {
            error!("Scan worker panicked");
        }
    }
}

async fn worker_loop(
    mut controller: ScanController,
    mut commands: mpsc::UnboundedReceiver<ScanCommand>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    info!("Scan worker started");

    while let Some(cmd) = commands.recv().await {
        match cmd {
            ScanCommand::Start => {
                if let Err(e) = controller.start() {
                    report_fault(&events, &e);
                    let _ = events.send(WorkerEvent::StateChanged(ScanState::Idle));
                    continue;
                }
                let _ = events.send(WorkerEvent::StateChanged(ScanState::Scanning));
                send_message(
                    &events,
                    "Scanning for advertisements...".to_string(),
                    MessageSeverity::Success,
                );

                let exit = controller.run(&mut commands).await;
                debug!("Poll loop returned {:?} in state {:?}", exit, controller.state());
                if let Err(e) = &exit {
                    report_fault(&events, e);
                } else {
                    send_message(&events, "Scan stopped.".to_string(), MessageSeverity::Info);
                }
                let _ = events.send(WorkerEvent::StateChanged(ScanState::Idle));

                if let Ok(LoopExit::Shutdown) = exit {
                    break;
                }
            }
            ScanCommand::Stop => controller.stop(),
            ScanCommand::Shutdown => break,
        }
    }

    controller.stop();
    info!("Scan worker exited");
}

fn report_fault(events: &mpsc::UnboundedSender<WorkerEvent>, e: &ScanError) {
    error!("Scanning halted: {}", e);
    send_message(events, format!("Scanning halted: {}", e), MessageSeverity::Error);
}

fn send_message(
    events: &mpsc::UnboundedSender<WorkerEvent>,
    message: String,
    severity: MessageSeverity,
) {
    let _ = events.send(WorkerEvent::LogMessage(StatusMessage { message, severity }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::controller::ScanConfig;
    use crate::domain::events;
    use crate::domain::statistics::SharedStatistics;
    use crate::infrastructure::radio::SimulatedRadio;
    use std::time::Duration;

    fn spawn_worker(
        radio: SimulatedRadio,
    ) -> (
        ScanWorker,
        ScanHandle,
        SharedStatistics,
        mpsc::UnboundedReceiver<WorkerEvent>,
    ) {
        let statistics = SharedStatistics::new();
        let (publisher, _subscriber) = events::channel();
        let controller = ScanController::new(
            Box::new(radio),
            ScanConfig {
                channel: 37,
                rate: 1,
                poll_interval: Duration::from_millis(2),
            },
            statistics.clone(),
            publisher,
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let (worker, handle) = ScanWorker::spawn(controller, tx).unwrap();
        (worker, handle, statistics, rx)
    }

    fn next_state(rx: &mut mpsc::UnboundedReceiver<WorkerEvent>) -> ScanState {
        loop {
            match rx.blocking_recv().expect("worker event channel closed") {
                WorkerEvent::StateChanged(state) => return state,
                WorkerEvent::LogMessage(_) => continue,
            }
        }
    }

    #[test]
    fn test_start_stop_shutdown() {
        let radio = SimulatedRadio::scripted([(-40, 1), (-42, 5), (-50, 9)]);
        let calls = radio.calls();
        let (worker, handle, statistics, mut rx) = spawn_worker(radio);

        assert!(handle.start());
        assert_eq!(next_state(&mut rx), ScanState::Scanning);

        while statistics.snapshot().samples < 3 {
            thread::sleep(Duration::from_millis(1));
        }

        assert!(handle.stop());
        assert_eq!(next_state(&mut rx), ScanState::Idle);
        assert_eq!(statistics.snapshot().packet_count, 9);

        assert!(handle.shutdown());
        worker.join();
        assert!(!handle.start());
        assert_eq!(calls.starts(), 1);
        assert_eq!(calls.stops(), 1);
    }

    #[test]
    fn test_fault_is_reported_before_idle() {
        let radio = SimulatedRadio::scripted([(-40, 1)]).failing_sample_at(2);
        let (worker, handle, _, mut rx) = spawn_worker(radio);

        handle.start();
        assert_eq!(next_state(&mut rx), ScanState::Scanning);

        let mut saw_error = false;
        loop {
            match rx.blocking_recv().unwrap() {
                WorkerEvent::LogMessage(msg) if msg.severity == MessageSeverity::Error => {
                    assert!(msg.message.contains("hardware fault"));
                    saw_error = true;
                }
                WorkerEvent::LogMessage(_) => {}
                WorkerEvent::StateChanged(state) => {
                    assert_eq!(state, ScanState::Idle);
                    break;
                }
            }
        }
        assert!(saw_error);

        handle.shutdown();
        worker.join();
    }

    #[test]
    fn test_start_fault_reports_idle() {
        let radio = SimulatedRadio::scripted([(-40, 1)]).failing_start();
        let (worker, handle, _, mut rx) = spawn_worker(radio);

        handle.start();
        assert_eq!(next_state(&mut rx), ScanState::Idle);

        handle.shutdown();
        worker.join();
    }

    #[test]
    fn test_shutdown_while_scanning() {
        let radio = SimulatedRadio::scripted([(-40, 1)]);
        let calls = radio.calls();
        let (worker, handle, _, mut rx) = spawn_worker(radio);

        handle.start();
        assert_eq!(next_state(&mut rx), ScanState::Scanning);
        handle.shutdown();
        assert_eq!(next_state(&mut rx), ScanState::Idle);
        worker.join();

        assert_eq!(calls.stops(), 1);
    }

    /// Publishes `StopRequested` from inside the `stop_at`th sample and holds
    /// that sample until the display has forwarded the stop.
    struct StopMidPoll {
        inner: SimulatedRadio,
        stop_at: u32,
        sampled: u32,
        publisher: events::EventPublisher,
        forwarded: std::sync::mpsc::Receiver<()>,
    }

    impl crate::infrastructure::radio::RadioSession for StopMidPoll {
        fn start(&mut self, channel: u8, rate: u8) -> Result<(), ScanError> {
            self.inner.start(channel, rate)
        }

        fn stop(&mut self) {
            self.inner.stop()
        }

        fn sample(&mut self) -> Result<crate::domain::models::RadioSample, ScanError> {
            self.sampled += 1;
            if self.sampled == self.stop_at {
                self.publisher.publish(crate::domain::models::ScanEvent::StopRequested);
                let _ = self.forwarded.recv();
            }
            self.inner.sample()
        }
    }

    #[test]
    fn test_display_stop_during_poll_allows_no_further_poll() {
        use crate::domain::models::{EventOutcome, ScanEvent};
        use crate::presentation::console::ConsoleDisplay;
        use crate::presentation::display::handle_scan_event;
        use std::time::Instant;

        let inner = SimulatedRadio::scripted([(-40, 1), (-42, 5), (-50, 9), (-55, 12)]);
        let calls = inner.calls();
        let statistics = SharedStatistics::new();
        let (publisher, mut subscriber) = events::channel();
        let (forwarded_tx, forwarded_rx) = std::sync::mpsc::channel();
        let radio = StopMidPoll {
            inner,
            stop_at: 2,
            sampled: 0,
            publisher: publisher.clone(),
            forwarded: forwarded_rx,
        };
        let controller = ScanController::new(
            Box::new(radio),
            ScanConfig {
                channel: 37,
                rate: 1,
                poll_interval: Duration::from_millis(2),
            },
            statistics.clone(),
            publisher,
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (worker, handle) = ScanWorker::spawn(controller, tx).unwrap();

        handle.start();
        assert_eq!(next_state(&mut rx), ScanState::Scanning);

        let mut display = ConsoleDisplay::default();
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            assert!(Instant::now() < deadline, "stop was never published");
            match subscriber.try_recv() {
                Some(ScanEvent::StopRequested) => {
                    let outcome = handle_scan_event(
                        ScanEvent::StopRequested,
                        &statistics,
                        &mut display,
                        &handle,
                    );
                    assert_eq!(outcome, EventOutcome::Handled);
                    forwarded_tx.send(()).unwrap();
                    break;
                }
                Some(event) => {
                    handle_scan_event(event, &statistics, &mut display, &handle);
                }
                None => thread::sleep(Duration::from_millis(1)),
            }
        }

        assert_eq!(next_state(&mut rx), ScanState::Idle);
        assert_eq!(calls.samples(), 2);
        assert_eq!(statistics.snapshot().packet_count, 5);

        handle.shutdown();
        worker.join();
    }
}
