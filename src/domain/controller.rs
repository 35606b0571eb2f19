//! Scan Controller
//!
//! Owns the Idle/Scanning state and the radio handle, and drives the poll
//! cycle: sample, commit statistics, publish `StatusChanged`, wait.

use crate::domain::error::ScanError;
use crate::domain::events::EventPublisher;
use crate::domain::models::{ScanCommand, ScanEvent, ScanState, Statistics};
use crate::domain::settings::ScanSettings;
use crate::domain::statistics::SharedStatistics;
use crate::infrastructure::radio::RadioSession;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub channel: u8,
    pub rate: u8,
    pub poll_interval: Duration,
}

impl From<&ScanSettings> for ScanConfig {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            channel: settings.channel,
            rate: settings.rate,
            poll_interval: settings.poll_interval(),
        }
    }
}

/// Why [`ScanController::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Scanning stopped, the worker may be asked to start again
    Stopped,
    /// The worker should exit
    Shutdown,
}

pub struct ScanController {
    radio: Box<dyn RadioSession>,
    state: ScanState,
    config: ScanConfig,
    statistics: SharedStatistics,
    publisher: EventPublisher,
}

impl ScanController {
    pub fn new(
        radio: Box<dyn RadioSession>,
        config: ScanConfig,
        statistics: SharedStatistics,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            radio,
            state: ScanState::Idle,
            config,
            statistics,
            publisher,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Start the radio if idle. A radio fault leaves the controller idle.
    pub fn start(&mut self) -> Result<(), ScanError> {
        if self.state == ScanState::Scanning {
            debug!("Start ignored, already scanning");
            return Ok(());
        }

        if let Err(e) = self.radio.start(self.config.channel, self.config.rate) {
            error!("Radio failed to start: {}", e);
            return Err(e);
        }

        self.state = ScanState::Scanning;
        info!(
            "Scanning on channel {} (rate {})",
            self.config.channel, self.config.rate
        );
        Ok(())
    }

    /// Stop the radio if scanning.
    pub fn stop(&mut self) {
        if self.state == ScanState::Idle {
            return;
        }
        self.radio.stop();
        self.state = ScanState::Idle;
        info!("Scanning stopped");
    }

    /// Take one sample, commit it and notify the display.
    ///
    /// The statistics lock is released before `StatusChanged` is published.
    pub fn poll_once(&mut self) -> Result<Statistics, ScanError> {
        if self.state != ScanState::Scanning {
            return Err(ScanError::InvalidTransition {
                operation: "poll_once",
                state: self.state,
            });
        }

        let sample = match self.radio.sample() {
            Ok(sample) => sample,
            Err(e) => {
                error!("Radio sample failed: {}", e);
                self.stop();
                return Err(e);
            }
        };

        let stats = self.statistics.record(sample);
        info!(
            "Packet received with RSSI: {} dBm, total packets: {}",
            stats.rssi, stats.packet_count
        );

        self.publisher.publish(ScanEvent::StatusChanged);
        Ok(stats)
    }

    /// Poll until scanning stops.
    ///
    /// Commands are only acted on between polls, so at most one poll that was
    /// already under way completes after a stop is issued.
    pub async fn run(
        &mut self,
        commands: &mut mpsc::UnboundedReceiver<ScanCommand>,
    ) -> Result<LoopExit, ScanError> {
        while self.state == ScanState::Scanning {
            loop {
                match commands.try_recv() {
                    Ok(cmd) => {
                        if let Some(exit) = self.apply(cmd) {
                            return Ok(exit);
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return Ok(self.disconnected()),
                }
            }

            self.poll_once()?;

            let delay = tokio::time::sleep(self.config.poll_interval);
            tokio::pin!(delay);
            loop {
                tokio::select! {
                    _ = &mut delay => break,
                    cmd = commands.recv() => match cmd {
                        Some(cmd) => {
                            if let Some(exit) = self.apply(cmd) {
                                return Ok(exit);
                            }
                        }
                        None => return Ok(self.disconnected()),
                    },
                }
            }
        }
        Ok(LoopExit::Stopped)
    }

    fn apply(&mut self, cmd: ScanCommand) -> Option<LoopExit> {
        match cmd {
            ScanCommand::Start => None,
            ScanCommand::Stop => {
                self.stop();
                Some(LoopExit::Stopped)
            }
            ScanCommand::Shutdown => {
                self.stop();
                Some(LoopExit::Shutdown)
            }
        }
    }

    fn disconnected(&mut self) -> LoopExit {
        debug!("Command channel closed");
        self.stop();
        LoopExit::Shutdown
    }
}
