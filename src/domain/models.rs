use std::fmt;

/// Whether the radio is currently being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Scanning,
}

/// One reading taken from the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioSample {
    /// Signal strength of the most recent packet in dBm
    pub rssi: i8,
    /// Packets received since the radio was started. Backends saturate at
    /// `u16::MAX` rather than wrapping.
    pub packet_count: u16,
}

impl RadioSample {
    pub fn new(rssi: i8, packet_count: u16) -> Self {
        Self { rssi, packet_count }
    }
}

/// Aggregated reception statistics.
///
/// Always written as a whole so `rssi` and `packet_count` come from the same sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    pub rssi: i8,
    pub packet_count: u16,
    /// Number of samples recorded since startup
    pub samples: u64,
}

impl Statistics {
    pub fn status_text(&self) -> StatusText {
        StatusText(format!(
            "RSSI: {} dBm\nPackets: {}",
            self.rssi, self.packet_count
        ))
    }
}

/// Human readable snapshot of [`Statistics`] shown by the display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusText(String);

impl StatusText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signals carried by the display event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    /// New statistics are available
    StatusChanged,
    /// The user asked for scanning to stop
    StopRequested,
}

/// Acknowledgment returned by the display event callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    Unhandled,
}

/// Commands accepted by the scan worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanCommand {
    Start,
    Stop,
    Shutdown,
}

/// Notices the scan worker sends back to the display.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    StateChanged(ScanState),
    LogMessage(StatusMessage),
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_format() {
        let stats = Statistics {
            rssi: -67,
            packet_count: 12,
            samples: 3,
        };
        assert_eq!(stats.status_text().as_str(), "RSSI: -67 dBm\nPackets: 12");
    }

    #[test]
    fn test_initial_state_is_idle() {
        assert_eq!(ScanState::default(), ScanState::Idle);
        assert_eq!(Statistics::default().status_text().to_string(), "RSSI: 0 dBm\nPackets: 0");
    }
}
