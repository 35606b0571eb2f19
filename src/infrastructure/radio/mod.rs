//! Radio Module
//!
//! The receiver driver consumed by the scan controller.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────┐
//! │        ScanController         │
//! └──────────────┬───────────────┘
//!                │ start / sample / stop
//!                ▼
//!        ┌───────────────┐
//!        │ RadioSession  │
//!        └───────┬───────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌────────────┐   ┌────────────┐
//! │   WinRT    │   │ Simulated  │
//! │ - adapter  │   │ - random   │
//! │   watcher  │   │   walk     │
//! │            │   │ - scripted │
//! └────────────┘   └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`simulated`] - Hardware-free backend used for demos and tests
//! - `winrt` - Windows Bluetooth LE advertisement watcher (Windows only)

pub mod simulated;
#[cfg(windows)]
pub mod winrt;

use crate::domain::error::ScanError;
use crate::domain::models::RadioSample;
use crate::domain::settings::{RadioBackend, RadioSettings};
use tracing::info;

pub use simulated::SimulatedRadio;

/// Highest BLE RF channel index.
pub const MAX_CHANNEL: u8 = 39;

/// Receiver lifecycle primitives.
///
/// Implementations are owned by a single scan controller and moved onto its
/// worker thread, hence `Send`.
pub trait RadioSession: Send {
    /// Begin receiving on `channel` at the given data `rate`.
    fn start(&mut self, channel: u8, rate: u8) -> Result<(), ScanError>;

    /// Stop receiving. Safe to call when already stopped.
    fn stop(&mut self);

    /// Read the latest RSSI together with the packet total since `start`.
    fn sample(&mut self) -> Result<RadioSample, ScanError>;
}

/// Bring up the configured backend.
pub fn open(settings: &RadioSettings) -> Result<Box<dyn RadioSession>, ScanError> {
    match settings.backend {
        RadioBackend::Simulated => {
            info!(
                "Using simulated radio (seed {:#x}, base RSSI {} dBm)",
                settings.simulated_seed, settings.simulated_base_rssi
            );
            let mut radio =
                SimulatedRadio::random_walk(settings.simulated_seed, settings.simulated_base_rssi);
            if let Some(n) = settings.simulated_fault_at_sample {
                radio = radio.failing_sample_at(n);
            }
            Ok(Box::new(radio))
        }
        RadioBackend::Native => open_native(),
    }
}

#[cfg(windows)]
fn open_native() -> Result<Box<dyn RadioSession>, ScanError> {
    Ok(Box::new(winrt::WinRtRadio::open()?))
}

#[cfg(not(windows))]
fn open_native() -> Result<Box<dyn RadioSession>, ScanError> {
    Err(ScanError::hardware(
        "no native radio backend on this platform; set radio.backend to \"simulated\"",
    ))
}
