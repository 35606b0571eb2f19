//! WinRT Radio Backend
//!
//! Counts Bluetooth LE advertisements seen by the host adapter and keeps the
//! signal strength of the most recent one.

use super::{RadioSession, MAX_CHANNEL};
use crate::domain::error::ScanError;
use crate::domain::models::RadioSample;
use std::sync::atomic::{AtomicI16, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEAdvertisementWatcherStatus, BluetoothLEScanningMode,
};
use windows::Devices::Bluetooth::BluetoothAdapter;
use windows::Foundation::TypedEventHandler;

fn fault(context: &str, err: windows::core::Error) -> ScanError {
    ScanError::hardware(format!("{}: {}", context, err.message()))
}

#[derive(Default)]
struct Reception {
    last_rssi: AtomicI16,
    packets: AtomicU32,
}

struct ActiveWatch {
    watcher: BluetoothLEAdvertisementWatcher,
    token: i64,
}

pub struct WinRtRadio {
    active: Option<ActiveWatch>,
    reception: Arc<Reception>,
}

impl WinRtRadio {
    /// Check that a Bluetooth LE capable adapter is present.
    pub fn open() -> Result<Self, ScanError> {
        let adapter = BluetoothAdapter::GetDefaultAsync()
            .and_then(|op| op.get())
            .map_err(|e| fault("no Bluetooth adapter", e))?;
        let supported = adapter
            .IsLowEnergySupported()
            .map_err(|e| fault("adapter query failed", e))?;
        if !supported {
            return Err(ScanError::hardware(
                "default Bluetooth adapter does not support LE",
            ));
        }

        info!("Bluetooth LE adapter ready");
        Ok(Self {
            active: None,
            reception: Arc::new(Reception::default()),
        })
    }
}

impl RadioSession for WinRtRadio {
    fn start(&mut self, channel: u8, rate: u8) -> Result<(), ScanError> {
        if channel > MAX_CHANNEL {
            return Err(ScanError::hardware(format!(
                "channel {} is out of range (0-{})",
                channel, MAX_CHANNEL
            )));
        }
        self.stop();

        // The host stack picks channels and PHY itself
        info!(
            "Starting advertisement watch (requested channel {}, rate {})",
            channel, rate
        );

        self.reception.packets.store(0, Ordering::SeqCst);
        self.reception.last_rssi.store(0, Ordering::SeqCst);

        let watcher =
            BluetoothLEAdvertisementWatcher::new().map_err(|e| fault("watcher create", e))?;
        watcher
            .SetScanningMode(BluetoothLEScanningMode::Passive)
            .map_err(|e| fault("set scanning mode", e))?;

        let reception = self.reception.clone();
        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let rssi = args.RawSignalStrengthInDBm()?;
                    reception.last_rssi.store(rssi, Ordering::SeqCst);
                    reception.packets.fetch_add(1, Ordering::SeqCst);
                }
                Ok(())
            },
        );

        let token = watcher
            .Received(&handler)
            .map_err(|e| fault("register handler", e))?;
        watcher.Start().map_err(|e| fault("watcher start", e))?;
        self.active = Some(ActiveWatch { watcher, token });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            info!("Stopping advertisement watch");
            let _ = active.watcher.RemoveReceived(active.token);
            if let Err(e) = active.watcher.Stop() {
                warn!("Watcher did not stop cleanly: {}", e.message());
            }
        }
    }

    fn sample(&mut self) -> Result<RadioSample, ScanError> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| ScanError::hardware("radio is not receiving"))?;

        let status = active
            .watcher
            .Status()
            .map_err(|e| fault("watcher status", e))?;
        if status == BluetoothLEAdvertisementWatcherStatus::Aborted {
            return Err(ScanError::hardware("advertisement watcher aborted"));
        }

        let rssi = self.reception.last_rssi.load(Ordering::SeqCst);
        let packets = self.reception.packets.load(Ordering::SeqCst);
        Ok(RadioSample::new(
            rssi.clamp(i8::MIN as i16, i8::MAX as i16) as i8,
            packets.min(u16::MAX as u32) as u16,
        ))
    }
}

impl Drop for WinRtRadio {
    fn drop(&mut self) {
        self.stop();
    }
}
