mod app_state;
mod domain;
mod infrastructure;
mod presentation;

use crate::app_state::AppState;
use crate::domain::settings::{DisplayMode, SettingsService};
use crate::infrastructure::{logging, radio};
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("ble_packet_scanner: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> anyhow::Result<()> {
    let settings_service = SettingsService::new()?;
    let settings = settings_service.get().clone();

    let _logging_guard = logging::init_logger(&settings.log_settings)
        .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
        .ok();

    info!("Starting BLE Packet Scanner");

    if !settings_service.path().exists() {
        match settings_service.save() {
            Ok(()) => info!(
                "Wrote default settings to {}",
                settings_service.path().display()
            ),
            Err(e) => warn!("Could not write default settings: {}", e),
        }
    }

    let radio = radio::open(&settings.radio)?;
    let (app_state, endpoints) = AppState::launch(&settings.scan, radio)?;
    let handles = app_state.display_handles();

    let result = match settings.display.mode {
        DisplayMode::Window => presentation::app::run_window(settings_service, handles, endpoints),
        DisplayMode::Console => presentation::console::run_console(handles, endpoints),
    };

    app_state.shutdown();
    info!("BLE Packet Scanner exited");
    result
}
