use crate::app_state::{ConsumerEndpoints, DisplayHandles};
use crate::domain::events::EventSubscriber;
use crate::domain::models::{
    EventOutcome, MessageSeverity, ScanEvent, ScanState, StatusMessage, StatusText, WorkerEvent,
};
use crate::domain::settings::SettingsService;
use crate::presentation::display::{handle_scan_event, FaultLatch, StatusDisplay};
use crate::presentation::theme::{self, ScannerPalette};
use eframe::egui;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;

/// Redraw cadence while waiting for events
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Status text as last refreshed by a `StatusChanged` event.
#[derive(Default)]
pub struct StatusPanel {
    text: StatusText,
    refreshed_at: Option<Instant>,
    refreshes: u64,
}

impl StatusDisplay for StatusPanel {
    fn show_status(&mut self, text: &StatusText) {
        self.text = text.clone();
        self.refreshed_at = Some(Instant::now());
        self.refreshes += 1;
    }
}

pub struct ScannerApp {
    settings: SettingsService,
    handles: DisplayHandles,
    events: EventSubscriber,
    worker_events: mpsc::UnboundedReceiver<WorkerEvent>,

    panel: StatusPanel,
    scan_state: ScanState,
    status_message: Option<StatusMessage>,
    faults: FaultLatch,
    is_dark_mode: bool,
}

impl ScannerApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: SettingsService,
        handles: DisplayHandles,
        endpoints: ConsumerEndpoints,
        faults: FaultLatch,
    ) -> Self {
        let is_dark_mode = settings.get().display.dark_mode;
        theme::apply_theme(&cc.egui_ctx, is_dark_mode);

        Self {
            settings,
            handles,
            events: endpoints.events,
            worker_events: endpoints.worker_events,
            panel: StatusPanel::default(),
            scan_state: ScanState::Idle,
            status_message: None,
            faults,
            is_dark_mode,
        }
    }

    fn drain_worker_events(&mut self) {
        while let Ok(event) = self.worker_events.try_recv() {
            match event {
                WorkerEvent::StateChanged(state) => self.scan_state = state,
                WorkerEvent::LogMessage(msg) => {
                    if msg.severity == MessageSeverity::Error {
                        self.faults.record(&msg.message);
                    }
                    // Keep a fault visible until the user starts again
                    let keep_error = self
                        .status_message
                        .as_ref()
                        .is_some_and(|m| m.severity == MessageSeverity::Error)
                        && msg.severity != MessageSeverity::Error
                        && self.scan_state == ScanState::Idle;
                    if !keep_error {
                        self.status_message = Some(msg);
                    }
                }
            }
        }
    }

    fn drain_scan_events(&mut self) {
        while let Some(event) = self.events.try_recv() {
            let outcome = handle_scan_event(
                event,
                &self.handles.statistics,
                &mut self.panel,
                &self.handles.scanner,
            );
            if outcome == EventOutcome::Unhandled {
                self.status_message = Some(StatusMessage {
                    message: "Scanner is not running".to_string(),
                    severity: MessageSeverity::Error,
                });
            }
        }
    }

    fn toggle_theme(&mut self, ctx: &egui::Context) {
        self.is_dark_mode = !self.is_dark_mode;
        theme::apply_theme(ctx, self.is_dark_mode);
        self.settings.get_mut().display.dark_mode = self.is_dark_mode;
        if let Err(e) = self.settings.save() {
            warn!("Failed to save settings: {}", e);
        }
    }

    fn ui_scan_panel(&mut self, ui: &mut egui::Ui) {
        let palette = ScannerPalette::new(self.is_dark_mode);
        section(ui, "Scan Control", |ui| {
            state_banner(ui, self.scan_state, &palette);

            ui.horizontal(|ui| match self.scan_state {
                ScanState::Scanning => {
                    if ui.button("Stop Scan").clicked() {
                        self.handles.publisher.publish(ScanEvent::StopRequested);
                    }
                    ui.spinner();
                }
                ScanState::Idle => {
                    if ui.button("Start Scan").clicked() {
                        self.status_message = None;
                        self.faults.clear();
                        self.handles.scanner.start();
                    }
                }
            });
        });
    }

    fn ui_status_panel(&self, ui: &mut egui::Ui) {
        section(ui, "Reception", |ui| {
            ui.label(egui::RichText::new(self.panel.text.as_str()).monospace().strong());
            ui.separator();

            let stats = self.handles.statistics.snapshot();
            stat_row(ui, "Samples", stats.samples.to_string());
            stat_row(ui, "Display refreshes", self.panel.refreshes.to_string());
            stat_row(
                ui,
                "Events published",
                self.handles.publisher.issued().to_string(),
            );
            let age = self
                .panel
                .refreshed_at
                .map(|t| format!("{:.1}s ago", t.elapsed().as_secs_f32()))
                .unwrap_or_else(|| "never".to_string());
            stat_row(ui, "Last update", age);
        });
    }

    fn ui_message_panel(&self, ui: &mut egui::Ui) {
        if let Some(msg) = &self.status_message {
            let palette = ScannerPalette::new(self.is_dark_mode);
            let color = match msg.severity {
                MessageSeverity::Info => palette.fg,
                MessageSeverity::Success => palette.scanning,
                MessageSeverity::Error => palette.fault,
            };
            section(ui, "System Status", |ui| {
                ui.label(egui::RichText::new(&msg.message).color(color).strong());
            });
        }
    }
}

/// Titled group box.
fn section(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.group(|ui| {
        ui.set_width(ui.available_width());
        ui.strong(title);
        ui.separator();
        add_contents(ui);
    });
}

/// Full-width strip coloured by scan state.
fn state_banner(ui: &mut egui::Ui, state: ScanState, palette: &ScannerPalette) {
    let (label, fill) = match state {
        ScanState::Scanning => ("SCANNING", palette.scanning),
        ScanState::Idle => ("IDLE", palette.idle),
    };
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(ui.available_width(), 32.0), egui::Sense::hover());
    ui.painter().rect_filled(rect, egui::Rounding::ZERO, fill);
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        label,
        egui::FontId::proportional(16.0),
        egui::Color32::BLACK,
    );
}

fn stat_row(ui: &mut egui::Ui, label: &str, value: impl Into<String>) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(label).weak());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(egui::RichText::new(value.into()).monospace());
        });
    });
}

impl eframe::App for ScannerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_worker_events();
        self.drain_scan_events();
        ctx.request_repaint_after(REPAINT_INTERVAL);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("BLE Packet Scanner");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode { "Light" } else { "Dark" };
                    if ui.button(switch_icon).clicked() {
                        self.toggle_theme(ctx);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(480.0);
                ui.add_space(12.0);
                self.ui_scan_panel(ui);
                ui.add_space(10.0);
                self.ui_status_panel(ui);
                ui.add_space(10.0);
                self.ui_message_panel(ui);
            });
        });
    }
}

/// Open the scanner window and block until it is closed.
///
/// Fails if the last scan ended on a hardware fault that was not followed by
/// a restart.
pub fn run_window(
    settings: SettingsService,
    handles: DisplayHandles,
    endpoints: ConsumerEndpoints,
) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([520.0, 560.0])
            .with_title("BLE Packet Scanner"),
        ..Default::default()
    };

    let faults = FaultLatch::default();
    let app_faults = faults.clone();
    eframe::run_native(
        "BLE Packet Scanner",
        options,
        Box::new(move |cc| {
            Ok(Box::new(ScannerApp::new(
                cc, settings, handles, endpoints, app_faults,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Display window failed: {}", e))?;

    faults.outcome()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_panel_tracks_refreshes() {
        let mut panel = StatusPanel::default();
        assert!(panel.refreshed_at.is_none());

        let stats = crate::domain::models::Statistics {
            rssi: -48,
            packet_count: 21,
            samples: 4,
        };
        panel.show_status(&stats.status_text());

        assert_eq!(panel.text.as_str(), "RSSI: -48 dBm\nPackets: 21");
        assert_eq!(panel.refreshes, 1);
        assert!(panel.refreshed_at.is_some());
    }
}
