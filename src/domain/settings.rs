use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

/// Radio parameters and poll cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// BLE advertising channel to listen on (37, 38 or 39)
    #[serde(default = "default_channel")]
    pub channel: u8,
    /// PHY data rate selector passed to the radio
    #[serde(default = "default_rate")]
    pub rate: u8,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Begin scanning as soon as the application starts
    #[serde(default = "default_true")]
    pub auto_start: bool,
}

impl ScanSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            rate: default_rate(),
            poll_interval_ms: default_poll_interval_ms(),
            auto_start: default_true(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Window,
    Console,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub mode: DisplayMode,
    #[serde(default = "default_false")]
    pub dark_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioBackend {
    /// The host Bluetooth adapter
    Native,
    /// Generated samples, no hardware required
    Simulated,
}

impl Default for RadioBackend {
    fn default() -> Self {
        if cfg!(windows) {
            Self::Native
        } else {
            Self::Simulated
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioSettings {
    #[serde(default)]
    pub backend: RadioBackend,
    #[serde(default = "default_sim_seed")]
    pub simulated_seed: u64,
    #[serde(default = "default_sim_base_rssi")]
    pub simulated_base_rssi: i8,
    /// Report a hardware fault on this sample (1-based), for exercising recovery
    #[serde(default)]
    pub simulated_fault_at_sample: Option<u32>,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            backend: RadioBackend::default(),
            simulated_seed: default_sim_seed(),
            simulated_base_rssi: default_sim_base_rssi(),
            simulated_fault_at_sample: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "ble_packet_scanner".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}
fn default_channel() -> u8 {
    37
}
fn default_rate() -> u8 {
    1
}
fn default_poll_interval_ms() -> u64 {
    500
}
fn default_sim_seed() -> u64 {
    0x5eed
}
fn default_sim_base_rssi() -> i8 {
    -60
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub radio: RadioSettings,
    #[serde(default)]
    pub display: DisplaySettings,
    #[serde(default)]
    pub log_settings: LogSettings,
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::with_path(settings_path))
    }

    /// Load settings from `settings_path`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn with_path(settings_path: PathBuf) -> Self {
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();
        Self {
            settings,
            settings_path,
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("BlePacketScanner");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.scan.channel, 37);
        assert_eq!(settings.scan.rate, 1);
        assert_eq!(settings.scan.poll_interval(), Duration::from_millis(500));
        assert!(settings.scan.auto_start);
        assert_eq!(settings.display.mode, DisplayMode::Window);
        assert_eq!(settings.log_settings.level, "info");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let json = r#"{ "scan": { "poll_interval_ms": 100 }, "display": { "mode": "console" } }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.scan.poll_interval_ms, 100);
        assert_eq!(settings.scan.channel, 37);
        assert_eq!(settings.display.mode, DisplayMode::Console);
        assert!(!settings.display.dark_mode);
    }

    #[test]
    fn test_backend_names() {
        let radio: RadioSettings = serde_json::from_str(r#"{ "backend": "simulated" }"#).unwrap();
        assert_eq!(radio.backend, RadioBackend::Simulated);
        assert_eq!(radio.simulated_base_rssi, -60);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = std::env::temp_dir().join(format!("ble_scanner_settings_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");

        let mut service = SettingsService::with_path(path.clone());
        service.get_mut().scan.poll_interval_ms = 250;
        service.get_mut().display.mode = DisplayMode::Console;
        service.save().unwrap();

        let reloaded = SettingsService::with_path(path);
        assert_eq!(reloaded.get().scan.poll_interval_ms, 250);
        assert_eq!(reloaded.get().display.mode, DisplayMode::Console);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("ble_scanner_corrupt_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        fs::write(&path, "not json").unwrap();

        let service = SettingsService::with_path(path);
        assert_eq!(service.get().scan.channel, 37);

        let _ = fs::remove_dir_all(dir);
    }
}
