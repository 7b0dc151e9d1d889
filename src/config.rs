//! Configuration types for the operator console.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::channels::CHANNEL_COUNT;

// ─────────────────────────────────────────────────────────────────────────────
// Run settings
// ─────────────────────────────────────────────────────────────────────────────

/// Parameters of a measurement run.
///
/// Field names match the backend's preference keys, so the same struct
/// round-trips through the start command and the preferences endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Seconds to sample each channel.
    pub measurement_duration: u32,
    /// Seconds to wait between channels.
    pub pause_seconds: u32,
    /// Number of passes over the selected channels.
    pub repeat_count: u32,
    /// Selection mask, one flag per channel.
    pub include_channels: Vec<bool>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            measurement_duration: 100,
            pause_seconds: 5,
            repeat_count: 1,
            include_channels: vec![true; CHANNEL_COUNT],
        }
    }
}

/// Merged preferences document served by the backend.
///
/// Extra keys the backend may carry are ignored on read and not written
/// back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesDoc {
    #[serde(flatten)]
    pub run: RunSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buzzer_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub online_mode: Option<bool>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend connection
// ─────────────────────────────────────────────────────────────────────────────

/// Where the backend lives and how patiently to talk to it.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL without a trailing slash, e.g. `http://127.0.0.1:5000`.
    pub base_url: String,
    /// Timeout for command requests, seconds.
    pub request_timeout_secs: u64,
    /// Delay before the event stream reconnects after a failure, seconds.
    pub reconnect_delay_secs: u64,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            ..Self::default()
        }
    }

    /// Join a path onto the base URL.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            request_timeout_secs: 10,
            reconnect_delay_secs: 3,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// OperatorConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level configuration for the operator console.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Native window title.
    pub title: String,
    /// Backend connection settings.
    pub backend: BackendConfig,
    /// Ticks of the start countdown at 1 Hz.
    pub countdown_ticks: u32,
    /// Path for the session store; `None` keeps it in memory.
    pub session_path: Option<PathBuf>,
    /// Points retained per component series in the chart.
    pub chart_max_points: usize,
    /// Rows retained for the CSV export log.
    pub log_max_rows: usize,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            title: "Sampler Console".to_string(),
            backend: BackendConfig::default(),
            countdown_ticks: 5,
            session_path: None,
            chart_max_points: 10_000,
            log_max_rows: 50_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_settings_defaults() {
        let settings = RunSettings::default();
        assert_eq!(settings.measurement_duration, 100);
        assert_eq!(settings.pause_seconds, 5);
        assert_eq!(settings.repeat_count, 1);
        assert_eq!(settings.include_channels.len(), CHANNEL_COUNT);
        assert!(settings.include_channels.iter().all(|sel| *sel));
    }

    #[test]
    fn preferences_doc_flattens_run_settings() {
        let json = r#"{
            "measurement_duration": 60,
            "pause_seconds": 2,
            "repeat_count": 3,
            "include_channels": [true, false, true],
            "buzzer_enabled": true,
            "chart_update_interval": 500
        }"#;
        let doc: PreferencesDoc = serde_json::from_str(json).unwrap();
        assert_eq!(doc.run.measurement_duration, 60);
        assert_eq!(doc.run.repeat_count, 3);
        assert_eq!(doc.run.include_channels, vec![true, false, true]);
        assert_eq!(doc.buzzer_enabled, Some(true));
        assert_eq!(doc.online_mode, None);
    }

    #[test]
    fn preferences_doc_tolerates_missing_fields() {
        let doc: PreferencesDoc = serde_json::from_str("{}").unwrap();
        assert_eq!(doc.run, RunSettings::default());
    }

    #[test]
    fn preferences_doc_serializes_flat() {
        let doc = PreferencesDoc {
            run: RunSettings::default(),
            buzzer_enabled: Some(false),
            online_mode: None,
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("measurement_duration").is_some());
        assert!(value.get("run").is_none(), "run settings must flatten");
        assert!(value.get("online_mode").is_none(), "unset flags stay out");
        assert_eq!(value["buzzer_enabled"], serde_json::json!(false));
    }

    #[test]
    fn backend_url_join() {
        let cfg = BackendConfig::new("http://10.0.0.2:5000/");
        assert_eq!(
            cfg.url("/gasera/api/measurement/start"),
            "http://10.0.0.2:5000/gasera/api/measurement/start"
        );
    }

    #[test]
    fn operator_defaults() {
        let cfg = OperatorConfig::default();
        assert_eq!(cfg.countdown_ticks, 5);
        assert!(cfg.session_path.is_none());
    }
}
