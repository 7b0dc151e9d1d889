//! Run parameters, device switches and preference persistence.

use egui::{vec2, RichText, Ui};
use egui_phosphor::regular::{
    ARROW_CLOCKWISE, BELL, BELL_SLASH, BROOM, DOWNLOAD_SIMPLE, FLOPPY_DISK, WIFI_HIGH, WIFI_SLASH,
};

use super::panel_trait::{Panel, PanelData, PanelState};

pub struct SettingsPanel {
    state: PanelState,
}

impl Default for SettingsPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Settings"),
        }
    }
}

impl Panel for SettingsPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn show(&mut self, ui: &mut Ui, data: &mut PanelData) {
        let locked = data.controls.selection_locked;

        ui.strong("Run parameters");
        ui.add_enabled_ui(!locked, |ui| {
            egui::Grid::new("run_settings")
                .num_columns(2)
                .spacing(vec2(8.0, 6.0))
                .show(ui, |ui| {
                    ui.label("Sample duration");
                    ui.add(
                        egui::DragValue::new(&mut data.settings.measurement_duration)
                            .range(1..=36_000)
                            .suffix(" s"),
                    );
                    ui.end_row();

                    ui.label("Pause between channels");
                    ui.add(
                        egui::DragValue::new(&mut data.settings.pause_seconds)
                            .range(0..=3_600)
                            .suffix(" s"),
                    );
                    ui.end_row();

                    ui.label("Repeats");
                    ui.add(egui::DragValue::new(&mut data.settings.repeat_count).range(1..=999));
                    ui.end_row();
                });
        });
        if locked {
            ui.label(RichText::new("locked while a run is active").weak().small());
        }

        ui.separator();
        ui.strong("Device");
        ui.horizontal(|ui| {
            let known = data.device.buzzer_enabled.is_some();
            let mut on = data.device.buzzer_enabled.unwrap_or(false);
            ui.label(if on { BELL } else { BELL_SLASH });
            ui.add_enabled_ui(known, |ui| {
                if ui.checkbox(&mut on, "End-of-run buzzer").changed() {
                    data.requests.set_buzzer = Some(on);
                }
            });
            if !known {
                ui.label(RichText::new("waiting for the backend").weak().small());
            }
        });
        ui.horizontal(|ui| {
            let known = data.device.online_mode.is_some();
            let mut on = data.device.online_mode.unwrap_or(false);
            ui.label(if on { WIFI_HIGH } else { WIFI_SLASH });
            ui.add_enabled_ui(known, |ui| {
                if ui.checkbox(&mut on, "Analyzer online mode").changed() {
                    data.requests.set_online = Some(on);
                }
            });
            if !known {
                ui.label(RichText::new("waiting for the backend").weak().small());
            }
        });

        ui.separator();
        ui.strong("Preferences");
        ui.horizontal(|ui| {
            if ui
                .button(format!("{ARROW_CLOCKWISE} Reload"))
                .on_hover_text("fetch the stored settings from the backend")
                .clicked()
            {
                data.requests.load_prefs = true;
            }
            if ui
                .button(format!("{FLOPPY_DISK} Save"))
                .on_hover_text("store the current settings on the backend")
                .clicked()
            {
                data.requests.save_prefs = true;
            }
        });

        ui.separator();
        ui.strong("Live data log");
        ui.label(RichText::new(format!("{} rows", data.history.row_count())).weak());
        ui.horizontal(|ui| {
            let has_rows = !data.history.is_empty();
            if ui
                .add_enabled(
                    has_rows,
                    egui::Button::new(format!("{DOWNLOAD_SIMPLE} Export CSV")),
                )
                .clicked()
            {
                if let Some(path) = rfd::FileDialog::new()
                    .set_file_name(default_export_name())
                    .add_filter("CSV", &["csv"])
                    .save_file()
                {
                    data.requests.export = Some(path);
                }
            }
            if ui
                .add_enabled(has_rows, egui::Button::new(format!("{BROOM} Clear")))
                .clicked()
            {
                data.history.clear();
            }
        });
    }
}

fn default_export_name() -> String {
    format!("gas_log_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_name_is_timestamped() {
        let name = default_export_name();
        assert!(name.starts_with("gas_log_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "gas_log_20260301_100000.csv".len());
    }
}
