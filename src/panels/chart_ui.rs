//! Live gas-concentration chart.
//!
//! One line per component, fed from [`LiveHistory`]. The device may attach
//! a preferred colour to each component; components without one draw from
//! a fixed fallback palette by first-seen index, so colours stay stable
//! across frames and runs.
//!
//! [`LiveHistory`]: crate::data::live::LiveHistory

use egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot};
use once_cell::sync::Lazy;

use super::panel_trait::{Panel, PanelData, PanelState};

/// Fallback trace palette for components without a device colour.
static PALETTE: Lazy<Vec<Color32>> = Lazy::new(|| {
    [
        "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#9c755f",
    ]
    .iter()
    .filter_map(|hex| parse_hex_color(hex))
    .collect()
});

pub struct ChartPanel {
    state: PanelState,
}

impl Default for ChartPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Live data"),
        }
    }
}

impl Panel for ChartPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn show(&mut self, ui: &mut Ui, data: &mut PanelData) {
        if data.history.series().is_empty() {
            ui.label(RichText::new("no live data yet").weak());
            return;
        }

        ui.horizontal_wrapped(|ui| {
            for (idx, series) in data.history.series_mut().iter_mut().enumerate() {
                let color = series_color(series.color.as_deref(), idx);
                let label = match &series.cas {
                    Some(cas) => format!("{} ({cas})", series.label),
                    None => series.label.clone(),
                };
                ui.checkbox(&mut series.visible, RichText::new(label).color(color));
            }
        });

        Plot::new("live_gas_plot")
            .legend(Legend::default())
            .x_axis_formatter(|mark, _range| fmt_time_axis(mark.value))
            .show(ui, |plot_ui| {
                for (idx, series) in data.history.series().iter().enumerate() {
                    if !series.visible || series.points.is_empty() {
                        continue;
                    }
                    let pts: Vec<[f64; 2]> = series.points.iter().copied().collect();
                    let color = series_color(series.color.as_deref(), idx);
                    plot_ui.line(Line::new(&series.label, pts).color(color).width(1.5));
                }
            });
    }
}

fn series_color(device_color: Option<&str>, idx: usize) -> Color32 {
    device_color
        .and_then(parse_hex_color)
        .unwrap_or_else(|| PALETTE[idx % PALETTE.len()])
}

/// Parse `#rrggbb` (case-insensitive). Anything else yields `None`.
fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color32::from_rgb(r, g, b))
}

/// Seconds-since-epoch tick rendered as local wall-clock time.
fn fmt_time_axis(secs: f64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_default()
}
