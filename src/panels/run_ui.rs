//! Central run panel: status header, progress rings, channel grid and the
//! start/abort controls.
//!
//! The panel never mutates run state directly. Button presses go through
//! the [`LaunchController`](crate::controllers::LaunchController) or the
//! request fields on [`PanelData`], and the grid only calls the lock-gated
//! [`ChannelBank`](crate::data::channels::ChannelBank) methods.

use egui::{vec2, Align, Align2, Color32, FontId, Layout, RichText, Sense, Stroke, Ui, Vec2};
use egui_phosphor::regular::{PLAY, PLUGS, PLUGS_CONNECTED, STOP, USB, WARNING, X};

use super::panel_trait::{Panel, PanelData, PanelState};
use crate::controllers::LaunchState;
use crate::data::channels::{ChannelVisual, CHANNEL_COUNT};
use crate::data::phase::Phase;
use crate::data::progress::{Quartile, Ring};

/// Channel tile and status colours.
const SAMPLING_GREEN: Color32 = Color32::from_rgb(0x2e, 0xcc, 0x71);
const PAUSED_AMBER: Color32 = Color32::from_rgb(0xf3, 0x9c, 0x12);
const SAMPLED_BLUE: Color32 = Color32::from_rgb(0x34, 0x98, 0xdb);
const ABORT_RED: Color32 = Color32::from_rgb(0xe7, 0x4c, 0x3c);

const GRID_COLUMNS: usize = 8;
const RING_SIZE: f32 = 76.0;
const RING_STROKE: f32 = 5.0;

pub struct RunPanel {
    state: PanelState,
    /// First abort click arms this; the second one sends the command.
    confirm_abort: bool,
}

impl Default for RunPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Run"),
            confirm_abort: false,
        }
    }
}

impl Panel for RunPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn show(&mut self, ui: &mut Ui, data: &mut PanelData) {
        self.render_header(ui, data);
        ui.separator();
        ui.columns(3, |cols| {
            ring_widget(&mut cols[0], &data.rings.repeat, "Repeat");
            ring_widget(&mut cols[1], &data.rings.cycle, "Cycle");
            ring_widget(&mut cols[2], &data.rings.overall, "Overall");
        });
        ui.separator();
        self.render_grid(ui, data);
        ui.separator();
        self.render_launch(ui, data);
    }
}

impl RunPanel {
    fn render_header(&self, ui: &mut Ui, data: &PanelData) {
        ui.horizontal(|ui| {
            let (color, label) = if data.stream_online {
                (SAMPLING_GREEN, "live")
            } else {
                (ABORT_RED, "offline")
            };
            ui.label(RichText::new("●").color(color));
            ui.label(RichText::new(label).weak());
            ui.separator();
            ui.label(RichText::new(headline(data)).heading());

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if let Some(mounted) = data.device.usb_mounted {
                    let icon = if mounted {
                        RichText::new(USB)
                    } else {
                        RichText::new(USB).weak().strikethrough()
                    };
                    ui.label(icon).on_hover_text(if mounted {
                        "USB stick mounted"
                    } else {
                        "no USB stick"
                    });
                }
                if let Some(online) = data.device.analyzer_online {
                    let icon = if online {
                        RichText::new(PLUGS_CONNECTED)
                    } else {
                        RichText::new(PLUGS).color(ABORT_RED)
                    };
                    ui.label(icon).on_hover_text(if online {
                        "analyzer connected"
                    } else {
                        "analyzer offline"
                    });
                }
            });
        });

        let s = &data.snapshot;
        if s.phase.is_active() {
            ui.horizontal(|ui| {
                ui.label(RichText::new(format!("{} elapsed", fmt_hms(s.elapsed_seconds))).weak());
                ui.separator();
                ui.label(RichText::new(format!("{} left", fmt_hms(s.tt_seconds))).weak());
                ui.separator();
                ui.label(RichText::new(format!("{}/{} steps", s.step_index, s.total_steps)).weak());
                if s.phase == Phase::Measuring {
                    ui.separator();
                    ui.label(RichText::new(format!("step {:.0}%", s.percent)).weak());
                }
            });
        }
    }

    fn render_grid(&self, ui: &mut Ui, data: &mut PanelData) {
        let locked = data.controls.selection_locked;
        egui::Grid::new("channel_grid")
            .spacing(vec2(4.0, 4.0))
            .show(ui, |ui| {
                for idx in 0..CHANNEL_COUNT {
                    channel_tile(ui, data, idx, locked);
                    if (idx + 1) % GRID_COLUMNS == 0 {
                        ui.end_row();
                    }
                }
            });

        ui.horizontal(|ui| {
            ui.add_enabled_ui(!locked, |ui| {
                if ui.button("All").clicked() {
                    data.bank.set_all(true);
                }
                if ui.button("None").clicked() {
                    data.bank.set_all(false);
                }
                if ui.button("Invert").clicked() {
                    data.bank.invert();
                }
            });
            ui.label(
                RichText::new(format!(
                    "{} of {} selected",
                    data.bank.selected_count(),
                    CHANNEL_COUNT
                ))
                .weak(),
            );
        });
    }

    fn render_launch(&mut self, ui: &mut Ui, data: &mut PanelData) {
        ui.horizontal(|ui| {
            let (text, enabled) = match data.launch.state() {
                LaunchState::Idle => (
                    format!("{PLAY} Start"),
                    data.controls.start_enabled && data.bank.selected_count() > 0,
                ),
                LaunchState::Counting { remaining } => (format!("{X} Cancel ({remaining})"), true),
                LaunchState::Requested => ("Starting…".to_string(), false),
            };
            let start = egui::Button::new(RichText::new(text).strong()).min_size(vec2(140.0, 32.0));
            if ui.add_enabled(enabled, start).clicked() {
                data.launch.press();
            }

            let abort_enabled = data.controls.abort_enabled;
            if !abort_enabled {
                self.confirm_abort = false;
            }
            let abort_text = if self.confirm_abort {
                format!("{WARNING} Really abort?")
            } else {
                format!("{STOP} Abort")
            };
            let abort = egui::Button::new(RichText::new(abort_text).color(Color32::WHITE))
                .fill(ABORT_RED)
                .min_size(vec2(140.0, 32.0));
            if ui.add_enabled(abort_enabled, abort).clicked() {
                if self.confirm_abort {
                    data.requests.abort = true;
                    self.confirm_abort = false;
                } else {
                    self.confirm_abort = true;
                }
            }
        });
    }
}

fn channel_tile(ui: &mut Ui, data: &mut PanelData, idx: usize, locked: bool) {
    let selected = data.bank.is_selected(idx);
    let visual = data.bank.visual(idx);
    let fill = match (selected, visual) {
        (false, _) => ui.visuals().faint_bg_color,
        (true, ChannelVisual::Idle) => ui.visuals().widgets.inactive.bg_fill,
        (true, ChannelVisual::Sampling) => SAMPLING_GREEN,
        (true, ChannelVisual::Paused) => PAUSED_AMBER,
        (true, ChannelVisual::Sampled) => SAMPLED_BLUE,
    };
    let text = RichText::new(format!("{:>2}", idx + 1)).monospace();
    let text = if selected { text } else { text.weak() };
    let mut button = egui::Button::new(text).min_size(vec2(36.0, 28.0)).fill(fill);
    if selected {
        button = button.stroke(Stroke::new(1.0, ui.visuals().selection.stroke.color));
    }
    let hover = if locked {
        "selection locked while a run is active".to_string()
    } else if selected {
        format!("channel {} selected, click to exclude", idx + 1)
    } else {
        format!("channel {} excluded, click to select", idx + 1)
    };
    if ui.add(button).on_hover_text(hover).clicked() {
        data.bank.toggle(idx);
    }
}

/// Painted circular gauge with the stepped quartile fill.
fn ring_widget(ui: &mut Ui, ring: &Ring, title: &str) {
    ui.vertical_centered(|ui| {
        let (rect, _) = ui.allocate_exact_size(Vec2::splat(RING_SIZE), Sense::hover());
        let painter = ui.painter();
        let center = rect.center();
        let radius = rect.height() * 0.5 - RING_STROKE;

        painter.circle_stroke(center, radius, Stroke::new(RING_STROKE, ui.visuals().faint_bg_color));

        if ring.percent > 0.0 {
            let sweep = quartile_sweep(ring.quartile);
            let start = -std::f32::consts::FRAC_PI_2;
            let segments = 48;
            let points: Vec<egui::Pos2> = (0..=segments)
                .map(|i| {
                    let angle =
                        start + sweep * std::f32::consts::TAU * i as f32 / segments as f32;
                    center + radius * egui::vec2(angle.cos(), angle.sin())
                })
                .collect();
            painter.add(egui::Shape::line(
                points,
                Stroke::new(RING_STROKE, ui.visuals().selection.bg_fill),
            ));
        }

        painter.text(
            center,
            Align2::CENTER_CENTER,
            &ring.label,
            FontId::proportional(15.0),
            ui.visuals().strong_text_color(),
        );
        ui.label(RichText::new(title).small());
    });
}

/// Arc fraction for a quartile bucket: the ring fills in four steps.
fn quartile_sweep(q: Quartile) -> f32 {
    match q {
        Quartile::Q1 => 0.25,
        Quartile::Q2 => 0.5,
        Quartile::Q3 => 0.75,
        Quartile::Q4 => 1.0,
    }
}

fn headline(data: &PanelData) -> String {
    match data.readout {
        Some(r) => match r.phase {
            Phase::Measuring => format!("Sampling channel {}", r.channel),
            Phase::Paused => format!("Paused on channel {}", r.channel),
            Phase::Switching => format!("Switching to channel {}", r.next_channel),
            Phase::Homing => "Homing valve".to_string(),
            Phase::Aborted => "Run aborted".to_string(),
            Phase::Idle => "Idle".to_string(),
        },
        None => "Waiting for the backend".to_string(),
    }
}

/// `H:MM:SS`, or `M:SS` under an hour.
fn fmt_hms(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}
