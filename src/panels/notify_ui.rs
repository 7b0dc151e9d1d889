//! Notification history with per-notice dismissal.
//!
//! Dismissing here is what feeds the deduplicator: a dismissed notice stays
//! suppressed for the rest of the run, while one that merely scrolled by
//! will be raised again.

use egui::{Align, Color32, Layout, RichText, Ui};
use egui_phosphor::regular::{CHECK_CIRCLE, INFO, WARNING_CIRCLE, X, X_CIRCLE};

use super::panel_trait::{Panel, PanelData, PanelState};
use crate::data::notify::Severity;

pub struct NotifyPanel {
    state: PanelState,
}

impl Default for NotifyPanel {
    fn default() -> Self {
        Self {
            state: PanelState::new("Notifications"),
        }
    }
}

impl Panel for NotifyPanel {
    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    fn show(&mut self, ui: &mut Ui, data: &mut PanelData) {
        if data.notices.is_empty() {
            ui.label(RichText::new("nothing to report").weak());
            return;
        }
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                // Newest on top.
                for (idx, notice) in data.notices.iter().enumerate().rev() {
                    ui.horizontal(|ui| {
                        let (icon, color) = severity_badge(notice.severity);
                        ui.label(RichText::new(icon).color(color));
                        ui.label(
                            RichText::new(notice.at.format("%H:%M:%S").to_string())
                                .weak()
                                .small(),
                        );
                        ui.label(&notice.body);
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui
                                .small_button(X)
                                .on_hover_text("dismiss; an identical notice stays quiet this run")
                                .clicked()
                            {
                                data.requests.dismiss = Some(idx);
                            }
                        });
                    });
                }
            });
    }
}

pub(crate) fn severity_badge(severity: Severity) -> (&'static str, Color32) {
    match severity {
        Severity::Info => (INFO, Color32::from_rgb(0x34, 0x98, 0xdb)),
        Severity::Success => (CHECK_CIRCLE, Color32::from_rgb(0x2e, 0xcc, 0x71)),
        Severity::Warning => (WARNING_CIRCLE, Color32::from_rgb(0xf3, 0x9c, 0x12)),
        Severity::Error => (X_CIRCLE, Color32::from_rgb(0xe7, 0x4c, 0x3c)),
    }
}
