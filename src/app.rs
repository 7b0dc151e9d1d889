//! Operator console application.
//!
//! [`OperatorApp`] owns all mutable console state and implements
//! [`eframe::App`]. Each frame it drains the two backend workers, steps the
//! launch countdown at 1 Hz, renders the panels against a fresh
//! [`PanelData`] bundle, and then consumes the requests the panels left
//! behind. All HTTP happens on the worker threads; the UI thread never
//! blocks.

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use eframe::egui;
use egui::RichText;
use egui_phosphor::regular::X;

use crate::backend::{self, Ack, BackendError, Command, CommandSender, Outcome, StreamFrame};
use crate::config::{OperatorConfig, PreferencesDoc, RunSettings};
use crate::controllers::{LaunchController, LaunchEffect};
use crate::data::channels::ChannelBank;
use crate::data::event::{ProgressEvent, Snapshot};
use crate::data::export;
use crate::data::live::LiveHistory;
use crate::data::notify::{Notice, NoticeKind, Notifier, Severity};
use crate::data::progress::RingSet;
use crate::data::reconcile::{ChannelReadout, ControlState, Reconciler};
use crate::data::session::SessionStore;
use crate::events::NotificationCenter;
use crate::panels::notify_ui::severity_badge;
use crate::panels::{
    ChartPanel, DeviceStatus, NotifyPanel, Panel, PanelData, PanelRequests, RunPanel,
    SettingsPanel,
};

/// Seconds a toast stays up before it times out. Timing out is not an
/// acknowledgment; an identical notice will be raised again.
const TOAST_SECS: f64 = 6.0;
/// Cap on the outstanding-notice list.
const MAX_NOTICES: usize = 200;

struct Toast {
    notice: Notice,
    raised: Instant,
}

// ─────────────────────────────────────────────────────────────────────────────
// OperatorApp
// ─────────────────────────────────────────────────────────────────────────────

/// Top-level console state plus the four panels.
pub struct OperatorApp {
    // Backend workers.
    commands: CommandSender,
    outcome_rx: Receiver<Outcome>,
    stream_rx: Receiver<StreamFrame>,

    // Stream-derived state.
    reconciler: Reconciler,
    bank: ChannelBank,
    rings: RingSet,
    snapshot: Snapshot,
    readout: Option<ChannelReadout>,
    controls: ControlState,
    device: DeviceStatus,
    stream_online: bool,
    seen_disconnect: bool,

    // Operator-side state.
    launch: LaunchController,
    settings: RunSettings,
    history: LiveHistory,
    notifier: Notifier,
    center: NotificationCenter,
    notices: Vec<Notice>,
    toasts: Vec<Toast>,
    requests: PanelRequests,
    pending_buzzer: Option<bool>,
    pending_online: Option<bool>,

    // Panels.
    run_panel: RunPanel,
    settings_panel: SettingsPanel,
    chart_panel: ChartPanel,
    notify_panel: NotifyPanel,

    last_tick: Instant,
}

impl OperatorApp {
    /// Spawn the backend workers and put the console into its pre-stream
    /// state. The stored preferences are requested right away.
    pub fn new(cfg: OperatorConfig) -> Self {
        let (commands, outcome_rx) = backend::spawn_command_worker(cfg.backend.clone());
        let (stream_tx, stream_rx) = std::sync::mpsc::channel();
        backend::spawn_event_stream(cfg.backend.clone(), stream_tx);

        let store = match &cfg.session_path {
            Some(path) => SessionStore::open(path),
            None => SessionStore::in_memory(),
        };

        let app = Self {
            commands,
            outcome_rx,
            stream_rx,
            reconciler: Reconciler::new(),
            bank: ChannelBank::new(),
            rings: RingSet::default(),
            snapshot: ProgressEvent::default().snapshot(None),
            readout: None,
            controls: ControlState::default(),
            device: DeviceStatus::default(),
            stream_online: false,
            seen_disconnect: false,
            launch: LaunchController::new(cfg.countdown_ticks),
            settings: RunSettings::default(),
            history: LiveHistory::new(cfg.chart_max_points, cfg.log_max_rows),
            notifier: Notifier::new(store),
            center: NotificationCenter::new(),
            notices: Vec::new(),
            toasts: Vec::new(),
            requests: PanelRequests::default(),
            pending_buzzer: None,
            pending_online: None,
            run_panel: RunPanel::default(),
            settings_panel: SettingsPanel::default(),
            chart_panel: ChartPanel::default(),
            notify_panel: NotifyPanel::default(),
            last_tick: Instant::now(),
        };
        app.commands.send(Command::LoadPrefs);
        app
    }

    /// Channel for out-of-process notice consumers (tests, headless tools).
    pub fn notification_center(&self) -> &NotificationCenter {
        &self.center
    }

    // ── Stream handling ──────────────────────────────────────────────────

    fn drain_stream(&mut self) {
        while let Ok(frame) = self.stream_rx.try_recv() {
            match frame {
                StreamFrame::Connected => {
                    if !self.stream_online {
                        // The backend may have restarted while we were away.
                        self.reconciler.reset();
                    }
                    self.stream_online = true;
                    if self.seen_disconnect {
                        self.raise(NoticeKind::Stream, "Event stream restored", Severity::Success);
                    }
                }
                StreamFrame::Disconnected => {
                    if self.stream_online {
                        self.raise(
                            NoticeKind::Stream,
                            "Event stream lost, reconnecting",
                            Severity::Error,
                        );
                    }
                    self.stream_online = false;
                    self.seen_disconnect = true;
                }
                StreamFrame::Event(event) => self.apply_event(event),
            }
        }
    }

    fn apply_event(&mut self, event: ProgressEvent) {
        // Piggybacked device state first; it rides on every kind of frame.
        if let Some(conn) = event.connection {
            let prev = self.device.analyzer_online;
            self.device.analyzer_online = Some(conn.online);
            if prev == Some(!conn.online) {
                if conn.online {
                    self.raise(NoticeKind::Device, "Analyzer connected", Severity::Info);
                } else {
                    self.raise(NoticeKind::Device, "Analyzer connection lost", Severity::Error);
                }
            }
        }
        if let Some(mounted) = event.usb_mounted {
            let prev = self.device.usb_mounted;
            self.device.usb_mounted = Some(mounted);
            if prev == Some(!mounted) {
                if mounted {
                    self.raise(NoticeKind::Device, "USB stick mounted", Severity::Info);
                } else {
                    self.raise(NoticeKind::Device, "USB stick removed", Severity::Warning);
                }
            }
        }
        if let Some(buzzer) = event.buzzer_enabled {
            self.device.buzzer_enabled = Some(buzzer);
        }
        if let Some(block) = &event.live_data {
            self.history.push(block);
        }

        let fx = self.reconciler.reconcile(&event, &mut self.bank);
        self.snapshot = fx.snapshot;
        self.rings = fx.rings;
        if let Some(controls) = fx.controls {
            self.controls = controls;
        }
        if let Some(readout) = fx.readout {
            self.readout = Some(readout);
        }
        if let Some(change) = fx.phase_change {
            log::debug!("phase changed to {}", change.to);
            self.launch.settle(change.to);
        }
        if let Some(summary) = fx.summary {
            self.raise(summary.kind(), summary.body(), summary.severity());
        }
    }

    // ── Command outcomes ─────────────────────────────────────────────────

    fn drain_outcomes(&mut self) {
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            match outcome {
                Outcome::Start(res) => self.on_start_outcome(res),
                Outcome::Abort(res) => {
                    if self.on_simple_ack("Abort", res) {
                        log::info!("abort accepted");
                    }
                }
                Outcome::Prefs(res) => self.on_prefs(res),
                Outcome::PrefsSaved(res) => {
                    if self.on_simple_ack("Saving preferences", res) {
                        log::info!("preferences saved");
                    }
                }
                Outcome::Buzzer(res) => {
                    let pending = self.pending_buzzer.take();
                    if self.on_simple_ack("Buzzer switch", res) {
                        if let Some(on) = pending {
                            self.device.buzzer_enabled = Some(on);
                        }
                    }
                }
                Outcome::OnlineMode(res) => {
                    let pending = self.pending_online.take();
                    if self.on_simple_ack("Online mode switch", res) {
                        if let Some(on) = pending {
                            self.device.online_mode = Some(on);
                        }
                    }
                }
            }
        }
    }

    fn on_start_outcome(&mut self, res: Result<Ack, BackendError>) {
        match res {
            Ok(ack) if ack.ok => {
                self.launch.acknowledge_start(true);
                let run = self.notifier.begin_run();
                log::info!("run {run} started");
            }
            Ok(ack) => {
                self.launch.acknowledge_start(false);
                let reason = ack.reason().unwrap_or("rejected").to_string();
                self.raise(
                    NoticeKind::CommandFailed,
                    format!("Start failed: {reason}"),
                    Severity::Error,
                );
            }
            Err(e) => {
                self.launch.acknowledge_start(false);
                self.raise(
                    NoticeKind::CommandFailed,
                    format!("Start failed: {e}"),
                    Severity::Error,
                );
            }
        }
    }

    /// Common ack handling; `true` means the backend said ok.
    fn on_simple_ack(&mut self, what: &str, res: Result<Ack, BackendError>) -> bool {
        match res {
            Ok(ack) if ack.ok => true,
            Ok(ack) => {
                let reason = ack.reason().unwrap_or("rejected").to_string();
                self.raise(
                    NoticeKind::CommandFailed,
                    format!("{what} failed: {reason}"),
                    Severity::Error,
                );
                false
            }
            Err(e) => {
                self.raise(
                    NoticeKind::CommandFailed,
                    format!("{what} failed: {e}"),
                    Severity::Error,
                );
                false
            }
        }
    }

    fn on_prefs(&mut self, res: Result<PreferencesDoc, BackendError>) {
        match res {
            Ok(doc) => {
                self.bank.set_mask(&doc.run.include_channels);
                self.settings = doc.run;
                // Missing flags read as the backend's off default, so the
                // switches become usable after the first load.
                self.device.buzzer_enabled = Some(doc.buzzer_enabled.unwrap_or(false));
                self.device.online_mode = Some(doc.online_mode.unwrap_or(false));
                log::info!("preferences loaded");
            }
            Err(e) => self.raise(
                NoticeKind::CommandFailed,
                format!("Loading preferences failed: {e}"),
                Severity::Warning,
            ),
        }
    }

    // ── Launch countdown ─────────────────────────────────────────────────

    fn tick_countdown(&mut self) {
        if self.last_tick.elapsed() < Duration::from_secs(1) {
            return;
        }
        self.last_tick = Instant::now();
        if let Some(LaunchEffect::IssueStart) = self.launch.tick() {
            self.send_start();
        }
    }

    fn send_start(&mut self) {
        self.settings.include_channels = self.bank.mask();
        let settings = self.settings.clone();
        log::info!(
            "issuing start: {}s per channel, {} repeats, {} channels",
            settings.measurement_duration,
            settings.repeat_count,
            self.bank.selected_count()
        );
        if !self.commands.send(Command::Start(settings)) {
            self.launch.acknowledge_start(false);
            self.raise(
                NoticeKind::CommandFailed,
                "Start failed: command worker is gone",
                Severity::Error,
            );
        }
    }

    // ── Notices ──────────────────────────────────────────────────────────

    /// Route a notice through the deduplicator. Occurrences replace an
    /// identical outstanding notice instead of piling up rows.
    fn raise(&mut self, kind: NoticeKind, body: impl Into<String>, severity: Severity) {
        let Some(notice) = self.notifier.notify(kind, body, severity) else {
            return;
        };
        match severity {
            Severity::Error => log::error!("{}", notice.body),
            Severity::Warning => log::warn!("{}", notice.body),
            _ => log::info!("{}", notice.body),
        }
        self.center.publish(&notice);

        let key = notice.key();
        self.notices.retain(|n| n.key() != key);
        self.toasts.retain(|t| t.notice.key() != key);
        self.toasts.push(Toast {
            notice: notice.clone(),
            raised: Instant::now(),
        });
        self.notices.push(notice);
        if self.notices.len() > MAX_NOTICES {
            self.notices.remove(0);
        }
    }

    /// The operator explicitly dismissed this notice.
    fn acknowledge_notice(&mut self, notice: &Notice) {
        self.notifier.acknowledge(notice);
        let key = notice.key();
        self.notices.retain(|n| n.key() != key);
        self.toasts.retain(|t| t.notice.key() != key);
    }

    fn render_toasts(&mut self, ctx: &egui::Context) {
        self.toasts
            .retain(|t| t.raised.elapsed().as_secs_f64() < TOAST_SECS);
        if self.toasts.is_empty() {
            return;
        }
        let mut acknowledged: Option<usize> = None;
        egui::Area::new(egui::Id::new("toast_overlay"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for (idx, toast) in self.toasts.iter().enumerate() {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let (icon, color) = severity_badge(toast.notice.severity);
                            ui.label(RichText::new(icon).color(color));
                            ui.label(&toast.notice.body);
                            if ui.small_button(X).clicked() {
                                acknowledged = Some(idx);
                            }
                        });
                    });
                }
            });
        if let Some(idx) = acknowledged {
            let notice = self.toasts.remove(idx).notice;
            self.acknowledge_notice(&notice);
        }
    }

    // ── Request consumption ──────────────────────────────────────────────

    fn consume_requests(&mut self) {
        let req = std::mem::take(&mut self.requests);

        if req.abort {
            log::info!("abort requested");
            self.commands.send(Command::Abort);
        }
        if req.load_prefs {
            self.commands.send(Command::LoadPrefs);
        }
        if req.save_prefs {
            self.settings.include_channels = self.bank.mask();
            let doc = PreferencesDoc {
                run: self.settings.clone(),
                buzzer_enabled: None,
                online_mode: None,
            };
            self.commands.send(Command::SavePrefs(doc));
        }
        if let Some(on) = req.set_buzzer {
            self.pending_buzzer = Some(on);
            self.commands.send(Command::SetBuzzer(on));
        }
        if let Some(on) = req.set_online {
            self.pending_online = Some(on);
            self.commands.send(Command::SetOnlineMode(on));
        }
        if let Some(path) = req.export {
            match export::write_live_csv(&self.history, &path) {
                Ok(()) => log::info!(
                    "exported {} rows to {}",
                    self.history.row_count(),
                    path.display()
                ),
                Err(e) => self.raise(
                    NoticeKind::CommandFailed,
                    format!("Export failed: {e}"),
                    Severity::Error,
                ),
            }
        }
        if let Some(idx) = req.dismiss {
            if let Some(notice) = self.notices.get(idx).cloned() {
                self.acknowledge_notice(&notice);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// eframe integration
// ─────────────────────────────────────────────────────────────────────────────

impl eframe::App for OperatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_stream();
        self.drain_outcomes();
        self.tick_countdown();

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("View", |ui| {
                    for panel in [
                        &mut self.settings_panel as &mut dyn Panel,
                        &mut self.chart_panel as &mut dyn Panel,
                        &mut self.notify_panel as &mut dyn Panel,
                    ] {
                        let state = panel.state_mut();
                        ui.checkbox(&mut state.visible, state.title);
                    }
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(RichText::new(format!("run {}", self.notifier.run_id())).weak());
                });
            });
        });

        let mut data = PanelData {
            snapshot: self.snapshot,
            controls: self.controls,
            readout: self.readout,
            rings: &self.rings,
            bank: &mut self.bank,
            launch: &mut self.launch,
            settings: &mut self.settings,
            history: &mut self.history,
            notices: &self.notices,
            device: self.device,
            stream_online: self.stream_online,
            requests: &mut self.requests,
        };

        let show_right = self.settings_panel.state().visible || self.notify_panel.state().visible;
        if show_right {
            egui::SidePanel::right("side_panel")
                .resizable(true)
                .default_width(300.0)
                .min_width(240.0)
                .show(ctx, |ui| {
                    egui::ScrollArea::vertical().show(ui, |ui| {
                        if self.settings_panel.state().visible {
                            self.settings_panel.show(ui, &mut data);
                        }
                        if self.notify_panel.state().visible {
                            ui.separator();
                            ui.strong(self.notify_panel.state().title);
                            self.notify_panel.show(ui, &mut data);
                        }
                    });
                });
        }

        if self.chart_panel.state().visible {
            egui::TopBottomPanel::bottom("chart_panel")
                .resizable(true)
                .default_height(220.0)
                .min_height(120.0)
                .show(ctx, |ui| {
                    self.chart_panel.show(ui, &mut data);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.run_panel.show(ui, &mut data);
            });
        });
        drop(data);

        self.consume_requests();
        self.render_toasts(ctx);

        // Keep the countdown and toast timers moving even without input.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Native entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Open the console in a native window. Blocks until the window closes.
pub fn run_operator(cfg: OperatorConfig) -> eframe::Result<()> {
    let title = cfg.title.clone();
    let app = OperatorApp::new(cfg);

    let mut opts = eframe::NativeOptions::default();
    opts.viewport = opts
        .viewport
        .clone()
        .with_inner_size(egui::vec2(1100.0, 760.0));

    eframe::run_native(
        &title,
        opts,
        Box::new(|cc| {
            // Install the Phosphor icon font before the first frame.
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}
