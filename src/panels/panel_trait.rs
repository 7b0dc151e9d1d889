//! Panel trait and the per-frame data bundle the panels work on.

use std::path::PathBuf;

use egui::Ui;

use crate::config::RunSettings;
use crate::controllers::LaunchController;
use crate::data::channels::ChannelBank;
use crate::data::event::Snapshot;
use crate::data::live::LiveHistory;
use crate::data::notify::Notice;
use crate::data::progress::RingSet;
use crate::data::reconcile::{ChannelReadout, ControlState};

/// Slow-moving device state gathered from the stream's piggyback blocks.
///
/// `None` means the backend has not reported that item yet this session.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceStatus {
    /// Analyzer connection.
    pub analyzer_online: Option<bool>,
    /// USB logging stick mounted.
    pub usb_mounted: Option<bool>,
    /// End-of-run buzzer switch.
    pub buzzer_enabled: Option<bool>,
    /// Analyzer online mode, as last loaded from preferences.
    pub online_mode: Option<bool>,
}

/// Actions the panels asked for this frame.
///
/// Panels only set fields here; the app drains the whole struct after
/// rendering and carries the actions out.
#[derive(Debug, Default)]
pub struct PanelRequests {
    pub abort: bool,
    pub save_prefs: bool,
    pub load_prefs: bool,
    pub set_buzzer: Option<bool>,
    pub set_online: Option<bool>,
    /// Write the live-data log to this path.
    pub export: Option<PathBuf>,
    /// Index into the notice list the operator dismissed.
    pub dismiss: Option<usize>,
}

/// Everything the panels read and poke during one frame.
///
/// Mutable borrows go straight to the owning state; requests for
/// app-level actions go through [`PanelRequests`].
pub struct PanelData<'a> {
    /// Latest fully-defaulted stream snapshot.
    pub snapshot: Snapshot,
    /// Button/lock states derived from the phase.
    pub controls: ControlState,
    /// Header readout (1-based channel numbers), once a readout exists.
    pub readout: Option<ChannelReadout>,
    pub rings: &'a RingSet,
    pub bank: &'a mut ChannelBank,
    pub launch: &'a mut LaunchController,
    pub settings: &'a mut RunSettings,
    pub history: &'a mut LiveHistory,
    /// Notice history, newest last.
    pub notices: &'a [Notice],
    pub device: DeviceStatus,
    /// Event stream currently connected.
    pub stream_online: bool,
    pub requests: &'a mut PanelRequests,
}

/// Identity and visibility of a panel.
#[derive(Debug, Clone, Copy)]
pub struct PanelState {
    pub title: &'static str,
    pub visible: bool,
}

impl PanelState {
    pub fn new(title: &'static str) -> Self {
        Self {
            title,
            visible: true,
        }
    }
}

pub trait Panel {
    fn state(&self) -> &PanelState;
    fn state_mut(&mut self) -> &mut PanelState;

    /// Render the panel body.
    fn show(&mut self, ui: &mut Ui, data: &mut PanelData);
}
