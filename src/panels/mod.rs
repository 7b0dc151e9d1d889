pub mod chart_ui;
pub mod notify_ui;
pub mod panel_trait;
pub mod run_ui;
pub mod settings_ui;

pub use chart_ui::ChartPanel;
pub use notify_ui::NotifyPanel;
pub use panel_trait::{DeviceStatus, Panel, PanelData, PanelRequests, PanelState};
pub use run_ui::RunPanel;
pub use settings_ui::SettingsPanel;
