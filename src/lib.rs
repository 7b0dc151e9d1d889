//! muxpanel crate root: re-exports and module wiring.
//!
//! Operator console for a multiplexed gas-analyzer sampler. The crate
//! splits into a UI-free core and an egui/eframe front end:
//! - `data`: phases, wire events, reconciliation, progress rings,
//!   notices, session store and the live-sample history
//! - `sse`: incremental server-sent-events decoder
//! - `backend`: HTTP command worker and event-stream worker
//! - `config`: run settings, preferences and connection settings
//! - `controllers`: the start-countdown state machine
//! - `events`: broadcast channel for notices
//! - `panels` / `app` (feature `ui`): the eframe application
//!
//! The core builds without the `ui` feature; that is what headless tools
//! and the integration tests use.

pub mod backend;
pub mod config;
pub mod controllers;
pub mod data;
pub mod events;
pub mod sse;

#[cfg(feature = "ui")]
pub mod app;
#[cfg(feature = "ui")]
pub mod panels;

// Public re-exports for a compact external API
pub use config::{BackendConfig, OperatorConfig, PreferencesDoc, RunSettings};
pub use controllers::{LaunchController, LaunchEffect, LaunchState};
pub use data::channels::{ChannelBank, ChannelVisual, CHANNEL_COUNT};
pub use data::event::{decode, ProgressEvent, Snapshot};
pub use data::live::LiveHistory;
pub use data::notify::{Notice, NoticeKind, Notifier, Severity};
pub use data::phase::Phase;
pub use data::progress::{project, Quartile, Ring, RingSet};
pub use data::reconcile::{Reconciler, SideEffects};
pub use data::session::SessionStore;
pub use events::NotificationCenter;
pub use sse::SseDecoder;

#[cfg(feature = "ui")]
pub use app::{run_operator, OperatorApp};
