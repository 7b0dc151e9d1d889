//! Pure state modules. Everything here is UI-free and directly testable:
//! the reconciliation engine, the channel bank, the ring projection, the
//! notification gatekeeper and the stores they persist to.

pub mod channels;
pub mod event;
pub mod export;
pub mod live;
pub mod notify;
pub mod phase;
pub mod progress;
pub mod reconcile;
pub mod session;
