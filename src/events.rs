//! Notice fan-out to embedding code.
//!
//! The console surfaces notices in its own toast layer; embedding code can
//! additionally subscribe here and receive every *presented* notice on an
//! mpsc channel, optionally filtered by severity. Suppressed duplicates
//! (see [`Notifier`](crate::data::notify::Notifier)) never reach
//! subscribers.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::data::notify::{Notice, Severity};

struct Subscriber {
    min_severity: Severity,
    sender: Sender<Notice>,
}

/// Clonable handle distributing presented notices.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Vec<Subscriber>>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Receive every presented notice.
    pub fn subscribe(&self) -> Receiver<Notice> {
        self.subscribe_min(Severity::Info)
    }

    /// Receive notices at or above the given severity.
    pub fn subscribe_min(&self, min_severity: Severity) -> Receiver<Notice> {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut subscribers = self.inner.lock().unwrap();
        subscribers.push(Subscriber {
            min_severity,
            sender: tx,
        });
        rx
    }

    /// Deliver a notice to all matching subscribers, pruning dead ones.
    pub fn publish(&self, notice: &Notice) {
        let mut subscribers = self.inner.lock().unwrap();
        subscribers.retain(|sub| {
            if notice.severity >= sub.min_severity {
                sub.sender.send(notice.clone()).is_ok()
            } else {
                true
            }
        });
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}
