//! Run-scoped notifications with acknowledgment-based deduplication.
//!
//! Re-raising is the default here: a notice is suppressed only once the
//! operator has *acknowledged* an identical one for the same run. Merely
//! having shown it before is not enough — a toast that timed out unseen
//! will come back on the next occurrence. Acknowledgments live in the
//! session store keyed by `run:kind:body`, so starting a new run makes all
//! old keys irrelevant without any cleanup pass.

use chrono::{DateTime, Local};

use crate::data::session::SessionStore;

/// Importance of a notice; drives toast colour and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Category of a notice. Part of its deduplication identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// A run finished all its steps.
    RunComplete,
    /// A run was aborted by the operator.
    RunAborted,
    /// A command to the backend failed.
    CommandFailed,
    /// Event-stream connectivity changed.
    Stream,
    /// Device status worth pointing out (USB, analyzer connection).
    Device,
}

impl NoticeKind {
    /// Stable name used in deduplication keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeKind::RunComplete => "run-complete",
            NoticeKind::RunAborted => "run-aborted",
            NoticeKind::CommandFailed => "command-failed",
            NoticeKind::Stream => "stream",
            NoticeKind::Device => "device",
        }
    }
}

/// A notice presented to the operator.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Run the notice belongs to (0 = before any run this session).
    pub run_id: u64,
    pub kind: NoticeKind,
    pub body: String,
    pub severity: Severity,
    pub at: DateTime<Local>,
}

impl Notice {
    /// Deduplication key. Identical notices for the same run share one key;
    /// the same message in a later run gets a fresh one.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.run_id, self.kind.as_str(), self.body)
    }
}

/// Gatekeeper for operator notices.
///
/// Owns the [`SessionStore`] so the run counter and the dismissal records
/// stay in one place.
#[derive(Debug)]
pub struct Notifier {
    store: SessionStore,
}

impl Notifier {
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Current run id.
    pub fn run_id(&self) -> u64 {
        self.store.run_id()
    }

    /// Bump the run id after the backend acknowledged a start command.
    pub fn begin_run(&mut self) -> u64 {
        self.store.begin_run()
    }

    /// Build a notice for the current run, unless an identical one was
    /// already acknowledged. `None` means: stay quiet.
    pub fn notify(
        &self,
        kind: NoticeKind,
        body: impl Into<String>,
        severity: Severity,
    ) -> Option<Notice> {
        let notice = Notice {
            run_id: self.store.run_id(),
            kind,
            body: body.into(),
            severity,
            at: Local::now(),
        };
        if self.store.is_dismissed(&notice.key()) {
            return None;
        }
        Some(notice)
    }

    /// Record the operator dismissing a notice. Future identical notices
    /// for this run stay suppressed.
    pub fn acknowledge(&mut self, notice: &Notice) {
        if let Err(e) = self.store.set_dismissed(&notice.key()) {
            log::warn!("failed to persist dismissal: {e}");
        }
    }

    /// Read access to the backing store.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> Notifier {
        Notifier::new(SessionStore::in_memory())
    }

    #[test]
    fn notice_reraised_until_acknowledged() {
        let n = notifier();
        assert!(n
            .notify(NoticeKind::Device, "USB removed", Severity::Warning)
            .is_some());
        // Showing it did not acknowledge it.
        assert!(n
            .notify(NoticeKind::Device, "USB removed", Severity::Warning)
            .is_some());
    }

    #[test]
    fn acknowledged_notice_is_suppressed() {
        let mut n = notifier();
        let notice = n
            .notify(NoticeKind::Device, "USB removed", Severity::Warning)
            .unwrap();
        n.acknowledge(&notice);
        assert!(n
            .notify(NoticeKind::Device, "USB removed", Severity::Warning)
            .is_none());
    }

    #[test]
    fn different_body_is_a_different_notice() {
        let mut n = notifier();
        let notice = n
            .notify(NoticeKind::RunAborted, "Measurement Aborted (3/10 steps)", Severity::Warning)
            .unwrap();
        n.acknowledge(&notice);
        // Same kind, different step count: must come through.
        assert!(n
            .notify(NoticeKind::RunAborted, "Measurement Aborted (5/10 steps)", Severity::Warning)
            .is_some());
    }

    #[test]
    fn new_run_invalidates_old_dismissals() {
        let mut n = notifier();
        n.begin_run();
        let notice = n
            .notify(NoticeKind::RunComplete, "Measurement Complete (2/2 steps)", Severity::Success)
            .unwrap();
        assert_eq!(notice.run_id, 1);
        n.acknowledge(&notice);
        assert!(n
            .notify(NoticeKind::RunComplete, "Measurement Complete (2/2 steps)", Severity::Success)
            .is_none());

        n.begin_run();
        // Identical text, run 2: a fresh key, so it is presented again.
        assert!(n
            .notify(NoticeKind::RunComplete, "Measurement Complete (2/2 steps)", Severity::Success)
            .is_some());
    }

    #[test]
    fn key_shape() {
        let n = notifier();
        let notice = n
            .notify(NoticeKind::Stream, "connection lost", Severity::Error)
            .unwrap();
        assert_eq!(notice.key(), "0:stream:connection lost");
    }

    #[test]
    fn severity_orders_by_importance() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Success);
        assert!(Severity::Success > Severity::Info);
    }
}
