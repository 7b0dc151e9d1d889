//! Reconciliation of live progress events into operator-facing state.
//!
//! A single [`Reconciler`] consumes the decoded stream in arrival order and
//! turns each event into an explicit [`SideEffects`] record: which
//! transitions happened, what the panels must repaint, and whether a run
//! just finished. The stream is at-least-once, so re-delivery must be
//! harmless: without a channel or phase transition the only effect is the
//! idempotent ring recompute.
//!
//! The engine owns the last-seen `(channel, phase)` pair and writes only
//! visual markers and the selection lock on the [`ChannelBank`]; it never
//! performs I/O. The app layer routes the returned summary to the
//! notification gatekeeper and the readout to the panels.

use crate::data::channels::ChannelBank;
use crate::data::event::{ProgressEvent, Snapshot};
use crate::data::notify::{NoticeKind, Severity};
use crate::data::phase::Phase;
use crate::data::progress::RingSet;

// ─────────────────────────────────────────────────────────────────────────────
// Effect payloads
// ─────────────────────────────────────────────────────────────────────────────

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All steps finished (SWITCHING settled into IDLE).
    Complete,
    /// The operator aborted mid-run.
    Aborted,
}

/// Outcome of a finished run, ready to become a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Steps finished before the run ended.
    pub completed: u32,
    /// Steps the run was planned to take.
    pub total: u32,
}

impl RunSummary {
    pub fn kind(&self) -> NoticeKind {
        match self.outcome {
            RunOutcome::Complete => NoticeKind::RunComplete,
            RunOutcome::Aborted => NoticeKind::RunAborted,
        }
    }

    pub fn severity(&self) -> Severity {
        match self.outcome {
            RunOutcome::Complete => Severity::Success,
            RunOutcome::Aborted => Severity::Warning,
        }
    }

    /// Notice body. Includes the step counts, so aborts at different
    /// points deduplicate separately.
    pub fn body(&self) -> String {
        match self.outcome {
            RunOutcome::Complete => {
                format!("Measurement Complete ({}/{} steps)", self.completed, self.total)
            }
            RunOutcome::Aborted => {
                format!("Measurement Aborted ({}/{} steps)", self.completed, self.total)
            }
        }
    }
}

/// What the start/abort buttons and the channel grid may do right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub start_enabled: bool,
    pub abort_enabled: bool,
    pub selection_locked: bool,
}

impl ControlState {
    pub fn for_phase(phase: Phase) -> Self {
        let active = phase.is_active();
        Self {
            start_enabled: !active,
            abort_enabled: active,
            selection_locked: active,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::for_phase(Phase::Idle)
    }
}

/// A phase transition observed on the stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseChange {
    /// `None` only for the very first event of a session.
    pub from: Option<Phase>,
    pub to: Phase,
}

/// Header readout, 1-based the way the operator sees channel numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelReadout {
    pub channel: u32,
    /// Channel queued up next; shown while the valve switches.
    pub next_channel: u32,
    pub phase: Phase,
}

/// Everything a single event pass decided.
#[derive(Debug, Clone, PartialEq)]
pub struct SideEffects {
    /// Set when the phase differs from the previous event.
    pub phase_change: Option<PhaseChange>,
    /// The reported channel differs from the previous event.
    pub channel_changed: bool,
    /// Transient markers were cleared for a fresh pass.
    pub fresh_pass: bool,
    /// New button/lock states; present only on a phase transition.
    pub controls: Option<ControlState>,
    /// New header readout; present when channel or phase changed.
    pub readout: Option<ChannelReadout>,
    /// A run just finished.
    pub summary: Option<RunSummary>,
    /// Recomputed on every event, duplicates included.
    pub rings: RingSet,
    /// The fully-defaulted view this pass worked from.
    pub snapshot: Snapshot,
}

// ─────────────────────────────────────────────────────────────────────────────
// Reconciler
// ─────────────────────────────────────────────────────────────────────────────

/// Stream state machine: remembers the last seen `(channel, phase)` pair.
///
/// Fresh instances have seen nothing, so the first event of a session
/// always registers as both a channel and a phase transition — which is
/// exactly what drives the initial paint.
#[derive(Debug, Default)]
pub struct Reconciler {
    last_channel: Option<u32>,
    last_phase: Option<Phase>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Phase reported by the most recent event (IDLE before the first one).
    pub fn current_phase(&self) -> Phase {
        self.last_phase.unwrap_or_default()
    }

    /// Forget the last-seen pair (e.g. after the stream reconnects against
    /// a restarted backend).
    pub fn reset(&mut self) {
        self.last_channel = None;
        self.last_phase = None;
    }

    /// Process one decoded event.
    ///
    /// Events must be fed in arrival order. Feeding the same payload twice
    /// leaves the bank and the last-seen state untouched; the returned
    /// effects then carry nothing but the ring recompute.
    pub fn reconcile(&mut self, event: &ProgressEvent, channels: &mut ChannelBank) -> SideEffects {
        let snap = event.snapshot(self.last_phase);

        let channel_changed = self.last_channel != Some(snap.channel);
        let phase_changed = self.last_phase != Some(snap.phase);

        // A fresh pass announces itself with both coordinates moving while
        // the channel lands back on 0. Markers clear before anything else
        // repaints.
        let fresh_pass = channel_changed && phase_changed && snap.channel == 0;
        if fresh_pass {
            channels.reset_transient_states();
        }

        let mut controls = None;
        let mut summary = None;
        if phase_changed {
            controls = Some(ControlState::for_phase(snap.phase));
            channels.set_locked(snap.phase.is_active());

            if snap.phase == Phase::Aborted {
                summary = Some(RunSummary {
                    outcome: RunOutcome::Aborted,
                    completed: snap.step_index,
                    total: snap.total_steps,
                });
            } else if self.last_phase == Some(Phase::Switching) && snap.phase == Phase::Idle {
                summary = Some(RunSummary {
                    outcome: RunOutcome::Complete,
                    completed: snap.total_steps,
                    total: snap.total_steps,
                });
            }
        }

        if channel_changed || phase_changed {
            // The channel the valve left is done for this pass and keeps a
            // collected mark; on a fresh pass the reset already holds.
            if channel_changed && !fresh_pass {
                if let Some(prev) = self.last_channel {
                    channels.mark_sampled(prev as usize);
                }
            }
            channels.apply_phase(snap.channel as usize, snap.phase);
        }

        let readout = (channel_changed || phase_changed).then(|| ChannelReadout {
            channel: snap.channel + 1,
            next_channel: snap.next_channel + 1,
            phase: snap.phase,
        });

        let phase_change = phase_changed.then(|| PhaseChange {
            from: self.last_phase,
            to: snap.phase,
        });

        // Rings recompute unconditionally; the projection is idempotent.
        let rings = RingSet::from_snapshot(&snap);

        self.last_channel = Some(snap.channel);
        self.last_phase = Some(snap.phase);

        SideEffects {
            phase_change,
            channel_changed,
            fresh_pass,
            controls,
            readout,
            summary,
            rings,
            snapshot: snap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::channels::ChannelVisual;
    use crate::data::event::decode;

    fn feed(rec: &mut Reconciler, bank: &mut ChannelBank, json: &str) -> SideEffects {
        let ev = decode(json).expect("test payload must decode");
        rec.reconcile(&ev, bank)
    }

    #[test]
    fn first_event_counts_as_transition() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let fx = feed(&mut rec, &mut bank, r#"{"phase":"IDLE","current_channel":0}"#);
        assert!(fx.channel_changed);
        let change = fx.phase_change.expect("first event is a phase change");
        assert_eq!(change.from, None);
        assert_eq!(change.to, Phase::Idle);
        assert!(fx.readout.is_some());
        assert!(fx.summary.is_none());
    }

    #[test]
    fn duplicate_event_only_recomputes_rings() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let payload = r#"{"phase":"MEASURING","current_channel":2,"step_index":2,
                          "enabled_count":4,"overall_percent":30.0}"#;
        let first = feed(&mut rec, &mut bank, payload);
        let second = feed(&mut rec, &mut bank, payload);

        assert!(second.phase_change.is_none());
        assert!(!second.channel_changed);
        assert!(!second.fresh_pass);
        assert!(second.controls.is_none());
        assert!(second.readout.is_none());
        assert!(second.summary.is_none());
        assert_eq!(second.rings, first.rings);
        assert_eq!(bank.visual(2), ChannelVisual::Sampling);
    }

    #[test]
    fn fresh_pass_resets_markers() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":5}"#);
        feed(&mut rec, &mut bank, r#"{"phase":"SWITCHING","current_channel":5}"#);
        assert_eq!(bank.visual(5), ChannelVisual::Sampled);

        // Back to channel 0 with a phase change: fresh pass.
        let fx = feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":0}"#);
        assert!(fx.fresh_pass);
        assert_eq!(bank.visual(5), ChannelVisual::Idle);
        assert_eq!(bank.visual(0), ChannelVisual::Sampling);
    }

    #[test]
    fn two_channel_run_marks_both_channels_sampled() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let mut mask = vec![false; 31];
        mask[0] = true;
        mask[1] = true;
        bank.set_mask(&mask);

        feed(&mut rec, &mut bank, r#"{"phase":"IDLE","current_channel":0}"#);
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":0}"#);
        // Valve moves on without a phase change: the left channel is done.
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":1}"#);
        assert_eq!(bank.visual(0), ChannelVisual::Sampled);
        assert_eq!(bank.visual(1), ChannelVisual::Sampling);

        feed(&mut rec, &mut bank, r#"{"phase":"SWITCHING","current_channel":1}"#);
        // The backend reports the last channel on its closing IDLE, so the
        // collected marks survive until the next run's first pass.
        let fx = feed(
            &mut rec,
            &mut bank,
            r#"{"phase":"IDLE","current_channel":1,"total_steps":2}"#,
        );
        let summary = fx.summary.expect("completion summary");
        assert_eq!(summary.outcome, RunOutcome::Complete);
        assert_eq!(summary.body(), "Measurement Complete (2/2 steps)");
        assert_eq!(bank.visual(0), ChannelVisual::Sampled);
        assert_eq!(bank.visual(1), ChannelVisual::Sampled);
        assert!((2..31).all(|idx| bank.visual(idx) == ChannelVisual::Idle));
        assert!(!bank.is_locked());
    }

    #[test]
    fn channel_zero_without_phase_change_keeps_markers() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"SWITCHING","current_channel":4}"#);
        assert_eq!(bank.visual(4), ChannelVisual::Sampled);
        // Channel moves to 0 but the phase stays SWITCHING: no reset.
        let fx = feed(&mut rec, &mut bank, r#"{"phase":"SWITCHING","current_channel":0}"#);
        assert!(!fx.fresh_pass);
        assert!(fx.channel_changed);
        assert_eq!(bank.visual(4), ChannelVisual::Sampled);
    }

    #[test]
    fn abort_summary_carries_step_counts() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":1}"#);
        let fx = feed(
            &mut rec,
            &mut bank,
            r#"{"phase":"ABORTED","current_channel":1,"step_index":3,"total_steps":10}"#,
        );
        let summary = fx.summary.expect("abort must emit a summary");
        assert_eq!(summary.outcome, RunOutcome::Aborted);
        assert_eq!(summary.completed, 3);
        assert_eq!(summary.total, 10);
        assert_eq!(summary.body(), "Measurement Aborted (3/10 steps)");
        assert_eq!(summary.severity(), Severity::Warning);
    }

    #[test]
    fn switching_to_idle_emits_complete() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"SWITCHING","current_channel":7}"#);
        let fx = feed(
            &mut rec,
            &mut bank,
            r#"{"phase":"IDLE","current_channel":7,"total_steps":16}"#,
        );
        let summary = fx.summary.expect("completion must emit a summary");
        assert_eq!(summary.outcome, RunOutcome::Complete);
        assert_eq!(summary.completed, 16);
        assert_eq!(summary.total, 16);
        assert_eq!(summary.body(), "Measurement Complete (16/16 steps)");
    }

    #[test]
    fn plain_idle_transition_is_not_a_completion() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"HOMING","current_channel":0}"#);
        let fx = feed(&mut rec, &mut bank, r#"{"phase":"IDLE","current_channel":0}"#);
        assert!(fx.summary.is_none());
    }

    #[test]
    fn summary_fires_at_most_once_per_transition() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":0}"#);
        let payload = r#"{"phase":"ABORTED","current_channel":0,"step_index":1,"total_steps":4}"#;
        assert!(feed(&mut rec, &mut bank, payload).summary.is_some());
        // Same event re-delivered: no second notification.
        assert!(feed(&mut rec, &mut bank, payload).summary.is_none());
    }

    #[test]
    fn active_phase_locks_selection() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let fx = feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":0}"#);
        let controls = fx.controls.unwrap();
        assert!(!controls.start_enabled);
        assert!(controls.abort_enabled);
        assert!(controls.selection_locked);
        assert!(bank.is_locked());

        let fx = feed(&mut rec, &mut bank, r#"{"phase":"ABORTED","current_channel":0}"#);
        let controls = fx.controls.unwrap();
        assert!(controls.start_enabled);
        assert!(!controls.abort_enabled);
        assert!(!bank.is_locked());
    }

    #[test]
    fn paused_visual_roundtrip() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":3}"#);
        assert_eq!(bank.visual(3), ChannelVisual::Sampling);
        feed(&mut rec, &mut bank, r#"{"phase":"PAUSED","current_channel":3}"#);
        assert_eq!(bank.visual(3), ChannelVisual::Paused);
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":3}"#);
        assert_eq!(bank.visual(3), ChannelVisual::Sampling);
    }

    #[test]
    fn missing_phase_rides_along() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        feed(&mut rec, &mut bank, r#"{"phase":"MEASURING","current_channel":0}"#);
        // No phase on the wire: previous phase carries over, channel moves.
        let fx = feed(&mut rec, &mut bank, r#"{"current_channel":1}"#);
        assert!(fx.phase_change.is_none());
        assert!(fx.channel_changed);
        assert_eq!(fx.snapshot.phase, Phase::Measuring);
        assert_eq!(rec.current_phase(), Phase::Measuring);
    }

    #[test]
    fn readout_is_one_based() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let fx = feed(
            &mut rec,
            &mut bank,
            r#"{"phase":"SWITCHING","current_channel":0,"next_channel":1}"#,
        );
        let readout = fx.readout.unwrap();
        assert_eq!(readout.channel, 1);
        assert_eq!(readout.next_channel, 2);
        assert_eq!(readout.phase, Phase::Switching);
    }

    #[test]
    fn bare_event_projects_zero_rings() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let fx = feed(&mut rec, &mut bank, "{}");
        assert_eq!(fx.rings.repeat.percent, 0.0);
        assert_eq!(fx.rings.cycle.percent, 0.0);
        assert_eq!(fx.rings.overall.percent, 0.0);
        assert_eq!(fx.snapshot.percent, 0.0);
    }

    #[test]
    fn reset_forgets_last_seen() {
        let mut rec = Reconciler::new();
        let mut bank = ChannelBank::new();
        let payload = r#"{"phase":"IDLE","current_channel":0}"#;
        feed(&mut rec, &mut bank, payload);
        rec.reset();
        let fx = feed(&mut rec, &mut bank, payload);
        assert!(fx.phase_change.is_some());
        assert!(fx.channel_changed);
    }
}
