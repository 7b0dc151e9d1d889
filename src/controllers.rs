//! Programmatic controllers for launching and aborting runs.
//!
//! The launch sequence is deliberately local: pressing start only arms a
//! countdown, and the start command goes out when the countdown expires.
//! A second press while counting cancels. The console never flips itself
//! into a running state — that always comes back through the event stream.

use crate::data::phase::Phase;

// ─────────────────────────────────────────────────────────────────────────────
// LaunchController
// ─────────────────────────────────────────────────────────────────────────────

/// Where the launch sequence currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    /// Nothing armed; the start button is available (phase permitting).
    Idle,
    /// Counting down; the button shows the remaining ticks and cancels.
    Counting { remaining: u32 },
    /// Start command sent; waiting for the backend to pick it up.
    Requested,
}

/// An action the caller must carry out after stepping the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchEffect {
    /// Send the start command now.
    IssueStart,
}

/// Drives the start button: arm, count down, fire exactly once.
#[derive(Debug)]
pub struct LaunchController {
    state: LaunchState,
    countdown_ticks: u32,
}

impl LaunchController {
    /// `countdown_ticks` is clamped to at least 1.
    pub fn new(countdown_ticks: u32) -> Self {
        Self {
            state: LaunchState::Idle,
            countdown_ticks: countdown_ticks.max(1),
        }
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    /// Remaining ticks while counting, else `None`.
    pub fn remaining(&self) -> Option<u32> {
        match self.state {
            LaunchState::Counting { remaining } => Some(remaining),
            _ => None,
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self.state, LaunchState::Counting { .. })
    }

    /// Handle a start-button press: arms the countdown from idle, cancels
    /// a running countdown. Ignored while a start request is in flight.
    pub fn press(&mut self) {
        self.state = match self.state {
            LaunchState::Idle => LaunchState::Counting {
                remaining: self.countdown_ticks,
            },
            LaunchState::Counting { .. } => LaunchState::Idle,
            LaunchState::Requested => LaunchState::Requested,
        };
    }

    /// Advance the countdown by one tick (call at 1 Hz).
    ///
    /// Returns [`LaunchEffect::IssueStart`] exactly once per armed cycle,
    /// on the tick that reaches zero. Ticks in any other state do nothing.
    pub fn tick(&mut self) -> Option<LaunchEffect> {
        match self.state {
            LaunchState::Counting { remaining } => {
                let remaining = remaining.saturating_sub(1);
                if remaining == 0 {
                    self.state = LaunchState::Requested;
                    Some(LaunchEffect::IssueStart)
                } else {
                    self.state = LaunchState::Counting { remaining };
                    None
                }
            }
            _ => None,
        }
    }

    /// Feed the backend's answer to the start command. A failure re-opens
    /// the launcher; success keeps it parked until the stream reports an
    /// active phase.
    pub fn acknowledge_start(&mut self, ok: bool) {
        if self.state == LaunchState::Requested && !ok {
            self.state = LaunchState::Idle;
        }
    }

    /// Feed the phase reported by the stream. An active phase settles the
    /// launcher back to idle: a pending request is now visibly running,
    /// and a countdown racing an externally started run is cancelled.
    pub fn settle(&mut self, phase: Phase) {
        if phase.is_active() {
            self.state = LaunchState::Idle;
        }
    }
}

impl Default for LaunchController {
    fn default() -> Self {
        Self::new(5)
    }
}
