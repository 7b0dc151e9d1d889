//! Measurement phase model.
//!
//! The backend reports its acquisition state as a free-form string on the
//! progress stream. This module narrows it to the closed [`Phase`] set the
//! console reasons about, and defines which phases count as an active run
//! (selection locked, abort available).

/// Acquisition phase as shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// No run in progress; the sampler is parked.
    #[default]
    Idle,
    /// Actively sampling the current channel.
    Measuring,
    /// Run suspended between samples.
    Paused,
    /// Rotary valve moving to the next channel.
    Switching,
    /// Valve returning to its reference position.
    Homing,
    /// Run terminated early by the operator.
    Aborted,
}

impl Phase {
    /// Parse a wire phase string.
    ///
    /// An unrecognized string falls back to [`Phase::Idle`] so a backend
    /// protocol drift degrades the display instead of breaking it; the
    /// mismatch is logged.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "IDLE" => Phase::Idle,
            "MEASURING" => Phase::Measuring,
            "PAUSED" => Phase::Paused,
            "SWITCHING" => Phase::Switching,
            "HOMING" => Phase::Homing,
            "ABORTED" => Phase::Aborted,
            other => {
                log::warn!("unknown phase {other:?} on stream, treating as IDLE");
                Phase::Idle
            }
        }
    }

    /// Wire/display name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "IDLE",
            Phase::Measuring => "MEASURING",
            Phase::Paused => "PAUSED",
            Phase::Switching => "SWITCHING",
            Phase::Homing => "HOMING",
            Phase::Aborted => "ABORTED",
        }
    }

    /// `true` while a run holds the hardware. Active phases lock channel
    /// selection, disable start and enable abort.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Phase::Measuring | Phase::Paused | Phase::Switching | Phase::Homing
        )
    }

    /// `true` when a new run may be started.
    pub fn can_start(self) -> bool {
        !self.is_active()
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
