//! Wire format of the live progress stream.
//!
//! Every field of a [`ProgressEvent`] is optional on the wire: the backend
//! only guarantees a JSON object per frame. [`ProgressEvent::snapshot`]
//! applies the documented defaults so downstream code never sees a missing
//! value. A payload that fails to parse *as a whole* (wrong types, not an
//! object) is dropped by [`decode`] and the previous state stays
//! authoritative.

use serde::Deserialize;

use crate::data::phase::Phase;

/// One JSON payload from the progress stream.
///
/// Besides the progress fields proper, the backend piggybacks slow-moving
/// device state on the same stream; those blocks are present only when they
/// changed since the previous frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProgressEvent {
    /// Acquisition phase name; absent means "unchanged".
    pub phase: Option<String>,
    /// 0-based index of the channel being worked on.
    pub current_channel: Option<u32>,
    /// 0-based index of the current pass over the selection.
    #[serde(alias = "repeat")]
    pub repeat_index: Option<u32>,
    /// Total number of passes in this run.
    pub repeat_total: Option<u32>,
    /// Per-step progress of the current sample, 0..100.
    pub percent: Option<f64>,
    /// Whole-run progress, 0..100.
    pub overall_percent: Option<f64>,
    /// 0-based step counter across the whole run.
    pub step_index: Option<u32>,
    /// Total steps in the run (selected channels x repeats).
    pub total_steps: Option<u32>,
    /// Number of selected channels in the running measurement.
    pub enabled_count: Option<u32>,
    /// Seconds since the run started.
    pub elapsed_seconds: Option<f64>,
    /// Estimated seconds until the run finishes.
    pub tt_seconds: Option<f64>,
    /// 0-based index of the channel queued up next.
    pub next_channel: Option<u32>,

    // ── Piggybacked device state (delta-encoded) ─────────────────────────
    /// Analyzer connection state.
    pub connection: Option<ConnectionStatus>,
    /// Fresh gas readings for the channel just sampled.
    pub live_data: Option<LiveBlock>,
    /// Whether a USB stick is mounted for logging.
    pub usb_mounted: Option<bool>,
    /// Whether the end-of-run buzzer is enabled.
    pub buzzer_enabled: Option<bool>,
}

/// Analyzer connection state block.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ConnectionStatus {
    pub online: bool,
}

/// One batch of gas readings, taken at the end of a sample.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LiveBlock {
    /// Wall-clock time of the reading, `YYYY-MM-DD HH:MM:SS`.
    pub timestamp: String,
    pub phase: Option<String>,
    /// 1-based channel number as displayed to the operator.
    pub channel: Option<u32>,
    /// 1-based repeat number.
    pub repeat: Option<u32>,
    pub components: Vec<GasComponent>,
}

/// A single gas component reading.
#[derive(Debug, Clone, Deserialize)]
pub struct GasComponent {
    pub label: String,
    #[serde(default)]
    pub ppm: f64,
    /// Preferred display colour as `#rrggbb`, when the device provides one.
    #[serde(default)]
    pub color: Option<String>,
    /// CAS registry number of the gas, when known.
    #[serde(default)]
    pub cas: Option<String>,
}

/// Fully-defaulted view of a [`ProgressEvent`].
///
/// Numeric fields default to zero; the phase falls back to the previous
/// snapshot's phase (IDLE before the first event).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub channel: u32,
    pub repeat_index: u32,
    pub repeat_total: u32,
    pub percent: f64,
    pub overall_percent: f64,
    pub step_index: u32,
    pub total_steps: u32,
    pub enabled_count: u32,
    pub elapsed_seconds: f64,
    pub tt_seconds: f64,
    pub next_channel: u32,
}

impl ProgressEvent {
    /// Apply defaults, resolving a missing phase against `previous`.
    pub fn snapshot(&self, previous: Option<Phase>) -> Snapshot {
        Snapshot {
            phase: match self.phase.as_deref() {
                Some(s) => Phase::from_wire(s),
                None => previous.unwrap_or_default(),
            },
            channel: self.current_channel.unwrap_or(0),
            repeat_index: self.repeat_index.unwrap_or(0),
            repeat_total: self.repeat_total.unwrap_or(0),
            percent: self.percent.unwrap_or(0.0),
            overall_percent: self.overall_percent.unwrap_or(0.0),
            step_index: self.step_index.unwrap_or(0),
            total_steps: self.total_steps.unwrap_or(0),
            enabled_count: self.enabled_count.unwrap_or(0),
            elapsed_seconds: self.elapsed_seconds.unwrap_or(0.0),
            tt_seconds: self.tt_seconds.unwrap_or(0.0),
            next_channel: self.next_channel.unwrap_or(0),
        }
    }
}

/// Decode one stream payload.
///
/// Returns `None` (with a warning) when the payload does not parse; the
/// caller simply skips the frame.
pub fn decode(payload: &str) -> Option<ProgressEvent> {
    match serde_json::from_str::<ProgressEvent>(payload) {
        Ok(event) => Some(event),
        Err(e) => {
            log::warn!("dropping malformed progress event: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_event_decodes() {
        let ev = decode(
            r#"{"phase":"MEASURING","current_channel":3,"repeat_index":1,
                "repeat_total":2,"percent":42.5,"overall_percent":12.0,
                "step_index":5,"total_steps":16,"enabled_count":8,
                "elapsed_seconds":120.0,"tt_seconds":480.0,"next_channel":4}"#,
        )
        .unwrap();
        let snap = ev.snapshot(None);
        assert_eq!(snap.phase, Phase::Measuring);
        assert_eq!(snap.channel, 3);
        assert_eq!(snap.repeat_index, 1);
        assert_eq!(snap.enabled_count, 8);
        assert_eq!(snap.percent, 42.5);
        assert_eq!(snap.next_channel, 4);
    }

    #[test]
    fn empty_object_defaults_everything() {
        let ev = decode("{}").unwrap();
        let snap = ev.snapshot(None);
        assert_eq!(snap.phase, Phase::Idle);
        assert_eq!(snap.channel, 0);
        assert_eq!(snap.percent, 0.0);
        assert_eq!(snap.overall_percent, 0.0);
        assert_eq!(snap.total_steps, 0);
    }

    #[test]
    fn missing_phase_inherits_previous() {
        let ev = decode(r#"{"current_channel":2}"#).unwrap();
        assert_eq!(ev.snapshot(Some(Phase::Paused)).phase, Phase::Paused);
        assert_eq!(ev.snapshot(None).phase, Phase::Idle);
    }

    #[test]
    fn repeat_alias_is_accepted() {
        let ev = decode(r#"{"repeat":3}"#).unwrap();
        assert_eq!(ev.repeat_index, Some(3));
        let ev = decode(r#"{"repeat_index":4}"#).unwrap();
        assert_eq!(ev.repeat_index, Some(4));
    }

    #[test]
    fn type_broken_payload_is_dropped() {
        assert!(decode(r#"{"current_channel":"three"}"#).is_none());
        assert!(decode("not json").is_none());
        assert!(decode("[1,2,3]").is_none());
    }

    #[test]
    fn unknown_phase_string_coerces_to_idle() {
        let ev = decode(r#"{"phase":"WARMUP"}"#).unwrap();
        assert_eq!(ev.snapshot(Some(Phase::Measuring)).phase, Phase::Idle);
    }

    #[test]
    fn piggyback_blocks_decode() {
        let ev = decode(
            r##"{"phase":"MEASURING",
                "connection":{"online":true},
                "usb_mounted":false,
                "buzzer_enabled":true,
                "live_data":{"timestamp":"2026-03-01 10:15:00","phase":"MEASURING",
                             "channel":4,"repeat":1,
                             "components":[{"label":"CH4","ppm":1.92,"color":"#4e79a7","cas":"74-82-8"}]}}"##,
        )
        .unwrap();
        assert!(ev.connection.unwrap().online);
        assert_eq!(ev.usb_mounted, Some(false));
        assert_eq!(ev.buzzer_enabled, Some(true));
        let live = ev.live_data.unwrap();
        assert_eq!(live.channel, Some(4));
        assert_eq!(live.components.len(), 1);
        assert_eq!(live.components[0].label, "CH4");
        assert_eq!(live.components[0].ppm, 1.92);
    }

    #[test]
    fn unknown_top_level_fields_are_ignored() {
        let ev = decode(r#"{"phase":"IDLE","future_field":{"a":1}}"#).unwrap();
        assert_eq!(ev.snapshot(None).phase, Phase::Idle);
    }
}
