//! Progress-ring projection.
//!
//! [`project`] folds a raw `(value, total)` pair into the render-ready form
//! the circular gauges consume: a clamped percent, the quartile bucket that
//! picks the ring's fill step, and a short text label. The projection is
//! pure, so recomputing it for a re-delivered event is free of side effects.

use crate::data::event::Snapshot;

/// Quartile bucket a percentage falls into. Drives the stepped ring fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quartile {
    /// 0–25 %.
    Q1,
    /// 26–50 %.
    Q2,
    /// 51–75 %.
    Q3,
    /// 76–100 %.
    Q4,
}

impl Quartile {
    /// Bucket for a percent already clamped to `0..=100`.
    pub fn from_percent(percent: f64) -> Self {
        if percent <= 25.0 {
            Quartile::Q1
        } else if percent <= 50.0 {
            Quartile::Q2
        } else if percent <= 75.0 {
            Quartile::Q3
        } else {
            Quartile::Q4
        }
    }
}

/// A render-ready progress ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    /// Clamped to `0..=100`.
    pub percent: f64,
    pub quartile: Quartile,
    /// Rounded text, e.g. `"42%"`.
    pub label: String,
}

/// Project a `(value, total)` pair into ring form.
///
/// `total <= 0` yields the empty ring rather than a division error, so an
/// event stripped of its totals still renders.
pub fn project(value: f64, total: f64) -> Ring {
    let percent = if total > 0.0 {
        (value / total * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    Ring {
        percent,
        quartile: Quartile::from_percent(percent),
        label: format!("{percent:.0}%"),
    }
}

/// The three rings shown while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub struct RingSet {
    /// Passes over the selection: `repeat_index / repeat_total`.
    pub repeat: Ring,
    /// Position within the current pass:
    /// `(step_index mod enabled_count) / enabled_count`.
    pub cycle: Ring,
    /// Whole-run progress as reported by the backend.
    pub overall: Ring,
}

impl RingSet {
    /// Recompute all three rings from a snapshot.
    ///
    /// Idempotent: equal snapshots produce equal ring sets, which is what
    /// makes re-delivered stream events harmless.
    pub fn from_snapshot(s: &Snapshot) -> Self {
        let cycle = if s.enabled_count > 0 {
            project(
                (s.step_index % s.enabled_count) as f64,
                s.enabled_count as f64,
            )
        } else {
            project(0.0, 0.0)
        };
        Self {
            repeat: project(s.repeat_index as f64, s.repeat_total as f64),
            cycle,
            overall: project(s.overall_percent, 100.0),
        }
    }
}

impl Default for RingSet {
    fn default() -> Self {
        Self {
            repeat: project(0.0, 0.0),
            cycle: project(0.0, 0.0),
            overall: project(0.0, 0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::event::ProgressEvent;

    fn snap_with(step: u32, enabled: u32, overall: f64) -> Snapshot {
        let mut ev = ProgressEvent::default();
        ev.step_index = Some(step);
        ev.enabled_count = Some(enabled);
        ev.overall_percent = Some(overall);
        ev.snapshot(None)
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(project(150.0, 100.0).percent, 100.0);
        assert_eq!(project(-5.0, 100.0).percent, 0.0);
        assert_eq!(project(50.0, 100.0).percent, 50.0);
    }

    #[test]
    fn zero_total_yields_empty_ring() {
        let ring = project(7.0, 0.0);
        assert_eq!(ring.percent, 0.0);
        assert_eq!(ring.quartile, Quartile::Q1);
        assert_eq!(ring.label, "0%");
    }

    #[test]
    fn quartile_boundaries() {
        assert_eq!(Quartile::from_percent(0.0), Quartile::Q1);
        assert_eq!(Quartile::from_percent(25.0), Quartile::Q1);
        assert_eq!(Quartile::from_percent(25.1), Quartile::Q2);
        assert_eq!(Quartile::from_percent(50.0), Quartile::Q2);
        assert_eq!(Quartile::from_percent(75.0), Quartile::Q3);
        assert_eq!(Quartile::from_percent(76.0), Quartile::Q4);
        assert_eq!(Quartile::from_percent(100.0), Quartile::Q4);
    }

    #[test]
    fn label_is_rounded() {
        assert_eq!(project(1.0, 3.0).label, "33%");
        assert_eq!(project(2.0, 3.0).label, "67%");
    }

    #[test]
    fn cycle_ring_wraps_per_pass() {
        // 8 enabled channels, step 5 -> 5/8 into the first pass.
        let set = RingSet::from_snapshot(&snap_with(5, 8, 0.0));
        assert_eq!(set.cycle.percent, 62.5);
        // Step 13 -> 5/8 into the second pass: same position.
        let set = RingSet::from_snapshot(&snap_with(13, 8, 0.0));
        assert_eq!(set.cycle.percent, 62.5);
    }

    #[test]
    fn cycle_ring_guards_zero_enabled_count() {
        let set = RingSet::from_snapshot(&snap_with(5, 0, 0.0));
        assert_eq!(set.cycle.percent, 0.0);
    }

    #[test]
    fn overall_ring_is_identity() {
        let set = RingSet::from_snapshot(&snap_with(0, 0, 73.0));
        assert_eq!(set.overall.percent, 73.0);
        assert_eq!(set.overall.quartile, Quartile::Q3);
    }

    #[test]
    fn equal_snapshots_produce_equal_rings() {
        let a = snap_with(5, 8, 40.0);
        let b = snap_with(5, 8, 40.0);
        assert_eq!(RingSet::from_snapshot(&a), RingSet::from_snapshot(&b));
    }
}
