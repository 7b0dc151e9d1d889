//! Channel selection and per-channel visual state.
//!
//! The sampler multiplexes 31 physical channels through a cascaded valve.
//! [`ChannelBank`] holds which channels participate in the next run (the
//! selection mask) and the visual marker each channel shows in the grid
//! while a run progresses. The mask never changes size.

use crate::data::phase::Phase;

/// Number of selectable sampler channels.
pub const CHANNEL_COUNT: usize = 31;

/// Visual marker of a single channel in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelVisual {
    /// Nothing happening on this channel.
    #[default]
    Idle,
    /// Being sampled right now.
    Sampling,
    /// The run is holding on this channel.
    Paused,
    /// Sample collected this pass; persists until the markers are reset.
    Sampled,
}

/// Pure mapping from `(phase, selected)` to the marker a channel should show.
///
/// `None` means "leave the current marker alone"; that is what lets a
/// completed channel keep its [`ChannelVisual::Sampled`] mark while the
/// valve homes or the run winds down. Unselected channels are always idle.
pub fn visual_for(phase: Phase, selected: bool) -> Option<ChannelVisual> {
    if !selected {
        return Some(ChannelVisual::Idle);
    }
    match phase {
        Phase::Measuring => Some(ChannelVisual::Sampling),
        Phase::Paused => Some(ChannelVisual::Paused),
        Phase::Switching => Some(ChannelVisual::Sampled),
        Phase::Idle | Phase::Homing | Phase::Aborted => None,
    }
}

/// Selection mask plus visual markers for all channels.
#[derive(Debug, Clone)]
pub struct ChannelBank {
    mask: [bool; CHANNEL_COUNT],
    visuals: [ChannelVisual; CHANNEL_COUNT],
    locked: bool,
}

impl Default for ChannelBank {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBank {
    /// Every channel selected, all markers idle, selection unlocked.
    pub fn new() -> Self {
        Self {
            mask: [true; CHANNEL_COUNT],
            visuals: [ChannelVisual::Idle; CHANNEL_COUNT],
            locked: false,
        }
    }

    /// Replace the whole mask (programmatic load, e.g. from preferences).
    ///
    /// Not gated by the run lock. Input shorter than the bank pads with
    /// `false`; longer input is truncated.
    pub fn set_mask(&mut self, mask: &[bool]) {
        for (idx, slot) in self.mask.iter_mut().enumerate() {
            *slot = mask.get(idx).copied().unwrap_or(false);
        }
    }

    /// Current mask as a boolean vector (the wire shape).
    pub fn mask(&self) -> Vec<bool> {
        self.mask.to_vec()
    }

    /// Whether a channel participates in the next run. Out-of-range
    /// indexes read as unselected.
    pub fn is_selected(&self, idx: usize) -> bool {
        self.mask.get(idx).copied().unwrap_or(false)
    }

    /// Flip one channel. Ignored while the selection is locked or the
    /// index is out of range.
    pub fn toggle(&mut self, idx: usize) {
        if self.locked {
            return;
        }
        if let Some(slot) = self.mask.get_mut(idx) {
            *slot = !*slot;
        }
    }

    /// Select or deselect every channel. Ignored while locked.
    pub fn set_all(&mut self, selected: bool) {
        if self.locked {
            return;
        }
        self.mask = [selected; CHANNEL_COUNT];
    }

    /// Invert the selection. Ignored while locked.
    pub fn invert(&mut self) {
        if self.locked {
            return;
        }
        for slot in self.mask.iter_mut() {
            *slot = !*slot;
        }
    }

    /// Indices of all selected channels, ascending.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.mask
            .iter()
            .enumerate()
            .filter_map(|(idx, sel)| sel.then_some(idx))
            .collect()
    }

    /// Number of selected channels.
    pub fn selected_count(&self) -> usize {
        self.mask.iter().filter(|sel| **sel).count()
    }

    /// Marker currently shown for a channel (idle if out of range).
    pub fn visual(&self, idx: usize) -> ChannelVisual {
        self.visuals.get(idx).copied().unwrap_or_default()
    }

    /// Apply the phase-derived marker to one channel.
    pub fn apply_phase(&mut self, idx: usize, phase: Phase) {
        let selected = self.is_selected(idx);
        if let (Some(slot), Some(visual)) =
            (self.visuals.get_mut(idx), visual_for(phase, selected))
        {
            *slot = visual;
        }
    }

    /// Mark a channel's sample as collected. Used for the channel the
    /// valve just left; unselected channels stay idle.
    pub fn mark_sampled(&mut self, idx: usize) {
        let selected = self.is_selected(idx);
        if let Some(slot) = self.visuals.get_mut(idx) {
            *slot = if selected {
                ChannelVisual::Sampled
            } else {
                ChannelVisual::Idle
            };
        }
    }

    /// Clear all markers back to idle (start of a fresh pass).
    pub fn reset_transient_states(&mut self) {
        self.visuals = [ChannelVisual::Idle; CHANNEL_COUNT];
    }

    /// Lock or unlock selection editing. The reconciler locks the bank
    /// whenever the reported phase is active.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
