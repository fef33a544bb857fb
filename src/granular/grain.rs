//! Grain instances and the fixed-capacity pool which owns them.

use super::window::GrainEnvelope;

// -------------------------------------------------------------------------------------------------

/// Represents a single grain of audio.
///
/// A grain is a short excerpt of the source sample with its own envelope, playback direction
/// and stereo position. Grain timing is expressed in output sample frames on the engine's
/// render clock. The grain's age is never stored: the renderer derives it from the clock.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Grain {
    /// Is this grain currently active?
    active: bool,
    /// Onset on the render clock, in output frames.
    start_frame: f64,
    /// Length of the grain in output frames.
    duration_frames: f64,
    /// Fractional read position in the source sample at the grain's onset.
    source_position: f64,
    /// +1.0 for forward, -1.0 for backward playback.
    direction: f64,
    left_gain: f32,
    right_gain: f32,
    /// Envelope bound to the grain's own length at spawn time.
    envelope: GrainEnvelope,
}

impl Grain {
    /// Create a new active grain.
    pub fn new(
        start_frame: f64,
        duration_frames: f64,
        source_position: f64,
        reverse: bool,
        pan: f32,
        envelope: GrainEnvelope,
    ) -> Self {
        let pan = pan.clamp(-1.0, 1.0);
        Self {
            active: true,
            start_frame,
            duration_frames: duration_frames.max(0.0),
            source_position,
            direction: if reverse { -1.0 } else { 1.0 },
            left_gain: 0.5 * (1.0 - pan),
            right_gain: 0.5 * (1.0 + pan),
            envelope,
        }
    }

    /// An inactive placeholder grain for empty pool slots.
    const fn inactive() -> Self {
        Self {
            active: false,
            start_frame: 0.0,
            duration_frames: 0.0,
            source_position: 0.0,
            direction: 1.0,
            left_gain: 0.5,
            right_gain: 0.5,
            envelope: GrainEnvelope::EMPTY,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[inline]
    pub fn start_frame(&self) -> f64 {
        self.start_frame
    }

    #[inline]
    pub fn duration_frames(&self) -> f64 {
        self.duration_frames
    }

    #[inline]
    pub fn source_position(&self) -> f64 {
        self.source_position
    }

    #[inline]
    pub fn direction(&self) -> f64 {
        self.direction
    }

    /// `(left, right)` gains derived from the grain's stereo position, where -1.0 is full left,
    /// 0.0 center and 1.0 full right.
    #[inline]
    pub fn gains(&self) -> (f32, f32) {
        (self.left_gain, self.right_gain)
    }

    #[inline]
    pub fn envelope(&self) -> &GrainEnvelope {
        &self.envelope
    }

    /// Mark the grain as expired. The pool removes it at the end of the render pass.
    #[inline]
    pub fn expire(&mut self) {
        self.active = false;
    }
}

// -------------------------------------------------------------------------------------------------

/// Bounded pool of grains.
///
/// All grain slots and the active index list are allocated once on creation. Spawning,
/// expiring and clearing grains never allocates. A full pool refuses new grains: existing
/// grains are never evicted.
pub(crate) struct GrainPool {
    /// Grain slots. Inactive slots are free.
    grains: Box<[Grain]>,
    /// Indices of currently active grains.
    active_grain_indices: Vec<usize>,
}

impl GrainPool {
    /// Create a new pool with the given number of grain slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            grains: vec![Grain::inactive(); capacity].into_boxed_slice(),
            active_grain_indices: Vec::with_capacity(capacity),
        }
    }

    /// Total number of grain slots.
    pub fn capacity(&self) -> usize {
        self.grains.len()
    }

    /// Number of active grains.
    #[inline]
    pub fn len(&self) -> usize {
        self.active_grain_indices.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.active_grain_indices.is_empty()
    }

    /// Number of grains which may still be spawned without exceeding `max_grains`.
    #[inline]
    pub fn free_slots(&self, max_grains: usize) -> usize {
        max_grains.min(self.capacity()).saturating_sub(self.len())
    }

    /// Add a new grain into a free slot. Returns false when the pool is full.
    pub fn spawn(&mut self, grain: Grain) -> bool {
        debug_assert!(grain.is_active(), "Should only spawn active grains");
        if self.len() >= self.capacity() {
            return false;
        }
        if let Some(index) = self.grains.iter().position(|g| !g.is_active()) {
            self.grains[index] = grain;
            self.active_grain_indices.push(index);
            true
        } else {
            false
        }
    }

    /// Call the given function for all active grains.
    #[inline]
    pub fn for_each_active_mut<F: FnMut(&mut Grain)>(&mut self, mut f: F) {
        for &index in &self.active_grain_indices {
            f(&mut self.grains[index]);
        }
    }

    /// Iterate over all active grains.
    #[cfg(test)]
    pub fn active_grains(&self) -> impl Iterator<Item = &Grain> + '_ {
        self.active_grain_indices
            .iter()
            .map(|&index| &self.grains[index])
    }

    /// Remove grains which expired from the active list.
    pub fn retain_active(&mut self) {
        let grains = &self.grains;
        self.active_grain_indices
            .retain(|&index| grains[index].is_active());
    }

    /// Remove all grains.
    pub fn clear(&mut self) {
        for &index in &self.active_grain_indices {
            self.grains[index].expire();
        }
        self.active_grain_indices.clear();
    }
}

// -------------------------------------------------------------------------------------------------
