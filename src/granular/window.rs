//! Grain envelope shapes.

use std::f32::consts::PI;

// -------------------------------------------------------------------------------------------------

/// Grain window (envelope) shape.
///
/// All shapes are symmetric, start and end at zero and peak at the grain's midpoint.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    strum::EnumIter,
    strum::VariantNames,
    strum::EnumCount,
)]
#[repr(u8)]
pub enum GrainWindowShape {
    /// Single cosine lobe (sine window). Cheap and click-free, with a fuller body than Hann.
    #[default]
    CosineHybrid = 0,
    /// Linear rise to the peak at 0.5, linear fall.
    Triangle = 1,
    /// Cosine-squared window. Standard for granular synthesis.
    Hann = 2,
}

impl GrainWindowShape {
    /// Evaluate the window at the given normalized phase in range \[0.0, 1.0\].
    #[inline]
    pub fn evaluate(&self, phase: f32) -> f32 {
        debug_assert!((0.0..=1.0).contains(&phase));
        let value = match self {
            // half a cosine period, centered at phase 0.5
            GrainWindowShape::CosineHybrid => ((phase - 0.5) * PI).cos(),
            GrainWindowShape::Triangle => 1.0 - (2.0 * phase - 1.0).abs(),
            GrainWindowShape::Hann => 0.5 * (1.0 - (2.0 * PI * phase).cos()),
        };
        value.clamp(0.0, 1.0)
    }
}

// -------------------------------------------------------------------------------------------------

/// Fill the given buffer with a window of the given shape, spanning the whole buffer.
///
/// Windows shorter than 2 samples have no extent and are filled with zeros.
pub fn generate_window(shape: GrainWindowShape, output: &mut [f32]) {
    let envelope = GrainEnvelope::new(shape, output.len());
    for (index, value) in output.iter_mut().enumerate() {
        *value = envelope.value(index);
    }
}

// -------------------------------------------------------------------------------------------------

/// A grain's envelope, bound to the grain's own length and the window shape at spawn time.
///
/// Values are evaluated in closed form, so an envelope needs no storage and is identical
/// to the buffer [`generate_window`] produces for the same shape and length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrainEnvelope {
    shape: GrainWindowShape,
    length: usize,
    phase_increment: f32,
}

impl GrainEnvelope {
    /// A zero-length envelope, which is silent everywhere.
    pub const EMPTY: Self = Self {
        shape: GrainWindowShape::CosineHybrid,
        length: 0,
        phase_increment: 0.0,
    };

    /// Create a new envelope with the given shape and length in frames.
    pub fn new(shape: GrainWindowShape, length: usize) -> Self {
        let phase_increment = if length > 1 {
            1.0 / (length - 1) as f32
        } else {
            0.0
        };
        Self {
            shape,
            length,
            phase_increment,
        }
    }

    /// The envelope's window shape.
    pub fn shape(&self) -> GrainWindowShape {
        self.shape
    }

    /// The envelope's length in frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Envelope value at the given frame index. Indices out of bounds yield 0.0.
    #[inline]
    pub fn value(&self, index: usize) -> f32 {
        if index >= self.length || self.length < 2 {
            return 0.0;
        }
        let phase = (index as f32 * self.phase_increment).min(1.0);
        self.shape.evaluate(phase)
    }
}

// -------------------------------------------------------------------------------------------------
