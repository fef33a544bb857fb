use four_cc::FourCC;

use crate::parameter::FloatParameter;

// -------------------------------------------------------------------------------------------------

/// Output safety stage of the granular engine.
///
/// Replaces non-finite samples with silence, then optionally bends all magnitudes above the
/// threshold with a tanh curve that approaches, but never exceeds, ±1.0. Samples below the
/// threshold pass unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftLimiter {
    enabled: bool,
    threshold: f32,
}

impl SoftLimiter {
    pub const THRESHOLD: FloatParameter =
        FloatParameter::new(FourCC(*b"lthr"), "Limiter Threshold", 0.0..=0.95, 0.7);

    /// Create a new enabled limiter with the given threshold. The threshold gets clamped to
    /// the range `0.0..=0.95`.
    pub fn new(threshold: f32) -> Self {
        Self {
            enabled: true,
            threshold: Self::THRESHOLD.clamp_value(threshold),
        }
    }

    /// Create a limiter which only guards against non-finite samples.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = Self::THRESHOLD.clamp_value(threshold);
    }

    /// Process a single sample.
    #[inline]
    pub fn process_sample(&self, sample: f32) -> f32 {
        if !sample.is_finite() {
            return 0.0;
        }
        let magnitude = sample.abs();
        if !self.enabled || magnitude <= self.threshold {
            return sample;
        }
        let headroom = 1.0 - self.threshold;
        let limited = self.threshold + headroom * ((magnitude - self.threshold) / headroom).tanh();
        limited.copysign(sample)
    }

    /// Process the given buffer in place.
    pub fn process(&self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

impl Default for SoftLimiter {
    fn default() -> Self {
        Self::new(Self::THRESHOLD.default_value())
    }
}

// -------------------------------------------------------------------------------------------------
