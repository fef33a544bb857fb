use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterScaling, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    unit: &'static str,
    scaling: ParameterScaling,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub const fn new(
        id: FourCC,
        name: &'static str,
        range: RangeInclusive<f32>,
        default: f32,
    ) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            unit: "",
            scaling: ParameterScaling::Linear,
        }
    }

    /// Optional unit for string displays.
    pub const fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// Optional scaling, applied when converting normalized values.
    pub const fn with_scaling(mut self, scaling: ParameterScaling) -> Self {
        scaling.validate();
        self.scaling = scaling;
        self
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's default value.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// The parameter's display unit, if any.
    pub fn unit(&self) -> &'static str {
        self.unit
    }

    /// The parameter's normalized value scaling.
    pub fn scaling(&self) -> ParameterScaling {
        self.scaling
    }

    /// Clamp the given plain value to the parameter's range. NaN values fall back to the
    /// parameter's default value.
    pub fn clamp_value(&self, value: f32) -> f32 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(*self.range.start(), *self.range.end())
        }
    }

    /// Normalize the given plain value to a 0.0-1.0 range.
    pub fn normalize_value(&self, value: f32) -> f32 {
        let value = self.clamp_value(value);
        let linear = (value - *self.range.start()) / (*self.range.end() - *self.range.start());
        self.scaling.unscale(linear.clamp(0.0, 1.0))
    }

    /// Denormalize a 0.0-1.0 ranged value to the corresponding plain value.
    pub fn denormalize_value(&self, normalized: f32) -> f32 {
        assert!((0.0..=1.0).contains(&normalized));
        let scaled = self.scaling.scale(normalized);
        *self.range.start() + scaled * (*self.range.end() - *self.range.start())
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        if include_unit && !self.unit.is_empty() {
            format!("{:.2} {}", value, self.unit)
        } else {
            format!("{:.2}", value)
        }
    }

    /// Convert the given string to a clamped plain value.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let mut string = string.trim();
        if !self.unit.is_empty() {
            string = string.trim_end_matches(self.unit).trim_end();
        }
        let value = string.parse::<f32>().ok()?;
        Some(self.clamp_value(value))
    }

    /// Create a raw value update for this parameter.
    pub fn value_update(&self, value: f32) -> (FourCC, ParameterValueUpdate) {
        (self.id, ParameterValueUpdate::Raw(Box::new(value)))
    }

    /// Create a normalized value update for this parameter.
    pub fn normalized_value_update(&self, normalized: f32) -> (FourCC, ParameterValueUpdate) {
        (self.id, ParameterValueUpdate::Normalized(normalized))
    }

    /// Resolve the given update to a clamped plain value.
    /// Returns `None` when the update carries an unexpected value type.
    pub fn value_from_update(&self, update: &ParameterValueUpdate) -> Option<f32> {
        match update {
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = raw.downcast_ref::<f32>() {
                    Some(self.clamp_value(*value))
                } else if let Some(value) = raw.downcast_ref::<f64>() {
                    Some(self.clamp_value(*value as f32))
                } else {
                    None
                }
            }
            ParameterValueUpdate::Normalized(normalized) => {
                let normalized = if normalized.is_nan() {
                    self.normalize_value(self.default)
                } else {
                    normalized.clamp(0.0, 1.0)
                };
                Some(self.denormalize_value(normalized))
            }
        }
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float {
            range: self.range.clone(),
            default: self.default,
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const DURATION: FloatParameter =
        FloatParameter::new(FourCC(*b"TDUR"), "Duration", 0.01..=2.0, 0.1)
            .with_unit("s")
            .with_scaling(ParameterScaling::Exponential(2.0));

    #[test]
    fn clamping() {
        assert_eq!(DURATION.clamp_value(0.5), 0.5);
        assert_eq!(DURATION.clamp_value(-1.0), 0.01);
        assert_eq!(DURATION.clamp_value(f32::INFINITY), 2.0);
        assert_eq!(DURATION.clamp_value(f32::NEG_INFINITY), 0.01);
        assert_eq!(DURATION.clamp_value(f32::NAN), 0.1);
    }

    #[test]
    fn normalization() {
        for value in [0.01, 0.1, 0.5, 1.0, 2.0] {
            let normalized = DURATION.normalize_value(value);
            assert!((0.0..=1.0).contains(&normalized));
            assert!((DURATION.denormalize_value(normalized) - value).abs() < 1e-4);
        }
        assert_eq!(DURATION.denormalize_value(0.0), 0.01);
        assert_eq!(DURATION.denormalize_value(1.0), 2.0);
    }

    #[test]
    fn updates() {
        let (id, update) = DURATION.value_update(5.0);
        assert_eq!(id, FourCC(*b"TDUR"));
        assert_eq!(DURATION.value_from_update(&update), Some(2.0));

        let update = ParameterValueUpdate::Raw(Box::new(0.25_f64));
        assert_eq!(DURATION.value_from_update(&update), Some(0.25));

        let update = ParameterValueUpdate::Raw(Box::new("0.25"));
        assert_eq!(DURATION.value_from_update(&update), None);

        let (_, update) = DURATION.normalized_value_update(1.5);
        assert_eq!(DURATION.value_from_update(&update), Some(2.0));

        let update = ParameterValueUpdate::Normalized(f32::NAN);
        let value = DURATION.value_from_update(&update).unwrap();
        assert!((value - 0.1).abs() < 1e-4);
    }

    #[test]
    fn strings() {
        assert_eq!(DURATION.value_to_string(0.5, true), "0.50 s");
        assert_eq!(DURATION.value_to_string(0.5, false), "0.50");
        assert_eq!(DURATION.string_to_value("0.5 s"), Some(0.5));
        assert_eq!(DURATION.string_to_value("12"), Some(2.0));
        assert_eq!(DURATION.string_to_value("abc"), None);
    }
}
