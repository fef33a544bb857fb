use std::str::FromStr;

use four_cc::FourCC;
use strum::{EnumCount, IntoEnumIterator};

use super::{Parameter, ParameterType, ParameterValueUpdate};

// -------------------------------------------------------------------------------------------------

/// An enum parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParameter {
    id: FourCC,
    name: &'static str,
    values: Vec<String>,
    default_index: usize,
}

impl EnumParameter {
    pub fn new<E: IntoEnumIterator + ToString + PartialEq>(
        id: FourCC,
        name: &'static str,
        default: E,
    ) -> Self {
        let values = E::iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let default_index = E::iter().position(|r| r == default).unwrap_or(0);
        Self {
            id,
            name,
            values,
            default_index,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn default_value(&self) -> &String {
        &self.values[self.default_index]
    }

    pub fn normalize_value(&self, value: &str) -> f32 {
        if self.values.len() > 1 {
            if let Some(index) = self.values.iter().position(|v| v == value) {
                return index as f32 / (self.values.len() - 1) as f32;
            }
        }
        0.0
    }

    pub fn denormalize_value(&self, normalized: f32) -> &String {
        assert!((0.0..=1.0).contains(&normalized));
        let index = (normalized * (self.values.len() - 1) as f32).round() as usize;
        &self.values[index]
    }

    /// Create a raw value update for this parameter.
    pub fn value_update<T: Send + Sync + 'static>(
        &self,
        value: T,
    ) -> (FourCC, ParameterValueUpdate) {
        (self.id, ParameterValueUpdate::Raw(Box::new(value)))
    }

    /// Resolve the given update to an enum value. Raw updates may either carry the enum value
    /// itself or its string representation.
    /// Returns `None` when the update carries an unexpected value type or an unknown name.
    pub fn value_from_update<E>(&self, update: &ParameterValueUpdate) -> Option<E>
    where
        E: IntoEnumIterator + EnumCount + FromStr + Copy + 'static,
    {
        let default = E::iter().nth(self.default_index)?;
        Self::resolve_update(update, default)
    }

    /// Resolve the given update to an enum value without a descriptor instance. NaN normalized
    /// values resolve to `default`.
    ///
    /// Doesn't allocate, so this can be used in real-time threads.
    pub fn resolve_update<E>(update: &ParameterValueUpdate, default: E) -> Option<E>
    where
        E: IntoEnumIterator + EnumCount + FromStr + Copy + 'static,
    {
        match update {
            ParameterValueUpdate::Raw(raw) => {
                if let Some(value) = raw.downcast_ref::<E>() {
                    Some(*value)
                } else if let Some(value_str) = raw.downcast_ref::<String>() {
                    E::from_str(value_str).ok()
                } else if let Some(value_str) = raw.downcast_ref::<&'static str>() {
                    E::from_str(value_str).ok()
                } else {
                    None
                }
            }
            ParameterValueUpdate::Normalized(normalized) => {
                if normalized.is_nan() {
                    Some(default)
                } else {
                    let last_index = E::COUNT.saturating_sub(1);
                    let index = (normalized.clamp(0.0, 1.0) * last_index as f32).round() as usize;
                    E::iter().nth(index.min(last_index))
                }
            }
        }
    }
}

impl Parameter for EnumParameter {
    fn id(&self) -> FourCC {
        self.id
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn parameter_type(&self) -> ParameterType {
        ParameterType::Enum {
            values: self.values.clone(),
            default_index: self.default_index,
        }
    }
}

// -------------------------------------------------------------------------------------------------
