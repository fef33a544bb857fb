use four_cc::FourCC;
use strum::{Display, EnumCount, EnumIter, EnumString, VariantNames};

use super::window::GrainWindowShape;
use crate::{
    parameter::{
        EnumParameter, FloatParameter, IntegerParameter, Parameter, ParameterScaling,
        ParameterValueUpdate,
    },
    Error,
};

// -------------------------------------------------------------------------------------------------

/// Direction in which new grains read their source sample.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Display, EnumIter, EnumString, VariantNames, EnumCount,
)]
pub enum GrainPlaybackDirection {
    /// All grains play forward.
    #[default]
    Forward,
    /// All grains play backward.
    Backward,
    /// Each grain picks a direction at random with equal probability.
    Random,
}

// -------------------------------------------------------------------------------------------------

/// Where new grains are centered in the source sample.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Display, EnumIter, EnumString, VariantNames, EnumCount,
)]
pub enum GrainPlayheadMode {
    /// Grains follow a write head which moves through the sample in real time.
    #[default]
    PlayThrough,
    /// Grains are centered at a fixed, normalized sample [`position`](GranularParameters::position).
    Manual,
}

// -------------------------------------------------------------------------------------------------

/// Snapshot of all granular control values.
///
/// The engine copies the snapshot at the start of each render block, so changes apply at block
/// boundaries only. Use [`clamped`](Self::clamped) or the engine's setters to get a snapshot
/// with all values within their valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GranularParameters {
    /// Nominal grain length in seconds.
    pub grain_duration: f32,
    /// Playback speed multiplier of each grain.
    pub pitch_ratio: f32,
    /// Number of grains spawned per second.
    pub density: f32,
    /// Start position jitter, as a fraction of the grain's length.
    pub spray: f32,
    /// Envelope of new grains.
    pub window_shape: GrainWindowShape,
    /// Maximum number of concurrently playing grains.
    pub max_grains: usize,
    /// Random stereo spread of new grains. 0 is mono, 1 spreads over the full stereo width.
    pub pan_spread: f32,
    pub playback_direction: GrainPlaybackDirection,
    pub playhead_mode: GrainPlayheadMode,
    /// Normalized grain center position in [`GrainPlayheadMode::Manual`] mode.
    pub position: f32,
}

impl GranularParameters {
    pub const GRAIN_DURATION_ID: FourCC = FourCC(*b"gdur");
    pub const PITCH_RATIO_ID: FourCC = FourCC(*b"gpit");
    pub const DENSITY_ID: FourCC = FourCC(*b"gden");
    pub const SPRAY_ID: FourCC = FourCC(*b"gspr");
    pub const WINDOW_SHAPE_ID: FourCC = FourCC(*b"gwin");
    pub const MAX_GRAINS_ID: FourCC = FourCC(*b"gmax");
    pub const PAN_SPREAD_ID: FourCC = FourCC(*b"gpan");
    pub const PLAYBACK_DIRECTION_ID: FourCC = FourCC(*b"gdir");
    pub const PLAYHEAD_MODE_ID: FourCC = FourCC(*b"gphm");
    pub const POSITION_ID: FourCC = FourCC(*b"gpos");

    /// Hard upper limit for [`max_grains`](Self::max_grains): the grain pool's capacity.
    pub const MAX_GRAINS_LIMIT: usize = 200;

    pub const GRAIN_DURATION: FloatParameter =
        FloatParameter::new(Self::GRAIN_DURATION_ID, "Duration", 0.01..=2.0, 0.1)
            .with_unit("s")
            .with_scaling(ParameterScaling::Exponential(2.0));
    pub const PITCH_RATIO: FloatParameter =
        FloatParameter::new(Self::PITCH_RATIO_ID, "Pitch", 0.25..=4.0, 1.0)
            .with_unit("x")
            .with_scaling(ParameterScaling::Exponential(2.0));
    pub const DENSITY: FloatParameter =
        FloatParameter::new(Self::DENSITY_ID, "Density", 1.0..=100.0, 10.0)
            .with_unit("Hz")
            .with_scaling(ParameterScaling::Exponential(2.0));
    pub const SPRAY: FloatParameter = FloatParameter::new(Self::SPRAY_ID, "Spray", 0.0..=1.0, 0.0);
    pub const MAX_GRAINS: IntegerParameter = IntegerParameter::new(
        Self::MAX_GRAINS_ID,
        "Max Grains",
        3..=Self::MAX_GRAINS_LIMIT as i32,
        50,
    );
    pub const PAN_SPREAD: FloatParameter =
        FloatParameter::new(Self::PAN_SPREAD_ID, "Pan Spread", 0.0..=1.0, 1.0);
    pub const POSITION: FloatParameter =
        FloatParameter::new(Self::POSITION_ID, "Position", 0.0..=1.0, 0.5);

    fn window_shape_parameter() -> EnumParameter {
        EnumParameter::new(Self::WINDOW_SHAPE_ID, "Window", GrainWindowShape::default())
    }

    fn playback_direction_parameter() -> EnumParameter {
        EnumParameter::new(
            Self::PLAYBACK_DIRECTION_ID,
            "Direction",
            GrainPlaybackDirection::default(),
        )
    }

    fn playhead_mode_parameter() -> EnumParameter {
        EnumParameter::new(
            Self::PLAYHEAD_MODE_ID,
            "Playhead",
            GrainPlayheadMode::default(),
        )
    }

    /// Descriptors of all parameters, e.g. to build a host UI or to automate them by id.
    pub fn parameter_descriptors() -> Vec<Box<dyn Parameter>> {
        vec![
            Box::new(Self::GRAIN_DURATION),
            Box::new(Self::PITCH_RATIO),
            Box::new(Self::DENSITY),
            Box::new(Self::SPRAY),
            Box::new(Self::window_shape_parameter()),
            Box::new(Self::MAX_GRAINS),
            Box::new(Self::PAN_SPREAD),
            Box::new(Self::playback_direction_parameter()),
            Box::new(Self::playhead_mode_parameter()),
            Box::new(Self::POSITION),
        ]
    }

    /// Returns true if the given id addresses one of the granular parameters.
    pub fn has_parameter(id: FourCC) -> bool {
        matches!(
            id,
            Self::GRAIN_DURATION_ID
                | Self::PITCH_RATIO_ID
                | Self::DENSITY_ID
                | Self::SPRAY_ID
                | Self::WINDOW_SHAPE_ID
                | Self::MAX_GRAINS_ID
                | Self::PAN_SPREAD_ID
                | Self::PLAYBACK_DIRECTION_ID
                | Self::PLAYHEAD_MODE_ID
                | Self::POSITION_ID
        )
    }

    /// Returns a copy with all values clamped into their valid ranges. NaN values are replaced
    /// with the parameter's default value.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let max_grains = self.max_grains.min(i32::MAX as usize) as i32;
        Self {
            grain_duration: Self::GRAIN_DURATION.clamp_value(self.grain_duration),
            pitch_ratio: Self::PITCH_RATIO.clamp_value(self.pitch_ratio),
            density: Self::DENSITY.clamp_value(self.density),
            spray: Self::SPRAY.clamp_value(self.spray),
            window_shape: self.window_shape,
            max_grains: Self::MAX_GRAINS.clamp_value(max_grains) as usize,
            pan_spread: Self::PAN_SPREAD.clamp_value(self.pan_spread),
            playback_direction: self.playback_direction,
            playhead_mode: self.playhead_mode,
            position: Self::POSITION.clamp_value(self.position),
        }
    }

    /// Apply a single parameter update, addressed by the parameter's id.
    ///
    /// Values are clamped into the parameter's range. Unknown parameter ids and updates with an
    /// unexpected value type are an error and leave all values unchanged.
    ///
    /// Valid updates are applied without allocating, so this can be called in real-time threads.
    pub fn apply_update(&mut self, id: FourCC, update: &ParameterValueUpdate) -> Result<(), Error> {
        let applied = match id {
            Self::GRAIN_DURATION_ID => Self::GRAIN_DURATION
                .value_from_update(update)
                .map(|value| self.grain_duration = value),
            Self::PITCH_RATIO_ID => Self::PITCH_RATIO
                .value_from_update(update)
                .map(|value| self.pitch_ratio = value),
            Self::DENSITY_ID => Self::DENSITY
                .value_from_update(update)
                .map(|value| self.density = value),
            Self::SPRAY_ID => Self::SPRAY
                .value_from_update(update)
                .map(|value| self.spray = value),
            Self::WINDOW_SHAPE_ID => {
                EnumParameter::resolve_update(update, GrainWindowShape::default())
                    .map(|value| self.window_shape = value)
            }
            Self::MAX_GRAINS_ID => Self::MAX_GRAINS
                .value_from_update(update)
                .map(|value| self.max_grains = value as usize),
            Self::PAN_SPREAD_ID => Self::PAN_SPREAD
                .value_from_update(update)
                .map(|value| self.pan_spread = value),
            Self::PLAYBACK_DIRECTION_ID => {
                EnumParameter::resolve_update(update, GrainPlaybackDirection::default())
                    .map(|value| self.playback_direction = value)
            }
            Self::PLAYHEAD_MODE_ID => {
                EnumParameter::resolve_update(update, GrainPlayheadMode::default())
                    .map(|value| self.playhead_mode = value)
            }
            Self::POSITION_ID => Self::POSITION
                .value_from_update(update)
                .map(|value| self.position = value),
            _ => {
                return Err(Error::ParameterError(format!(
                    "Unknown granular parameter: '{id}'"
                )))
            }
        };
        applied.ok_or_else(|| {
            Error::ParameterError(format!(
                "Invalid value for granular parameter '{id}': {update:?}"
            ))
        })
    }
}

impl Default for GranularParameters {
    fn default() -> Self {
        Self {
            grain_duration: Self::GRAIN_DURATION.default_value(),
            pitch_ratio: Self::PITCH_RATIO.default_value(),
            density: Self::DENSITY.default_value(),
            spray: Self::SPRAY.default_value(),
            window_shape: GrainWindowShape::default(),
            max_grains: Self::MAX_GRAINS.default_value() as usize,
            pan_spread: Self::PAN_SPREAD.default_value(),
            playback_direction: GrainPlaybackDirection::default(),
            playhead_mode: GrainPlayheadMode::default(),
            position: Self::POSITION.default_value(),
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let parameters = GranularParameters::default();
        assert_eq!(parameters.grain_duration, 0.1);
        assert_eq!(parameters.pitch_ratio, 1.0);
        assert_eq!(parameters.density, 10.0);
        assert_eq!(parameters.spray, 0.0);
        assert_eq!(parameters.window_shape, GrainWindowShape::CosineHybrid);
        assert_eq!(parameters.max_grains, 50);
        assert_eq!(parameters.clamped(), parameters);
    }

    #[test]
    fn clamping() {
        let parameters = GranularParameters {
            grain_duration: f32::NAN,
            pitch_ratio: f32::INFINITY,
            density: -5.0,
            spray: 2.0,
            max_grains: 1000,
            pan_spread: f32::NEG_INFINITY,
            position: f32::NAN,
            ..Default::default()
        }
        .clamped();
        assert_eq!(parameters.grain_duration, 0.1);
        assert_eq!(parameters.pitch_ratio, 4.0);
        assert_eq!(parameters.density, 1.0);
        assert_eq!(parameters.spray, 1.0);
        assert_eq!(parameters.max_grains, 200);
        assert_eq!(parameters.pan_spread, 0.0);
        assert_eq!(parameters.position, 0.5);

        let parameters = GranularParameters {
            max_grains: 0,
            ..Default::default()
        }
        .clamped();
        assert_eq!(parameters.max_grains, 3);
    }

    #[test]
    fn updates() {
        let mut parameters = GranularParameters::default();

        let (id, update) = GranularParameters::DENSITY.value_update(500.0);
        assert!(parameters.apply_update(id, &update).is_ok());
        assert_eq!(parameters.density, 100.0);

        let (id, update) = GranularParameters::MAX_GRAINS.value_update(7);
        assert!(parameters.apply_update(id, &update).is_ok());
        assert_eq!(parameters.max_grains, 7);

        let update = ParameterValueUpdate::Raw(Box::new(GrainWindowShape::Hann));
        assert!(parameters
            .apply_update(GranularParameters::WINDOW_SHAPE_ID, &update)
            .is_ok());
        assert_eq!(parameters.window_shape, GrainWindowShape::Hann);

        let update = ParameterValueUpdate::Raw(Box::new("Backward"));
        assert!(parameters
            .apply_update(GranularParameters::PLAYBACK_DIRECTION_ID, &update)
            .is_ok());
        assert_eq!(parameters.playback_direction, GrainPlaybackDirection::Backward);

        let update = ParameterValueUpdate::Normalized(1.0);
        assert!(parameters
            .apply_update(GranularParameters::PLAYHEAD_MODE_ID, &update)
            .is_ok());
        assert_eq!(parameters.playhead_mode, GrainPlayheadMode::Manual);

        // invalid value types and names are rejected
        let update = ParameterValueUpdate::Raw(Box::new("fast"));
        assert!(parameters
            .apply_update(GranularParameters::PITCH_RATIO_ID, &update)
            .is_err());
        assert_eq!(parameters.pitch_ratio, 1.0);
        let update = ParameterValueUpdate::Raw(Box::new("Sideways"));
        assert!(parameters
            .apply_update(GranularParameters::PLAYBACK_DIRECTION_ID, &update)
            .is_err());
        assert_eq!(parameters.playback_direction, GrainPlaybackDirection::Backward);

        // unknown ids are not
        let update = ParameterValueUpdate::Normalized(0.5);
        assert!(parameters.apply_update(FourCC(*b"????"), &update).is_err());
    }

    #[test]
    fn descriptors() {
        let descriptors = GranularParameters::parameter_descriptors();
        assert_eq!(descriptors.len(), 10);
        for (index, descriptor) in descriptors.iter().enumerate() {
            assert!(
                descriptors[index + 1..]
                    .iter()
                    .all(|other| other.id() != descriptor.id()),
                "Duplicate parameter id '{}'",
                descriptor.id()
            );
        }
        // every descriptor can be addressed
        assert!(!GranularParameters::has_parameter(FourCC(*b"????")));
        let mut parameters = GranularParameters::default();
        for descriptor in descriptors {
            assert!(GranularParameters::has_parameter(descriptor.id()));
            let update = ParameterValueUpdate::Normalized(0.0);
            assert!(parameters.apply_update(descriptor.id(), &update).is_ok());
        }
        assert_eq!(parameters.max_grains, 3);
        assert_eq!(parameters.grain_duration, 0.01);
    }
}
