#![doc = include_str!("../README.md")]

// private mods (will be partly re-exported)
mod engine;
mod error;
mod granular;
mod limiter;
mod sample;

// public, flat re-exports
pub use error::Error;

pub use engine::{EngineController, EngineOptions, GranularEngine};
pub use granular::{
    generate_window, GrainEnvelope, GrainPlaybackDirection, GrainPlayheadMode, GrainRandom,
    GrainWindowShape, GranularParameters,
};
pub use limiter::SoftLimiter;
pub use sample::SampleBuffer;

// public mods
pub mod output;
pub mod parameter;
pub mod utils;

pub use parameter::{Parameter, ParameterScaling, ParameterType, ParameterValueUpdate};
