//! Grain scheduling, windowing and rendering.

mod grain;
mod parameters;
mod renderer;
mod scheduler;
mod window;

pub(crate) use grain::GrainPool;
pub(crate) use renderer::render_grains;
pub(crate) use scheduler::GrainScheduler;

pub use parameters::{GrainPlaybackDirection, GrainPlayheadMode, GranularParameters};
pub use scheduler::GrainRandom;
pub use window::{generate_window, GrainEnvelope, GrainWindowShape};
