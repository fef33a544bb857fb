use std::sync::Arc;

use basedrop::{Collector, Owned};
use crossbeam_queue::ArrayQueue;
use four_cc::FourCC;

use crate::{
    granular::GranularParameters, limiter::SoftLimiter, parameter::ParameterValueUpdate,
    sample::SampleBuffer, Error,
};

// -------------------------------------------------------------------------------------------------

/// Messages which get applied by the engine at the start of the next render block.
pub(crate) enum EngineMessage {
    SetParameters(GranularParameters),
    SetParameter(FourCC, Owned<ParameterValueUpdate>),
    SetLimiter(SoftLimiter),
    Reset,
}

impl EngineMessage {
    fn name(&self) -> &'static str {
        match self {
            EngineMessage::SetParameters(_) => "SetParameters",
            EngineMessage::SetParameter(_, _) => "SetParameter",
            EngineMessage::SetLimiter(_) => "SetLimiter",
            EngineMessage::Reset => "Reset",
        }
    }
}

/// A pending sample change. `None` unloads the current sample.
pub(crate) type SampleMessage = Option<Owned<SampleBuffer>>;

// -------------------------------------------------------------------------------------------------

/// Non real-time side of a [`GranularEngine`](crate::GranularEngine).
///
/// Loader or UI threads use the controller to hand new samples and parameter changes over to
/// the engine without blocking the audio thread. All changes apply at the start of the engine's
/// next render block.
///
/// Samples which got replaced in the engine are released by the controller in
/// [`collect_garbage`](Self::collect_garbage), so call it regularly, e.g. from a UI timer.
pub struct EngineController {
    sample_queue: Arc<ArrayQueue<SampleMessage>>,
    message_queue: Arc<ArrayQueue<EngineMessage>>,
    collector: Collector,
}

impl EngineController {
    pub(crate) fn new(
        sample_queue: Arc<ArrayQueue<SampleMessage>>,
        message_queue: Arc<ArrayQueue<EngineMessage>>,
        collector: Collector,
    ) -> Self {
        Self {
            sample_queue,
            message_queue,
            collector,
        }
    }

    /// Validate the given planar sample data and hand it over to the engine.
    ///
    /// The engine swaps its sample at the start of the next block, clearing all playing grains
    /// and moving its write head back to the start of the sample.
    pub fn load_sample(&self, channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<(), Error> {
        let sample = SampleBuffer::new(channels, sample_rate)?;
        self.install_sample(sample);
        Ok(())
    }

    /// Hand over an already validated sample buffer to the engine.
    pub fn install_sample(&self, sample: SampleBuffer) {
        log::info!(
            "Loading sample with {} channel(s), {} frames at {} Hz...",
            sample.channel_count(),
            sample.len(),
            sample.sample_rate()
        );
        let sample = Owned::new(&self.collector.handle(), sample);
        if self.sample_queue.force_push(Some(sample)).is_some() {
            log::debug!("Replaced a pending, not yet installed sample");
        }
    }

    /// Remove the engine's sample. The engine renders silence until a new sample gets loaded.
    pub fn unload_sample(&self) {
        if self.sample_queue.force_push(None).is_some() {
            log::debug!("Replaced a pending, not yet installed sample");
        }
    }

    /// Replace all granular parameters. Values get clamped into their valid ranges.
    pub fn set_parameters(&self, parameters: GranularParameters) {
        self.send(EngineMessage::SetParameters(parameters.clamped()));
    }

    /// Set a single parameter value via the given raw or normalized value update.
    ///
    /// Value update `(id, value)` tuples can be created via the parameter descriptors in
    /// [`GranularParameters`], e.g. `GranularParameters::DENSITY.value_update(20.0)`.
    pub fn set_parameter(
        &self,
        (parameter_id, update): (FourCC, ParameterValueUpdate),
    ) -> Result<(), Error> {
        // resolve on a scratch copy, so the engine only receives applicable updates
        GranularParameters::default().apply_update(parameter_id, &update)?;
        let update = Owned::new(&self.collector.handle(), update);
        self.send(EngineMessage::SetParameter(parameter_id, update));
        Ok(())
    }

    /// Replace the engine's output limiter settings.
    pub fn set_limiter(&self, limiter: SoftLimiter) {
        self.send(EngineMessage::SetLimiter(limiter));
    }

    /// Stop all playing grains and move the engine's write head back to the sample start.
    pub fn reset(&self) {
        self.send(EngineMessage::Reset);
    }

    /// Release samples and parameter values which the engine no longer uses.
    pub fn collect_garbage(&mut self) {
        self.collector.collect();
    }

    fn send(&self, message: EngineMessage) {
        if let Some(displaced) = self.message_queue.force_push(message) {
            log::warn!(
                "Engine message queue is full: dropped a pending '{}' message",
                displaced.name()
            );
        }
    }
}
