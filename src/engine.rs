//! The granular engine: owns sample, grain pool, scheduler and render clock.

use std::{mem, sync::Arc};

use basedrop::{Collector, Handle, Owned};
use crossbeam_queue::ArrayQueue;
use four_cc::FourCC;
use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    granular::{render_grains, GrainPool, GrainRandom, GrainScheduler, GranularParameters},
    limiter::SoftLimiter,
    parameter::ParameterValueUpdate,
    sample::SampleBuffer,
    utils::buffer::{clear_buffer, stereo_to_interleaved},
    Error,
};

mod controller;
pub use controller::EngineController;
use controller::{EngineMessage, SampleMessage};

// -------------------------------------------------------------------------------------------------

/// Options to create a new [`GranularEngine`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// By default 44100. Sample rate of the engine's output in Hz.
    pub sample_rate: u32,

    /// By default 4096. Largest expected block size in frames. Render buffers get preallocated
    /// with this size, so rendering larger blocks will allocate.
    pub max_block_size: usize,

    /// By default None, which seeds the engine's random generator from the OS. Set to render
    /// reproducible grain clouds.
    pub seed: Option<u64>,

    /// By default an enabled limiter with a threshold of 0.7.
    pub limiter: SoftLimiter,

    /// By default 64. Capacity of the controller's message queue. When the queue is full, the
    /// oldest pending message gets dropped.
    pub message_queue_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            max_block_size: 4096,
            seed: None,
            limiter: SoftLimiter::default(),
            message_queue_size: 64,
        }
    }
}

impl EngineOptions {
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn limiter(mut self, limiter: SoftLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn message_queue_size(mut self, size: usize) -> Self {
        self.message_queue_size = size;
        self
    }

    /// Validate all options. Returns Error::ParameterError on errors.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sample_rate == 0 {
            return Err(Error::ParameterError(
                "engine options 'sample_rate' must be > 0".to_string(),
            ));
        }
        if self.max_block_size == 0 {
            return Err(Error::ParameterError(
                "engine options 'max_block_size' must be > 0".to_string(),
            ));
        }
        if self.message_queue_size == 0 {
            return Err(Error::ParameterError(
                "engine options 'message_queue_size' must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

/// Real-time granular synthesis engine.
///
/// Continuously renders a stereo stream of short, overlapping, windowed grains which are read
/// from the loaded sample at the current [`GranularParameters`].
///
/// The engine is meant to be owned by the audio thread. Use the [`EngineController`] returned
/// on creation to change samples and parameters from other threads. When engine and caller
/// share a thread, the engine's own setters can be used instead.
///
/// Rendering never allocates, locks or blocks, as long as blocks don't exceed the configured
/// [`max_block_size`](EngineOptions::max_block_size).
pub struct GranularEngine<R: GrainRandom = SmallRng> {
    sample_rate: u32,
    max_block_size: usize,
    sample: Option<Owned<SampleBuffer>>,
    parameters: GranularParameters,
    limiter: SoftLimiter,
    pool: GrainPool,
    scheduler: GrainScheduler,
    random: R,
    frames_rendered: u64,
    left_buffer: Vec<f32>,
    right_buffer: Vec<f32>,
    sample_queue: Arc<ArrayQueue<SampleMessage>>,
    message_queue: Arc<ArrayQueue<EngineMessage>>,
    collector_handle: Handle,
}

impl GranularEngine<SmallRng> {
    /// Create a new engine and its controller with the given options.
    pub fn new(options: EngineOptions) -> Result<(Self, EngineController), Error> {
        let random = match options.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::with_random(options, random)
    }
}

impl<R: GrainRandom> GranularEngine<R> {
    /// Create a new engine and its controller with a custom random number source.
    pub fn with_random(
        options: EngineOptions,
        random: R,
    ) -> Result<(Self, EngineController), Error> {
        options.validate()?;

        let collector = Collector::new();
        let collector_handle = collector.handle();
        let sample_queue = Arc::new(ArrayQueue::new(1));
        let message_queue = Arc::new(ArrayQueue::new(options.message_queue_size));

        log::info!(
            "Creating granular engine at {} Hz with a max block size of {} frames",
            options.sample_rate,
            options.max_block_size
        );
        let engine = Self {
            sample_rate: options.sample_rate,
            max_block_size: options.max_block_size,
            sample: None,
            parameters: GranularParameters::default(),
            limiter: options.limiter,
            pool: GrainPool::new(GranularParameters::MAX_GRAINS_LIMIT),
            scheduler: GrainScheduler::new(),
            random,
            frames_rendered: 0,
            left_buffer: vec![0.0; options.max_block_size],
            right_buffer: vec![0.0; options.max_block_size],
            sample_queue: Arc::clone(&sample_queue),
            message_queue: Arc::clone(&message_queue),
            collector_handle,
        };
        let controller = EngineController::new(sample_queue, message_queue, collector);
        Ok((engine, controller))
    }

    /// The engine's output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The engine's preallocated render block size in frames.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// The currently installed sample, if any.
    pub fn sample(&self) -> Option<&SampleBuffer> {
        self.sample.as_deref()
    }

    /// Validate the given planar sample data and install it as new source sample.
    ///
    /// Replaces the current sample, clears all playing grains and moves the write head back
    /// to the start of the new sample.
    pub fn load_sample(&mut self, channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<(), Error> {
        let sample = SampleBuffer::new(channels, sample_rate)?;
        log::info!(
            "Loading sample with {} channel(s), {} frames at {} Hz...",
            sample.channel_count(),
            sample.len(),
            sample.sample_rate()
        );
        self.install_sample(sample);
        Ok(())
    }

    /// Install an already validated sample buffer as new source sample.
    pub fn install_sample(&mut self, sample: SampleBuffer) {
        let sample = Owned::new(&self.collector_handle, sample);
        self.replace_sample(Some(sample));
    }

    /// Remove the current sample. The engine renders silence until a new sample gets loaded.
    pub fn unload_sample(&mut self) {
        self.replace_sample(None);
    }

    /// The current, clamped granular parameters.
    pub fn parameters(&self) -> &GranularParameters {
        &self.parameters
    }

    /// Replace all granular parameters. Values get clamped into their valid ranges, NaN values
    /// fall back to the parameter defaults.
    ///
    /// Playing grains keep their duration and envelope. Pitch changes apply immediately.
    pub fn set_parameters(&mut self, parameters: GranularParameters) {
        self.parameters = parameters.clamped();
    }

    /// Set a single parameter value via the given raw or normalized value update.
    pub fn set_parameter(&mut self, id: FourCC, update: &ParameterValueUpdate) -> Result<(), Error> {
        self.parameters.apply_update(id, update)
    }

    /// The output limiter settings.
    pub fn limiter(&self) -> &SoftLimiter {
        &self.limiter
    }

    pub fn set_limiter(&mut self, limiter: SoftLimiter) {
        self.limiter = limiter;
    }

    /// Stop all playing grains and move the write head back to the start of the sample.
    /// The render clock keeps running.
    pub fn reset(&mut self) {
        self.pool.clear();
        self.scheduler.reset();
    }

    /// Number of currently playing grains.
    pub fn active_grain_count(&self) -> usize {
        self.pool.len()
    }

    /// Number of output frames rendered so far.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Render clock position in seconds.
    pub fn time(&self) -> f64 {
        self.frames_rendered as f64 / self.sample_rate as f64
    }

    /// Render the next block of `frame_count` stereo frames into the engine's internal buffers
    /// and return them as `(left, right)` slices.
    ///
    /// A `frame_count` of 0 is a no-op: pending controller messages stay pending and the clock
    /// doesn't move.
    pub fn render_block(&mut self, frame_count: usize) -> (&[f32], &[f32]) {
        if frame_count == 0 {
            return (&[], &[]);
        }
        if self.left_buffer.len() < frame_count {
            log::warn!(
                "Render block size {frame_count} exceeds the engine's max block size {}",
                self.max_block_size
            );
            self.left_buffer.resize(frame_count, 0.0);
            self.right_buffer.resize(frame_count, 0.0);
        }
        let mut left = mem::take(&mut self.left_buffer);
        let mut right = mem::take(&mut self.right_buffer);
        self.render_into(&mut left[..frame_count], &mut right[..frame_count]);
        self.left_buffer = left;
        self.right_buffer = right;
        (
            &self.left_buffer[..frame_count],
            &self.right_buffer[..frame_count],
        )
    }

    /// Render the next block into the given planar stereo buffers. Renders as many frames as
    /// fit into both buffers.
    pub fn render_into(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frame_count = left.len().min(right.len());
        if frame_count == 0 {
            return;
        }
        let (left, right) = (&mut left[..frame_count], &mut right[..frame_count]);
        Self::assert_no_alloc(|| {
            self.process_messages();

            let now = self.frames_rendered as f64;
            if let Some(sample) = self.sample.as_deref() {
                self.scheduler.schedule(
                    now,
                    now + frame_count as f64,
                    self.sample_rate,
                    sample,
                    &self.parameters,
                    &mut self.pool,
                    &mut self.random,
                );
                render_grains(
                    &mut self.pool,
                    sample,
                    now,
                    self.sample_rate,
                    self.parameters.pitch_ratio,
                    left,
                    right,
                );
                self.scheduler
                    .advance_write_head(frame_count, self.sample_rate, sample);
            } else {
                clear_buffer(left);
                clear_buffer(right);
            }

            self.limiter.process(left);
            self.limiter.process(right);
            self.frames_rendered += frame_count as u64;
        })
    }

    /// Render into the given interleaved buffer with `channel_count` channels, in blocks of at
    /// most [`max_block_size`](Self::max_block_size) frames.
    ///
    /// Mono outputs receive a downmix of the stereo signal. Outputs with more than two channels
    /// get the stereo signal in their first two channels and silence in all others.
    pub fn render_interleaved(
        &mut self,
        output: &mut [f32],
        channel_count: usize,
    ) -> Result<(), Error> {
        if channel_count == 0 {
            return Err(Error::ParameterError(
                "output channel count must be > 0".to_string(),
            ));
        }
        let block_size = self.max_block_size;
        for block in output.chunks_mut(block_size * channel_count) {
            let frame_count = block.len() / channel_count;
            let (left, right) = self.render_block(frame_count);
            stereo_to_interleaved(left, right, block, channel_count);
        }
        Ok(())
    }

    fn replace_sample(&mut self, sample: Option<Owned<SampleBuffer>>) {
        // dropping the replaced sample only queues it for the collector
        self.sample = sample;
        self.pool.clear();
        self.scheduler.reset();
    }

    fn process_messages(&mut self) {
        if let Some(sample) = self.sample_queue.pop() {
            self.replace_sample(sample);
        }
        while let Some(message) = self.message_queue.pop() {
            match message {
                EngineMessage::SetParameters(parameters) => {
                    self.parameters = parameters.clamped();
                }
                EngineMessage::SetParameter(id, update) => {
                    // the controller only sends updates which resolve without errors
                    let _ = self.parameters.apply_update(id, &update);
                }
                EngineMessage::SetLimiter(limiter) => {
                    self.limiter = limiter;
                }
                EngineMessage::Reset => {
                    self.reset();
                }
            }
        }
    }

    fn assert_no_alloc<T, F: FnOnce() -> T>(func: F) -> T {
        #[cfg(feature = "assert-allocs")]
        return assert_no_alloc::assert_no_alloc::<T, F>(func);

        #[cfg(not(feature = "assert-allocs"))]
        return func();
    }
}

// -------------------------------------------------------------------------------------------------
