//! Decides when new grains start and where in the source they read from.

use super::{
    grain::{Grain, GrainPool},
    parameters::{GrainPlaybackDirection, GrainPlayheadMode, GranularParameters},
    window::GrainEnvelope,
};
use crate::sample::SampleBuffer;

// -------------------------------------------------------------------------------------------------

/// Random number source for grain jitter.
///
/// Implemented for all [`rand::Rng`]s. Engines use a seedable `SmallRng` by default, so renders
/// are reproducible when the engine gets created with a fixed seed.
pub trait GrainRandom: Send {
    /// Returns a uniformly distributed value in range `[min, max)`, or `min` when the range
    /// is empty.
    fn uniform(&mut self, min: f32, max: f32) -> f32;
}

impl<R: rand::Rng + Send> GrainRandom for R {
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        if min < max {
            self.random_range(min..max)
        } else {
            min
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Spawns new grains at an even rate and tracks the write head which moves through the source
/// sample in real time.
///
/// All times are measured in output sample frames on the engine's render clock.
#[derive(Debug, Clone, Default)]
pub(crate) struct GrainScheduler {
    /// Onset of the most recently scheduled grain, including dropped ones.
    last_grain_frame: Option<f64>,
    /// Current play-through position in source sample frames.
    write_head: f64,
}

impl GrainScheduler {
    /// Relative duration jitter range of new grains.
    const DURATION_JITTER: (f32, f32) = (0.8, 1.2);

    pub fn new() -> Self {
        Self::default()
    }

    /// Onset of the most recently scheduled grain, if any.
    #[cfg(test)]
    pub fn last_grain_frame(&self) -> Option<f64> {
        self.last_grain_frame
    }

    /// Current play-through position in source frames.
    #[cfg(test)]
    pub fn write_head(&self) -> f64 {
        self.write_head
    }

    /// Forget all scheduling state and move the write head back to the start of the sample.
    pub fn reset(&mut self) {
        self.last_grain_frame = None;
        self.write_head = 0.0;
    }

    /// Spawn all grains with an onset up to `block_end`, the first frame after the block
    /// starting at `now`. Grains which don't fit into the pool are dropped, but still count as
    /// scheduled, so the grain rate stays steady when the pool frees up again.
    ///
    /// Returns the number of spawned grains.
    #[allow(clippy::too_many_arguments)]
    pub fn schedule<R: GrainRandom + ?Sized>(
        &mut self,
        now: f64,
        block_end: f64,
        output_sample_rate: u32,
        sample: &SampleBuffer,
        parameters: &GranularParameters,
        pool: &mut GrainPool,
        random: &mut R,
    ) -> usize {
        let output_sample_rate = output_sample_rate as f64;
        let grain_interval = output_sample_rate / parameters.density as f64;

        // the first grain after a reset starts right away. never schedule grains in the past
        // when the density got raised.
        let last_grain_frame = self
            .last_grain_frame
            .unwrap_or(now - grain_interval)
            .max(now - grain_interval);

        let grain_count = ((block_end - last_grain_frame) / grain_interval).floor().max(0.0);
        let spawn_count = (grain_count as usize).min(pool.free_slots(parameters.max_grains));
        self.last_grain_frame = Some(last_grain_frame + grain_count * grain_interval);

        let sample_len = sample.len() as f64;
        let rate_ratio = sample.sample_rate() as f64 / output_sample_rate;
        let center = match parameters.playhead_mode {
            GrainPlayheadMode::PlayThrough => self.write_head,
            GrainPlayheadMode::Manual => parameters.position as f64 * sample_len,
        };

        let mut spawned = 0;
        for index in 0..spawn_count {
            let start_frame = last_grain_frame + (index + 1) as f64 * grain_interval;

            let (jitter_min, jitter_max) = Self::DURATION_JITTER;
            let duration = parameters.grain_duration * random.uniform(jitter_min, jitter_max);
            let duration_frames = (duration as f64 * output_sample_rate).round();

            let grain_source_frames = duration_frames * rate_ratio;
            let spray_offset =
                parameters.spray as f64 * grain_source_frames * random.uniform(-1.0, 1.0) as f64;
            let source_position = (center + spray_offset).rem_euclid(sample_len);

            let pan = parameters.pan_spread * random.uniform(-1.0, 1.0);

            let reverse = match parameters.playback_direction {
                GrainPlaybackDirection::Forward => false,
                GrainPlaybackDirection::Backward => true,
                GrainPlaybackDirection::Random => random.uniform(0.0, 1.0) < 0.5,
            };

            let envelope = GrainEnvelope::new(parameters.window_shape, duration_frames as usize);
            let grain = Grain::new(
                start_frame,
                duration_frames,
                source_position,
                reverse,
                pan,
                envelope,
            );
            if pool.spawn(grain) {
                spawned += 1;
            }
        }
        spawned
    }

    /// Move the write head forward by the given number of output frames, wrapping around the
    /// end of the sample.
    pub fn advance_write_head(
        &mut self,
        frame_count: usize,
        output_sample_rate: u32,
        sample: &SampleBuffer,
    ) {
        let rate_ratio = sample.sample_rate() as f64 / output_sample_rate as f64;
        self.write_head =
            (self.write_head + frame_count as f64 * rate_ratio).rem_euclid(sample.len() as f64);
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use rand::{rngs::SmallRng, SeedableRng};

    /// Always picks the center of the requested range.
    struct CenteredRandom;

    impl GrainRandom for CenteredRandom {
        fn uniform(&mut self, min: f32, max: f32) -> f32 {
            (min + max) / 2.0
        }
    }

    const RATE: u32 = 44100;

    fn sample(seconds: f64, sample_rate: u32) -> SampleBuffer {
        let len = (seconds * sample_rate as f64) as usize;
        SampleBuffer::new(vec![vec![0.0; len]], sample_rate).unwrap()
    }

    fn run_blocks<R: GrainRandom>(
        scheduler: &mut GrainScheduler,
        pool: &mut GrainPool,
        sample: &SampleBuffer,
        parameters: &GranularParameters,
        random: &mut R,
        block_size: usize,
        block_count: usize,
    ) -> usize {
        let mut spawned = 0;
        for block in 0..block_count {
            let now = (block * block_size) as f64;
            let block_end = now + block_size as f64;
            spawned += scheduler.schedule(now, block_end, RATE, sample, parameters, pool, random);
            scheduler.advance_write_head(block_size, RATE, sample);
        }
        spawned
    }

    #[test]
    fn first_grain_starts_immediately() {
        let sample = sample(1.0, RATE);
        let parameters = GranularParameters::default();
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);

        let spawned = scheduler.schedule(
            0.0,
            441.0,
            RATE,
            &sample,
            &parameters,
            &mut pool,
            &mut CenteredRandom,
        );
        assert_eq!(spawned, 1);
        let grain = pool.active_grains().next().unwrap();
        assert_eq!(grain.start_frame(), 0.0);
        assert_eq!(grain.duration_frames(), 4410.0);
        assert_eq!(grain.envelope().len(), 4410);
        assert_eq!(grain.source_position(), 0.0);
        assert_eq!(grain.gains(), (0.5, 0.5));
        assert_eq!(grain.direction(), 1.0);
    }

    #[test]
    fn even_spacing() {
        let sample = sample(2.0, RATE);
        let parameters = GranularParameters {
            density: 20.0,
            max_grains: 200,
            ..Default::default()
        };
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);
        let mut random = SmallRng::seed_from_u64(0x1234);

        // one second in blocks of 10 ms
        let spawned = run_blocks(
            &mut scheduler,
            &mut pool,
            &sample,
            &parameters,
            &mut random,
            441,
            100,
        );
        // onsets at 0, 2205, ... 44100
        assert_eq!(spawned, 21);
        let starts = pool.active_grains().map(|g| g.start_frame()).collect::<Vec<_>>();
        for (index, start) in starts.iter().enumerate() {
            assert!((start - index as f64 * 2205.0).abs() < 1e-6);
        }
        assert_eq!(scheduler.last_grain_frame(), Some(44100.0));
    }

    #[test]
    fn pool_overflow_drops_grains() {
        let sample = sample(1.0, RATE);
        let parameters = GranularParameters {
            density: 100.0,
            max_grains: 3,
            ..Default::default()
        };
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);
        let mut random = SmallRng::seed_from_u64(0x1234);

        let spawned = scheduler.schedule(
            0.0,
            4410.0,
            RATE,
            &sample,
            &parameters,
            &mut pool,
            &mut random,
        );
        assert_eq!(spawned, 3);
        assert_eq!(pool.len(), 3);
        // dropped grains still advance the schedule
        assert_eq!(scheduler.last_grain_frame(), Some(4410.0));

        let spawned = scheduler.schedule(
            4410.0,
            8820.0,
            RATE,
            &sample,
            &parameters,
            &mut pool,
            &mut random,
        );
        assert_eq!(spawned, 0);
        assert_eq!(pool.len(), 3);
        assert_eq!(scheduler.last_grain_frame(), Some(8820.0));
    }

    #[test]
    fn density_changes_never_schedule_into_the_past() {
        let sample = sample(1.0, RATE);
        let mut parameters = GranularParameters {
            density: 1.0,
            max_grains: 200,
            ..Default::default()
        };
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);
        let mut random = SmallRng::seed_from_u64(0x1234);

        let spawned = run_blocks(
            &mut scheduler,
            &mut pool,
            &sample,
            &parameters,
            &mut random,
            4410,
            5,
        );
        assert_eq!(spawned, 1);

        parameters.density = 100.0;
        pool.clear();
        let now = 5.0 * 4410.0;
        let spawned = scheduler.schedule(
            now,
            now + 441.0,
            RATE,
            &sample,
            &parameters,
            &mut pool,
            &mut random,
        );
        // onsets at the block start and the block end
        assert_eq!(spawned, 2);
        assert!(pool.active_grains().all(|g| g.start_frame() >= now));
    }

    #[test]
    fn jitter_ranges() {
        let sample = sample(10.0, RATE);
        let parameters = GranularParameters {
            density: 100.0,
            spray: 1.0,
            pan_spread: 0.5,
            max_grains: 200,
            playback_direction: GrainPlaybackDirection::Random,
            playhead_mode: GrainPlayheadMode::Manual,
            position: 0.5,
            ..Default::default()
        };
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);
        let mut random = SmallRng::seed_from_u64(0x1234);

        let spawned = run_blocks(
            &mut scheduler,
            &mut pool,
            &sample,
            &parameters,
            &mut random,
            441,
            100,
        );
        assert_eq!(spawned, 101);

        let center = sample.len() as f64 * 0.5;
        let (mut reversed, mut before_center, mut after_center) = (0, 0, 0);
        for grain in pool.active_grains() {
            let duration = grain.duration_frames();
            assert!((3528.0..=5292.0).contains(&duration));
            let offset = grain.source_position() - center;
            assert!(offset.abs() <= duration);
            if offset < 0.0 {
                before_center += 1;
            } else if offset > 0.0 {
                after_center += 1;
            }
            let (left_gain, right_gain) = grain.gains();
            assert!((right_gain - left_gain).abs() <= 0.5 + 1e-6);
            if grain.direction() < 0.0 {
                reversed += 1;
            }
        }
        assert!(reversed > 20 && reversed < 80, "{reversed}");
        // spray scatters grains on both sides of the center
        assert!(before_center > 25, "{before_center}");
        assert!(after_center > 25, "{after_center}");

        // without spray, all grains start right at the center
        let parameters = GranularParameters {
            spray: 0.0,
            ..parameters
        };
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);
        let spawned = run_blocks(
            &mut scheduler,
            &mut pool,
            &sample,
            &parameters,
            &mut random,
            441,
            10,
        );
        assert_eq!(spawned, 11);
        assert!(pool
            .active_grains()
            .all(|grain| grain.source_position() == center));
    }

    #[test]
    fn write_head() {
        // source at half the output rate: the write head moves at half speed
        let sample = SampleBuffer::new(vec![vec![0.0; 1000]], 22050).unwrap();
        let mut scheduler = GrainScheduler::new();
        scheduler.advance_write_head(441, RATE, &sample);
        assert_eq!(scheduler.write_head(), 220.5);
        for _ in 0..9 {
            scheduler.advance_write_head(441, RATE, &sample);
        }
        assert!((scheduler.write_head() - 205.0).abs() < 1e-9);

        scheduler.reset();
        assert_eq!(scheduler.write_head(), 0.0);
        assert_eq!(scheduler.last_grain_frame(), None);
    }

    #[test]
    fn play_through_follows_write_head() {
        let sample = sample(1.0, RATE);
        let parameters = GranularParameters::default();
        let mut scheduler = GrainScheduler::new();
        let mut pool = GrainPool::new(200);

        // the second grain gets scheduled in the block which starts at frame 3969
        run_blocks(
            &mut scheduler,
            &mut pool,
            &sample,
            &parameters,
            &mut CenteredRandom,
            441,
            11,
        );
        let positions = pool
            .active_grains()
            .map(|g| g.source_position())
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![0.0, 3969.0]);
    }
}
