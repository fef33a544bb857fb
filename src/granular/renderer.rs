use super::grain::GrainPool;
use crate::sample::SampleBuffer;

// -------------------------------------------------------------------------------------------------

/// Mix all active grains of the pool into the given stereo buffers, which get cleared first.
///
/// `now` is the render clock position of the first output frame, in output frames. Grains which
/// start later in the block are skipped until their onset. Grains which exceed their duration
/// get expired and are removed from the pool before returning.
///
/// The `pitch_ratio` is applied to all grains, so pitch changes are audible immediately, also
/// for grains which are already playing.
pub(crate) fn render_grains(
    pool: &mut GrainPool,
    sample: &SampleBuffer,
    now: f64,
    output_sample_rate: u32,
    pitch_ratio: f32,
    left: &mut [f32],
    right: &mut [f32],
) {
    debug_assert_eq!(left.len(), right.len(), "Expecting equally sized buffers");
    left.fill(0.0);
    right.fill(0.0);

    let rate_ratio = sample.sample_rate() as f64 / output_sample_rate as f64;
    let speed = pitch_ratio as f64 * rate_ratio;

    pool.for_each_active_mut(|grain| {
        let envelope = *grain.envelope();
        let (left_gain, right_gain) = grain.gains();
        let step = grain.direction() * speed;
        let first_frame = (grain.start_frame() - now).ceil().max(0.0) as usize;

        for (frame, (left, right)) in left
            .iter_mut()
            .zip(right.iter_mut())
            .enumerate()
            .skip(first_frame)
        {
            let age = now + frame as f64 - grain.start_frame();
            if age < 0.0 {
                continue;
            }
            if age > grain.duration_frames() {
                grain.expire();
                break;
            }
            let window_index = age as usize;
            if window_index >= envelope.len() {
                continue;
            }
            let window = envelope.value(window_index);
            let position = grain.source_position() + age * step;
            let (left_value, right_value) = sample.interpolated(position);
            *left += left_value * window * left_gain;
            *right += right_value * window * right_gain;
        }
    });

    pool.retain_active();
}

// -------------------------------------------------------------------------------------------------
