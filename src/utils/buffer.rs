// -------------------------------------------------------------------------------------------------

/// Fill the given buffer with silence.
#[inline]
pub fn clear_buffer(buffer: &mut [f32]) {
    buffer.fill(0.0);
}

// -------------------------------------------------------------------------------------------------

/// Copy the given planar stereo buffers into an interleaved buffer with `channel_count`
/// channels.
///
/// Mono outputs receive a downmix of both channels. Outputs with more than two channels receive
/// the stereo signal in their first two channels, all other channels are cleared. Copies as many
/// frames as fit into both, the planar and the interleaved buffers.
pub fn stereo_to_interleaved(
    left: &[f32],
    right: &[f32],
    interleaved: &mut [f32],
    channel_count: usize,
) {
    match channel_count {
        0 => (),
        1 => {
            for (o, (l, r)) in interleaved.iter_mut().zip(left.iter().zip(right)) {
                *o = (*l + *r) * 0.5;
            }
        }
        2 => {
            for (frame, (l, r)) in interleaved
                .chunks_exact_mut(2)
                .zip(left.iter().zip(right))
            {
                frame[0] = *l;
                frame[1] = *r;
            }
        }
        _ => {
            for (frame, (l, r)) in interleaved
                .chunks_exact_mut(channel_count)
                .zip(left.iter().zip(right))
            {
                frame[0] = *l;
                frame[1] = *r;
                clear_buffer(&mut frame[2..]);
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Copy the given interleaved buffer into a planar one.
/// The planar buffer's layout defines layout of the interleaved buffer (channel and frame count).
pub fn interleaved_to_planar(interleaved: &[f32], planar: &mut [Vec<f32>]) {
    let channel_count = planar.len();
    match channel_count {
        0 => (),
        1 => {
            for (p, i) in planar[0].iter_mut().zip(interleaved) {
                *p = *i;
            }
        }
        _ => {
            for (channel_index, channel_values) in planar.iter_mut().enumerate() {
                for (frame_index, value) in channel_values.iter_mut().enumerate() {
                    *value = interleaved[frame_index * channel_count + channel_index];
                }
            }
        }
    }
}

// -------------------------------------------------------------------------------------------------
