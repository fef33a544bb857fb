//! Immutable mono or stereo source sample, which grains read from.

use assume::assume;

use crate::{utils::buffer::interleaved_to_planar, Error};

// -------------------------------------------------------------------------------------------------

/// A decoded, planar mono or stereo audio sample with its sample rate.
///
/// Sample buffers are immutable: the engine replaces them wholesale when a new sample gets
/// loaded. Non-finite sample values are replaced with silence when creating the buffer, so the
/// render path never has to deal with them.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    left: Box<[f32]>,
    right: Option<Box<[f32]>>,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Create a new sample buffer from one or two planar channels.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self, Error> {
        if sample_rate == 0 {
            return Err(Error::SampleError("sample rate must be > 0".to_string()));
        }
        let mut channels = channels.into_iter();
        let (left, right) = match (channels.next(), channels.next(), channels.next()) {
            (Some(left), right, None) => (left, right),
            (None, _, _) => {
                return Err(Error::SampleError("sample has no channels".to_string()));
            }
            (Some(_), _, Some(_)) => {
                return Err(Error::SampleError(format!(
                    "only mono or stereo samples are supported, got {} channels",
                    3 + channels.len()
                )));
            }
        };
        if left.is_empty() {
            return Err(Error::SampleError("sample is empty".to_string()));
        }
        if let Some(right) = &right {
            if right.len() != left.len() {
                return Err(Error::SampleError(format!(
                    "channel lengths differ: {} vs. {} frames",
                    left.len(),
                    right.len()
                )));
            }
        }
        Ok(Self {
            left: Self::sanitized(left),
            right: right.map(Self::sanitized),
            sample_rate,
        })
    }

    /// Create a new sample buffer from an interleaved mono or stereo buffer.
    pub fn from_interleaved(
        interleaved: &[f32],
        channel_count: usize,
        sample_rate: u32,
    ) -> Result<Self, Error> {
        match channel_count {
            1 => Self::new(vec![interleaved.to_vec()], sample_rate),
            2 => {
                if interleaved.len() % 2 != 0 {
                    return Err(Error::SampleError(
                        "interleaved stereo buffer has an odd sample count".to_string(),
                    ));
                }
                let mut planar = vec![vec![0.0; interleaved.len() / 2]; 2];
                interleaved_to_planar(interleaved, &mut planar);
                Self::new(planar, sample_rate)
            }
            _ => Err(Error::SampleError(format!(
                "only mono or stereo samples are supported, got {channel_count} channels"
            ))),
        }
    }

    fn sanitized(channel: Vec<f32>) -> Box<[f32]> {
        let mut channel = channel.into_boxed_slice();
        let mut replaced = 0;
        for sample in channel.iter_mut() {
            if !sample.is_finite() {
                *sample = 0.0;
                replaced += 1;
            }
        }
        if replaced > 0 {
            log::warn!("Replaced {replaced} non-finite sample values with silence");
        }
        channel
    }

    /// Number of sample frames. Always > 0.
    #[inline]
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Always false: empty samples are rejected on creation.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// 1 for mono, 2 for stereo samples.
    pub fn channel_count(&self) -> usize {
        if self.right.is_some() {
            2
        } else {
            1
        }
    }

    /// The sample's sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// The sample's duration in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Access a single channel's samples. Returns `None` for invalid channel indices.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        match index {
            0 => Some(&self.left),
            1 => self.right.as_deref(),
            _ => None,
        }
    }

    /// Read a frame at the given fractional sample position with linear interpolation.
    ///
    /// Positions wrap around the sample's length in both directions. Returns a
    /// `(left, right)` pair; mono samples return the same value for both sides.
    #[inline]
    pub fn interpolated(&self, position: f64) -> (f32, f32) {
        let len = self.left.len();
        assume!(unsafe: len > 0, "Buffer len is asserted in constructor");

        let floor = position.floor();
        let fraction = (position - floor) as f32;
        let index = (floor as i64).rem_euclid(len as i64) as usize;
        let next_index = if index + 1 < len { index + 1 } else { 0 };

        assume!(unsafe: index < len);
        assume!(unsafe: next_index < len);
        let left = self.left[index] + (self.left[next_index] - self.left[index]) * fraction;
        if let Some(right) = &self.right {
            assume!(unsafe: right.len() == len, "Channel lengths are asserted in constructor");
            let right = right[index] + (right[next_index] - right[index]) * fraction;
            (left, right)
        } else {
            (left, left)
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation() {
        assert!(SampleBuffer::new(vec![], 44100).is_err());
        assert!(SampleBuffer::new(vec![vec![]], 44100).is_err());
        assert!(SampleBuffer::new(vec![vec![0.0; 4]], 0).is_err());
        assert!(SampleBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 44100).is_err());
        assert!(SampleBuffer::new(vec![vec![0.0; 4]; 3], 44100).is_err());

        let mono = SampleBuffer::new(vec![vec![0.0; 4]], 44100).unwrap();
        assert_eq!(mono.channel_count(), 1);
        assert_eq!(mono.len(), 4);
        assert!(mono.channel(1).is_none());

        let stereo = SampleBuffer::new(vec![vec![0.0; 4], vec![1.0; 4]], 48000).unwrap();
        assert_eq!(stereo.channel_count(), 2);
        assert_eq!(stereo.sample_rate(), 48000);
        assert_eq!(stereo.channel(1), Some([1.0; 4].as_slice()));
    }

    #[test]
    fn non_finite_values() {
        let sample =
            SampleBuffer::new(vec![vec![f32::NAN, 0.5, f32::INFINITY, -0.5]], 44100).unwrap();
        assert_eq!(sample.channel(0), Some([0.0, 0.5, 0.0, -0.5].as_slice()));
    }

    #[test]
    fn interleaved() {
        let sample = SampleBuffer::from_interleaved(&[1.0, 2.0, 3.0, 4.0], 2, 44100).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.channel(0), Some([1.0, 3.0].as_slice()));
        assert_eq!(sample.channel(1), Some([2.0, 4.0].as_slice()));

        assert!(SampleBuffer::from_interleaved(&[1.0, 2.0, 3.0], 2, 44100).is_err());
        assert!(SampleBuffer::from_interleaved(&[1.0, 2.0, 3.0], 3, 44100).is_err());
    }

    #[test]
    fn interpolation() {
        let sample = SampleBuffer::new(vec![vec![0.0, 1.0, 0.5, -1.0]], 44100).unwrap();
        assert_eq!(sample.interpolated(1.0), (1.0, 1.0));
        assert_eq!(sample.interpolated(0.5), (0.5, 0.5));
        assert!((sample.interpolated(1.25).0 - 0.875).abs() < 1e-6);
        // wraps from the last to the first frame
        assert!((sample.interpolated(3.5).0 - -0.5).abs() < 1e-6);
        // wraps in both directions
        assert_eq!(sample.interpolated(5.0), sample.interpolated(1.0));
        assert_eq!(sample.interpolated(-3.0), sample.interpolated(1.0));
        assert!((sample.interpolated(-0.5).0 - -0.5).abs() < 1e-6);

        let stereo = SampleBuffer::new(vec![vec![0.0, 1.0], vec![1.0, 0.0]], 44100).unwrap();
        let (left, right) = stereo.interpolated(0.25);
        assert!((left - 0.25).abs() < 1e-6);
        assert!((right - 0.75).abs() < 1e-6);
    }
}
