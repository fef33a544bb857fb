use std::{path::Path, time::Duration};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::{engine::GranularEngine, granular::GrainRandom, utils::linear_to_db, Error};

// -------------------------------------------------------------------------------------------------

/// Render the given duration of the engine's output into a stereo wav file.
///
/// * `file_path`: Target file path. Should end with ".wav" extension.
/// * `duration`: Length of the rendered content, rounded up to whole frames.
/// * `block_size`: Size of the render blocks in frames. Grain onsets only depend on the render
///   clock, but pending controller messages apply at block boundaries only.
///
/// Wav files contents are always saved as 32bit floats at the engine's sample rate.
/// Returns the number of written frames.
pub fn bounce_to_wav<R: GrainRandom, P: AsRef<Path>>(
    engine: &mut GranularEngine<R>,
    file_path: P,
    duration: Duration,
    block_size: usize,
) -> Result<u64, Error> {
    if block_size == 0 {
        return Err(Error::ParameterError(
            "wav output block size must be > 0".to_string(),
        ));
    }
    let spec = WavSpec {
        channels: 2,
        sample_rate: engine.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(file_path.as_ref(), spec)?;

    let total_frames = (duration.as_secs_f64() * spec.sample_rate as f64).ceil() as u64;
    log::info!(
        "Writing {:.2} seconds of grains to '{}'...",
        duration.as_secs_f64(),
        file_path.as_ref().display()
    );

    let mut written_frames = 0;
    let mut peak = 0.0f32;
    while written_frames < total_frames {
        let frame_count = (total_frames - written_frames).min(block_size as u64) as usize;
        let (left, right) = engine.render_block(frame_count);
        for (l, r) in left.iter().zip(right) {
            writer.write_sample(*l)?;
            writer.write_sample(*r)?;
            peak = peak.max(l.abs()).max(r.abs());
        }
        written_frames += frame_count as u64;
    }
    writer.finalize()?;

    log::info!(
        "Wrote {written_frames} frames with a peak level of {:.1} dB",
        linear_to_db(peak)
    );
    Ok(written_frames)
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::engine::EngineOptions;

    #[test]
    fn bounce() {
        let options = EngineOptions::default().seed(1).sample_rate(22050);
        let (mut engine, _controller) = GranularEngine::new(options).unwrap();
        let sample = (0..22050).map(|i| (i as f32 * 0.05).sin()).collect::<Vec<_>>();
        engine.load_sample(vec![sample], 22050).unwrap();

        let path = std::env::temp_dir().join(format!("grainstorm-bounce-{}.wav", std::process::id()));
        let frames = bounce_to_wav(&mut engine, &path, Duration::from_millis(500), 512).unwrap();
        assert_eq!(frames, 11025);
        assert_eq!(engine.frames_rendered(), 11025);

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.sample_format, hound::SampleFormat::Float);
        let samples = reader
            .samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(samples.len(), 2 * 11025);
        assert!(samples.iter().any(|v| *v != 0.0));
        assert!(samples.iter().all(|v| v.abs() <= 1.0));

        assert!(bounce_to_wav(&mut engine, &path, Duration::from_millis(10), 0).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
