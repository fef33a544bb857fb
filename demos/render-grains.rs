//! Renders a grain cloud from a synthetic sample into a wav file.
//!
//! Usage:
//!   cargo run --release --example render-grains -- [OPTIONS]
//!
//! Options:
//!   -o, --output <PATH>      Target wav file (default: grains.wav)
//!   --duration <N>           Duration in seconds (default: 10)
//!   --density <N>            Grains per second (default: 30)
//!   --transpose <N>          Grain transposition in semitones (default: 0)
//!   --spray <N>              Start position jitter in range 0..=1 (default: 0.3)
//!   --seed <N>               Random seed for deterministic renders
//!   -l, --log-level <LEVEL>  Set logging level (debug, info, warn, error)

use std::{f32::consts::PI, path::PathBuf, time::Duration};

use arg::{parse_args, Args};

use grainstorm::{
    output::wav::bounce_to_wav, utils::pitch_ratio_from_semitones, EngineOptions, Error,
    GrainPlaybackDirection, GrainWindowShape, GranularEngine, GranularParameters,
};

// -------------------------------------------------------------------------------------------------

#[cfg(all(debug_assertions, feature = "assert-allocs"))]
#[global_allocator]
static A: assert_no_alloc::AllocDisabler = assert_no_alloc::AllocDisabler;

// -------------------------------------------------------------------------------------------------

const DEFAULT_LOG_LEVEL: log::Level = if cfg!(debug_assertions) {
    log::Level::Debug
} else {
    log::Level::Warn
};

const SAMPLE_RATE: u32 = 44100;
const BLOCK_SIZE: usize = 512;

// -------------------------------------------------------------------------------------------------

/// Arguments for the render-grains demo.
#[derive(Args, Debug)]
struct Arguments {
    #[arg(short = "o", long = "output")]
    /// Target wav file path
    output_path: Option<PathBuf>,
    #[arg(long = "duration")]
    /// Duration in seconds (default: 10)
    duration: Option<f32>,
    #[arg(long = "density")]
    /// Grains per second (default: 30)
    density: Option<f32>,
    #[arg(long = "transpose")]
    /// Grain transposition in semitones (default: 0)
    transpose: Option<f32>,
    #[arg(long = "spray")]
    /// Start position jitter in range 0..=1 (default: 0.3)
    spray: Option<f32>,
    #[arg(long = "seed")]
    /// Random seed for deterministic renders
    seed: Option<u64>,
    #[arg(short = "l", long = "log-level")]
    /// Set logging level
    log_level: Option<log::Level>,
}

// -------------------------------------------------------------------------------------------------

/// Two seconds of a slowly decaying A minor chord with a bit of vibrato.
fn chord_sample(sample_rate: u32) -> Vec<Vec<f32>> {
    let len = 2 * sample_rate as usize;
    let frequencies = [220.0, 261.63, 329.63];
    let mut left = vec![0.0; len];
    let mut right = vec![0.0; len];
    for (index, (l, r)) in left.iter_mut().zip(right.iter_mut()).enumerate() {
        let time = index as f32 / sample_rate as f32;
        let envelope = (-1.2 * time).exp();
        let vibrato = 1.0 + 0.003 * (2.0 * PI * 5.0 * time).sin();
        for (note, frequency) in frequencies.iter().enumerate() {
            let value = (2.0 * PI * frequency * vibrato * time).sin() * envelope * 0.25;
            // spread chord notes in the stereo field
            let pan = note as f32 / (frequencies.len() - 1) as f32;
            *l += value * (1.0 - pan);
            *r += value * pan;
        }
    }
    vec![left, right]
}

// -------------------------------------------------------------------------------------------------

fn main() -> Result<(), Error> {
    let args = parse_args::<Arguments>();

    simple_logger::SimpleLogger::new()
        .with_level(args.log_level.unwrap_or(DEFAULT_LOG_LEVEL).to_level_filter())
        .init()
        .expect("Failed to set logger");

    let mut options = EngineOptions::default()
        .sample_rate(SAMPLE_RATE)
        .max_block_size(BLOCK_SIZE);
    if let Some(seed) = args.seed {
        options = options.seed(seed);
    }
    let (mut engine, mut controller) = GranularEngine::new(options)?;

    // hand sample and parameters over, as a loader or UI thread would do
    controller.load_sample(chord_sample(SAMPLE_RATE), SAMPLE_RATE)?;
    controller.set_parameters(GranularParameters {
        grain_duration: 0.12,
        density: args.density.unwrap_or(30.0),
        pitch_ratio: pitch_ratio_from_semitones(args.transpose.unwrap_or(0.0)),
        spray: args.spray.unwrap_or(0.3),
        window_shape: GrainWindowShape::Hann,
        playback_direction: GrainPlaybackDirection::Random,
        max_grains: 64,
        ..Default::default()
    });

    let output_path = args
        .output_path
        .unwrap_or_else(|| PathBuf::from("grains.wav"));
    let duration = Duration::from_secs_f32(args.duration.unwrap_or(10.0).max(0.0));
    bounce_to_wav(&mut engine, &output_path, duration, BLOCK_SIZE)?;

    controller.collect_garbage();

    println!(
        "Rendered {:.2} seconds of grains into '{}'",
        engine.time(),
        output_path.display()
    );
    Ok(())
}
