pub mod buffer;

// -------------------------------------------------------------------------------------------------

const MINUS_INF_IN_DB: f32 = -200.0f32;

// -------------------------------------------------------------------------------------------------

/// Convert a transposition in semitones to a grain pitch ratio.
///
/// +12 semitones doubles, -12 semitones halves the playback speed.
pub fn pitch_ratio_from_semitones(semitones: f32) -> f32 {
    2.0f32.powf(semitones / 12.0)
}

/// Convert a grain pitch ratio to a transposition in semitones. Non-positive ratios are invalid
/// and yield 0 semitones.
pub fn semitones_from_pitch_ratio(ratio: f32) -> f32 {
    if ratio > 0.0 {
        12.0 * ratio.log2()
    } else {
        0.0
    }
}

// -------------------------------------------------------------------------------------------------

/// Convert a linear amplitude to decibels. Silence yields -200 dB.
pub fn linear_to_db(value: f32) -> f32 {
    if value == 1.0 {
        return 0.0; // avoid rounding errors at exactly 0 dB
    } else if value > 1e-12f32 {
        return 20.0 * value.log10();
    }
    MINUS_INF_IN_DB
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn semitones() {
        assert_eq!(pitch_ratio_from_semitones(0.0), 1.0);
        assert!((pitch_ratio_from_semitones(12.0) - 2.0).abs() < 1e-6);
        assert!((pitch_ratio_from_semitones(-24.0) - 0.25).abs() < 1e-6);
        assert!((pitch_ratio_from_semitones(7.0) - 1.498_307).abs() < 1e-5);
        assert!((semitones_from_pitch_ratio(0.5) - -12.0).abs() < 1e-5);
        assert_eq!(semitones_from_pitch_ratio(0.0), 0.0);
    }

    #[test]
    fn decibels() {
        assert_eq!(linear_to_db(1.0), 0.0);
        assert_eq!(linear_to_db(0.0), MINUS_INF_IN_DB);
        assert!((linear_to_db(0.5) - -6.0206).abs() < 1e-3);
    }
}
