use midi_score::NoteEvent;
use serde::{Deserialize, Serialize};

use crate::pitch::{note_name, FLAT_ROOTS};
use crate::TheoryError;

/// Krumhansl-Kessler major key profile (duration-weighted perception studies).
const MAJOR_PROFILE: [f64; 12] = [
    6.35, 2.23, 3.48, 2.33, 4.38, 4.09, 2.52, 5.19, 2.39, 3.66, 2.29, 2.88,
];

/// Krumhansl-Kessler minor key profile.
const MINOR_PROFILE: [f64; 12] = [
    6.33, 2.68, 3.52, 5.38, 2.60, 3.53, 2.54, 4.75, 3.98, 2.69, 3.34, 3.17,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    Major,
    Minor,
}

impl std::fmt::Display for KeyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMode::Major => write!(f, "major"),
            KeyMode::Minor => write!(f, "minor"),
        }
    }
}

/// An estimated key with its profile correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEstimate {
    /// Tonic name: "C", "F#", "E♭".
    pub tonic: String,
    /// Pitch class 0–11 (C=0, C#=1, ...)
    pub tonic_pc: u8,
    pub mode: KeyMode,
    /// Correlation with the best-matching key profile, clamped to [0, 1].
    pub correlation: f64,
}

impl KeyEstimate {
    pub fn label(&self) -> String {
        format!("{} {}", self.tonic, self.mode)
    }
}

/// Estimate the key of a note set using the Krumhansl-Schmuckler algorithm.
///
/// Builds a duration-weighted pitch-class histogram and correlates it
/// against all 24 major/minor key profiles. The best Pearson correlation
/// determines the estimated key. Errors on empty pitch content so callers
/// can fall back rather than trust a fabricated answer.
pub fn find_key(notes: &[&NoteEvent]) -> crate::Result<KeyEstimate> {
    if notes.is_empty() {
        return Err(TheoryError::EmptyPitchContent);
    }

    // Duration-weighted pitch-class histogram
    let mut histogram = [0.0_f64; 12];
    for note in notes {
        let pc = note.pitch_class() as usize;
        let duration = note.duration_ticks().max(1) as f64;
        histogram[pc] += duration;
    }

    let total: f64 = histogram.iter().sum();
    if total == 0.0 {
        return Err(TheoryError::EmptyPitchContent);
    }

    // Normalize
    for h in &mut histogram {
        *h /= total;
    }

    // Correlate against all 24 key profiles (12 roots × 2 modes)
    let mut best_tonic: u8 = 0;
    let mut best_mode = KeyMode::Major;
    let mut best_corr = -1.0_f64;

    for tonic in 0..12u8 {
        // Rotate histogram so the candidate tonic sits at index 0
        let mut rotated = [0.0; 12];
        for (i, slot) in rotated.iter_mut().enumerate() {
            *slot = histogram[(i + tonic as usize) % 12];
        }

        let major_corr = pearson(&rotated, &MAJOR_PROFILE);
        if major_corr > best_corr {
            best_corr = major_corr;
            best_tonic = tonic;
            best_mode = KeyMode::Major;
        }

        let minor_corr = pearson(&rotated, &MINOR_PROFILE);
        if minor_corr > best_corr {
            best_corr = minor_corr;
            best_tonic = tonic;
            best_mode = KeyMode::Minor;
        }
    }

    let tonic = if FLAT_ROOTS.contains(&best_tonic) {
        note_name(best_tonic, true).to_string()
    } else {
        note_name(best_tonic, false).to_string()
    };

    Ok(KeyEstimate {
        tonic,
        tonic_pc: best_tonic,
        mode: best_mode,
        correlation: (best_corr.clamp(0.0, 1.0) * 10000.0).round() / 10000.0,
    })
}

/// Pearson correlation coefficient between two 12-element arrays.
fn pearson(x: &[f64; 12], y: &[f64; 12]) -> f64 {
    let x_mean: f64 = x.iter().sum::<f64>() / 12.0;
    let y_mean: f64 = y.iter().sum::<f64>() / 12.0;

    let mut num = 0.0;
    let mut x_sq = 0.0;
    let mut y_sq = 0.0;

    for i in 0..12 {
        let xd = x[i] - x_mean;
        let yd = y[i] - y_mean;
        num += xd * yd;
        x_sq += xd * xd;
        y_sq += yd * yd;
    }

    let denom = (x_sq * y_sq).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    num / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn make_note(pitch: u8, onset: u64, offset: u64) -> NoteEvent {
        NoteEvent {
            pitch,
            onset_tick: onset,
            offset_tick: offset,
            velocity: 80,
            channel: 0,
            part_index: 0,
        }
    }

    fn scale_notes(pitches: &[u8]) -> Vec<NoteEvent> {
        pitches
            .iter()
            .enumerate()
            .map(|(i, &p)| make_note(p, i as u64 * 480, (i as u64 + 1) * 480))
            .collect()
    }

    #[test]
    fn empty_notes_is_an_error() {
        let result = find_key(&[]);
        assert!(matches!(result, Err(TheoryError::EmptyPitchContent)));
    }

    #[test]
    fn c_major_scale_detected() {
        let notes = scale_notes(&[60, 62, 64, 65, 67, 69, 71]);
        let refs: Vec<&NoteEvent> = notes.iter().collect();

        let key = find_key(&refs).unwrap();
        assert_eq!(key.tonic, "C");
        assert_eq!(key.mode, KeyMode::Major);
        assert!(
            key.correlation > 0.7,
            "correlation {} should be > 0.7",
            key.correlation
        );
    }

    #[test]
    fn a_minor_scale_detected() {
        // A natural minor and C major are relative; either answer is
        // defensible, so only require strong correlation.
        let notes = scale_notes(&[57, 59, 60, 62, 64, 65, 67]);
        let refs: Vec<&NoteEvent> = notes.iter().collect();

        let key = find_key(&refs).unwrap();
        assert!(key.correlation > 0.5);
    }

    #[test]
    fn flat_tonic_spelled_with_flat_sign() {
        // E♭ major scale
        let notes = scale_notes(&[63, 65, 67, 68, 70, 72, 74]);
        let refs: Vec<&NoteEvent> = notes.iter().collect();

        let key = find_key(&refs).unwrap();
        if key.tonic_pc == 3 {
            assert_eq!(key.tonic, "E♭");
            assert_eq!(key.label(), "E♭ major");
        }
    }

    #[test]
    fn correlation_stays_in_unit_range() {
        let notes = scale_notes(&[60, 61, 60, 61]);
        let refs: Vec<&NoteEvent> = notes.iter().collect();

        let key = find_key(&refs).unwrap();
        assert!((0.0..=1.0).contains(&key.correlation));
    }

    #[test]
    fn pearson_identical_arrays() {
        let a = [
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0,
        ];
        let r = pearson(&a, &a);
        assert!((r - 1.0).abs() < 1e-10);
    }
}
