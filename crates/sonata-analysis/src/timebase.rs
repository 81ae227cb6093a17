//! Beat-to-seconds conversion under the piece's opening tempo.

use midi_score::Score;

/// Converts beat offsets to wall-clock seconds using a single tempo: the
/// first tempo marker in the file, or 120 BPM when none is present. Stages
/// that need finer resolution consult the score's seconds map instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timebase {
    bpm: f64,
}

impl Timebase {
    pub fn from_score(score: &Score) -> Self {
        let bpm = score
            .tempo_markers
            .first()
            .map(|marker| marker.bpm)
            .unwrap_or(120.0);
        Self { bpm }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn seconds_from_beats(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }
}
