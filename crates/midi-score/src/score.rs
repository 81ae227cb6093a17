use crate::note::NoteEvent;
use serde::{Deserialize, Serialize};

/// One ordered voice or staff: a note-bearing MIDI track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub index: usize,
    pub name: Option<String>,
    pub note_count: usize,
}

/// A tempo marker from the file's tempo map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoMarker {
    pub tick: u64,
    pub microseconds_per_beat: u32,
    pub bpm: f64,
}

/// A time-signature marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSignatureMarker {
    pub tick: u64,
    pub numerator: u8,
    pub denominator: u8,
}

/// Absolute timing for one note, computed against the full tempo map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondsSpan {
    pub onset_seconds: f64,
    pub duration_seconds: f64,
}

/// A measure imposed on the tick timeline, spanning `[start_tick, end_tick)`.
///
/// Measures derive from the first time-signature marker (4/4 when the file
/// has none). A single meter for the whole piece is a known simplification,
/// parallel to the single-tempo rule used for beat-domain timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Measure {
    pub index: usize,
    pub start_tick: u64,
    pub end_tick: u64,
}

impl Measure {
    pub fn contains_tick(&self, tick: u64) -> bool {
        tick >= self.start_tick && tick < self.end_tick
    }
}

/// A decoded score: notes in tick time plus the file's timing context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    pub ppq: u16,
    pub format: u8,
    pub track_count: usize,
    /// All notes, sorted by onset then pitch.
    pub notes: Vec<NoteEvent>,
    /// Note-bearing tracks, in file order.
    pub parts: Vec<Part>,
    pub tempo_markers: Vec<TempoMarker>,
    pub time_signatures: Vec<TimeSignatureMarker>,
    pub total_ticks: u64,
    /// Per-note absolute timing from the full tempo map, parallel to
    /// `notes`. `Some` iff the file declares at least one tempo marker.
    pub seconds_map: Option<Vec<SecondsSpan>>,
}

impl Score {
    /// Convert a tick position to quarter-note beats.
    pub fn beats(&self, tick: u64) -> f64 {
        tick as f64 / self.ppq as f64
    }

    pub fn total_beats(&self) -> f64 {
        self.beats(self.total_ticks)
    }

    /// Notes belonging to one part, in onset order.
    pub fn part_notes(&self, part_index: usize) -> Vec<&NoteEvent> {
        self.notes
            .iter()
            .filter(|n| n.part_index == part_index)
            .collect()
    }

    /// Impose measures over `[0, total_ticks)` from the first time signature.
    pub fn measures(&self) -> Vec<Measure> {
        let (numerator, denominator) = self
            .time_signatures
            .first()
            .map(|ts| (ts.numerator, ts.denominator))
            .unwrap_or((4, 4));

        let ticks_per_measure =
            (numerator as u64 * 4 * self.ppq as u64) / denominator.max(1) as u64;
        if ticks_per_measure == 0 {
            return Vec::new();
        }

        let mut measures = Vec::new();
        let mut start = 0u64;
        while start < self.total_ticks {
            measures.push(Measure {
                index: measures.len(),
                start_tick: start,
                end_tick: start + ticks_per_measure,
            });
            start += ticks_per_measure;
        }
        measures
    }
}
