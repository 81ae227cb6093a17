//! Duration resolution for decoded scores.
//!
//! MIDI files routinely lie about their extent: the timing metadata may be
//! missing, truncated or internally inconsistent. The resolver tries a
//! chain of strategies from most to least trustworthy and takes the first
//! positive, finite answer.

use midi_score::Score;

use crate::timebase::Timebase;

/// Last-resort duration when nothing in the file yields a usable value.
pub const FALLBACK_DURATION_SECS: f64 = 180.0;

/// Resolve the piece's duration in seconds.
///
/// Strategy order: the tempo-mapped seconds map, the furthest note end
/// converted through the opening tempo, the end of the last-starting note,
/// then the declared tick span of the file. Anything non-positive or
/// non-finite is rejected and the chain falls through to
/// [`FALLBACK_DURATION_SECS`].
pub fn resolve_duration(score: &Score, timebase: &Timebase) -> f64 {
    seconds_map_end(score)
        .or_else(|| furthest_note_end(score, timebase))
        .or_else(|| last_note_end(score, timebase))
        .or_else(|| declared_span(score, timebase))
        .unwrap_or(FALLBACK_DURATION_SECS)
}

fn usable(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0).then_some(value)
}

fn seconds_map_end(score: &Score) -> Option<f64> {
    let map = score.seconds_map.as_ref()?;
    let end = map
        .iter()
        .map(|span| span.onset_seconds + span.duration_seconds)
        .fold(f64::NEG_INFINITY, f64::max);
    usable(end)
}

fn furthest_note_end(score: &Score, timebase: &Timebase) -> Option<f64> {
    let end_tick = score.notes.iter().map(|note| note.offset_tick).max()?;
    usable(timebase.seconds_from_beats(score.beats(end_tick)))
}

fn last_note_end(score: &Score, timebase: &Timebase) -> Option<f64> {
    let note = score.notes.last()?;
    usable(timebase.seconds_from_beats(score.beats(note.offset_tick)))
}

fn declared_span(score: &Score, timebase: &Timebase) -> Option<f64> {
    usable(timebase.seconds_from_beats(score.total_beats()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use midi_score::{NoteEvent, Score, SecondsSpan, TempoMarker};
    use pretty_assertions::assert_eq;

    fn bare_score() -> Score {
        Score {
            ppq: 480,
            format: 1,
            track_count: 1,
            notes: Vec::new(),
            parts: Vec::new(),
            tempo_markers: Vec::new(),
            time_signatures: Vec::new(),
            total_ticks: 0,
            seconds_map: None,
        }
    }

    fn note(onset_tick: u64, offset_tick: u64) -> NoteEvent {
        NoteEvent {
            onset_tick,
            offset_tick,
            pitch: 60,
            velocity: 80,
            channel: 0,
            part_index: 0,
        }
    }

    #[test]
    fn seconds_map_takes_precedence() {
        let mut score = bare_score();
        score.tempo_markers = vec![TempoMarker {
            tick: 0,
            microseconds_per_beat: 500_000,
            bpm: 120.0,
        }];
        // The map reflects a mid-piece slowdown the naive conversion misses.
        score.seconds_map = Some(vec![
            SecondsSpan {
                onset_seconds: 0.0,
                duration_seconds: 0.5,
            },
            SecondsSpan {
                onset_seconds: 0.5,
                duration_seconds: 1.0,
            },
        ]);
        score.notes = vec![note(0, 480), note(480, 960)];
        score.total_ticks = 960;

        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), 1.5);
    }

    #[test]
    fn falls_back_to_furthest_note_end() {
        let mut score = bare_score();
        // A long held note outlasts the last-starting one.
        score.notes = vec![note(0, 4800), note(960, 1920)];
        score.total_ticks = 4800;

        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), 5.0);
    }

    #[test]
    fn halving_the_tempo_doubles_the_duration() {
        let mut score = bare_score();
        score.notes = vec![note(0, 960)];
        score.total_ticks = 960;

        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), 1.0);

        score.tempo_markers = vec![TempoMarker {
            tick: 0,
            microseconds_per_beat: 1_000_000,
            bpm: 60.0,
        }];
        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), 2.0);
    }

    #[test]
    fn noteless_score_uses_declared_span() {
        let mut score = bare_score();
        score.total_ticks = 1920;

        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), 2.0);
    }

    #[test]
    fn empty_score_gets_the_fallback_duration() {
        let score = bare_score();
        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), FALLBACK_DURATION_SECS);
    }

    #[test]
    fn empty_seconds_map_is_skipped() {
        let mut score = bare_score();
        score.seconds_map = Some(Vec::new());
        score.notes = vec![note(0, 960)];
        score.total_ticks = 960;

        let timebase = Timebase::from_score(&score);
        assert_eq!(resolve_duration(&score, &timebase), 1.0);
    }
}
