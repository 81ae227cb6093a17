//! Melodic theme contour extraction.
//!
//! The first part is treated as the melody line. Simultaneous notes
//! collapse to their highest pitch, then a sliding window computes coarse
//! contour features. The windows are diagnostic evidence only; section
//! synthesis does not consume them.

use midi_score::{NoteEvent, Score};

use crate::result::{ContourDirection, ThemeWindow};
use crate::timebase::Timebase;

const WINDOW_LEN: usize = 8;
const WINDOW_HOP: usize = 4;
const MIN_MELODY_NOTES: usize = 10;

struct MelodicEvent {
    onset_tick: u64,
    pitch: u8,
    duration_ticks: u64,
}

/// Extract contour windows from the first part's melody line, or from all
/// notes when the score carries no part metadata. Fewer than ten melodic
/// notes yield nothing.
pub fn extract_themes(score: &Score, timebase: &Timebase) -> Vec<ThemeWindow> {
    let melody: Vec<&NoteEvent> = match score.parts.first() {
        Some(part) => score.part_notes(part.index),
        None => score.notes.iter().collect(),
    };
    let events = collapse_to_melody(&melody);
    if events.len() < MIN_MELODY_NOTES {
        return Vec::new();
    }

    let mut themes = Vec::new();
    let mut start = 0;
    while start + WINDOW_LEN <= events.len() {
        themes.push(window_features(
            score,
            timebase,
            &events[start..start + WINDOW_LEN],
        ));
        start += WINDOW_HOP;
    }
    themes
}

/// Collapse chords to single melodic events keeping the highest pitch.
/// Relies on the score's onset-then-pitch note ordering.
fn collapse_to_melody(notes: &[&NoteEvent]) -> Vec<MelodicEvent> {
    let mut events: Vec<MelodicEvent> = Vec::new();
    for note in notes {
        match events.last_mut() {
            Some(last) if last.onset_tick == note.onset_tick => {
                if note.pitch >= last.pitch {
                    last.pitch = note.pitch;
                    last.duration_ticks = note.duration_ticks();
                }
            }
            _ => events.push(MelodicEvent {
                onset_tick: note.onset_tick,
                pitch: note.pitch,
                duration_ticks: note.duration_ticks(),
            }),
        }
    }
    events
}

fn window_features(score: &Score, timebase: &Timebase, window: &[MelodicEvent]) -> ThemeWindow {
    let pitches: Vec<i32> = window.iter().map(|event| event.pitch as i32).collect();
    let lowest = pitches.iter().copied().min().unwrap_or(0);
    let highest = pitches.iter().copied().max().unwrap_or(0);

    let mut interval_sum = 0.0;
    let mut direction_sum = 0i32;
    for pair in pitches.windows(2) {
        let step = pair[1] - pair[0];
        interval_sum += step.abs() as f64;
        direction_sum += step;
    }
    let avg_interval = if pitches.len() > 1 {
        interval_sum / (pitches.len() - 1) as f64
    } else {
        0.0
    };

    let avg_duration_beats = window
        .iter()
        .map(|event| event.duration_ticks as f64 / score.ppq as f64)
        .sum::<f64>()
        / window.len() as f64;
    let rhythmic_density = if avg_duration_beats > 0.0 {
        1.0 / avg_duration_beats
    } else {
        1.0
    };

    let first = &window[0];
    let last = &window[window.len() - 1];
    ThemeWindow {
        start_sec: timebase.seconds_from_beats(score.beats(first.onset_tick)),
        end_sec: timebase.seconds_from_beats(score.beats(last.onset_tick + last.duration_ticks)),
        melodic_range: (highest - lowest) as u32,
        avg_interval,
        rhythmic_density,
        contour_direction: if direction_sum > 0 {
            ContourDirection::Ascending
        } else {
            ContourDirection::Descending
        },
    }
}
