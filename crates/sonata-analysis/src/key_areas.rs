//! Key area detection.
//!
//! The piece is cut into equal time windows and each window with enough
//! notes is keyed independently. Sparse material falls back to measure
//! blocks, then to the whole-piece key, then to a neutral C major guess,
//! so callers always receive at least one area.

use midi_score::{NoteEvent, Score};
use music_theory::{KeyMode, TheoryProvider};
use tracing::warn;

use crate::result::{KeyArea, KeySummary};
use crate::timebase::Timebase;

const MIN_WINDOW_NOTES: usize = 4;
const TARGET_WINDOW_SECS: f64 = 30.0;

/// Estimate the global key and a non-empty list of local key areas.
pub fn analyze_key_areas(
    theory: &dyn TheoryProvider,
    score: &Score,
    duration: f64,
    timebase: &Timebase,
) -> (Option<KeySummary>, Vec<KeyArea>) {
    let all_notes: Vec<&NoteEvent> = score.notes.iter().collect();
    let global_key = theory
        .find_key(&all_notes)
        .ok()
        .map(|estimate| KeySummary::from_estimate(&estimate));

    let mut areas = windowed_areas(theory, score, duration, timebase);
    if areas.is_empty() {
        areas = measure_block_areas(theory, score, timebase);
    }
    if areas.is_empty() {
        if let Some(global) = &global_key {
            areas.push(KeyArea {
                key: global.clone(),
                start_sec: 0.0,
                end_sec: duration,
            });
        }
    }
    if areas.is_empty() {
        warn!("no key areas could be estimated, defaulting to C major");
        areas.push(KeyArea {
            key: KeySummary {
                tonic: "C".to_string(),
                mode: KeyMode::Major,
                correlation: 0.5,
            },
            start_sec: 0.0,
            end_sec: duration,
        });
    }

    (global_key, areas)
}

/// Equal windows of roughly thirty seconds, between four and six of them.
/// Windows with fewer than [`MIN_WINDOW_NOTES`] notes are skipped.
fn windowed_areas(
    theory: &dyn TheoryProvider,
    score: &Score,
    duration: f64,
    timebase: &Timebase,
) -> Vec<KeyArea> {
    if score.notes.is_empty() || duration <= 0.0 {
        return Vec::new();
    }

    let count = ((duration / TARGET_WINDOW_SECS).round() as i64).clamp(4, 6) as usize;
    let window_len = duration / count as f64;

    let mut windows: Vec<Vec<&NoteEvent>> = vec![Vec::new(); count];
    for note in &score.notes {
        let onset_sec = timebase.seconds_from_beats(score.beats(note.onset_tick));
        let index = ((onset_sec / window_len) as usize).min(count - 1);
        windows[index].push(note);
    }

    let mut areas = Vec::new();
    for (index, notes) in windows.iter().enumerate() {
        if notes.len() < MIN_WINDOW_NOTES {
            continue;
        }
        if let Ok(estimate) = theory.find_key(notes) {
            areas.push(KeyArea {
                key: KeySummary::from_estimate(&estimate),
                start_sec: index as f64 * window_len,
                end_sec: (index + 1) as f64 * window_len,
            });
        }
    }
    areas
}

/// Fallback for sparse files: key blocks of consecutive measures instead of
/// time windows. Blocks that defeat key-finding are skipped.
fn measure_block_areas(
    theory: &dyn TheoryProvider,
    score: &Score,
    timebase: &Timebase,
) -> Vec<KeyArea> {
    let measures = score.measures();
    if measures.is_empty() {
        return Vec::new();
    }

    let block_len = (measures.len() / 10).max(4);
    let mut areas = Vec::new();
    for block in measures.chunks(block_len) {
        let (Some(first), Some(last)) = (block.first(), block.last()) else {
            continue;
        };
        let notes: Vec<&NoteEvent> = score
            .notes
            .iter()
            .filter(|note| note.onset_tick >= first.start_tick && note.onset_tick < last.end_tick)
            .collect();
        let Ok(estimate) = theory.find_key(&notes) else {
            continue;
        };
        areas.push(KeyArea {
            key: KeySummary::from_estimate(&estimate),
            start_sec: timebase.seconds_from_beats(score.beats(first.start_tick)),
            end_sec: timebase.seconds_from_beats(score.beats(last.end_tick)),
        });
    }
    areas
}
