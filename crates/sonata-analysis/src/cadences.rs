//! Cadence detection over chordified measures.
//!
//! Each measure with at least two block chords is keyed locally, then
//! adjacent chord pairs are read as Roman numerals in that key. A
//! dominant-to-tonic pair is an authentic cadence; any motion landing on a
//! dominant is a half cadence. Measures or pairs that defeat the theory
//! capabilities are skipped rather than failing the stage.

use midi_score::{Measure, NoteEvent, Score};
use music_theory::TheoryProvider;

use crate::result::{Cadence, CadenceKind, KeySummary};
use crate::timebase::Timebase;

/// Detect cadences for every measure of the score, in score order.
///
/// Fails only when chordification itself fails; the caller decides whether
/// that degrades the run.
pub fn detect_cadences(
    theory: &dyn TheoryProvider,
    score: &Score,
    timebase: &Timebase,
) -> crate::Result<Vec<Cadence>> {
    let chordified = theory.chordify(score)?;
    let measures = score.measures();

    let mut cadences = Vec::new();
    for measure in &chordified {
        if measure.chords.len() < 2 {
            continue;
        }
        let Some(span) = measures.get(measure.measure_index) else {
            continue;
        };

        let clipped = measure_notes(score, span);
        let note_refs: Vec<&NoteEvent> = clipped.iter().collect();
        let Ok(local_key) = theory.find_key(&note_refs) else {
            continue;
        };
        let key_label = KeySummary::from_estimate(&local_key).label();

        for pair in measure.chords.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let (Ok(from), Ok(to)) = (
                theory.classify_in_key(&first.pitches, &local_key),
                theory.classify_in_key(&second.pitches, &local_key),
            ) else {
                continue;
            };

            let kind = if from.is_dominant() && to.is_tonic() {
                CadenceKind::Authentic
            } else if to.is_dominant() {
                CadenceKind::Half
            } else {
                continue;
            };

            cadences.push(Cadence {
                kind,
                measure: measure.measure_index,
                offset_sec: timebase.seconds_from_beats(measure.start_beats + second.onset_beats),
                key: key_label.clone(),
            });
        }
    }
    Ok(cadences)
}

/// Notes sounding during the measure, clipped to its span so sustained
/// neighbours weigh in proportionally.
fn measure_notes(score: &Score, measure: &Measure) -> Vec<NoteEvent> {
    score
        .notes
        .iter()
        .filter(|note| note.onset_tick < measure.end_tick && note.offset_tick > measure.start_tick)
        .map(|note| {
            let mut clipped = note.clone();
            clipped.onset_tick = clipped.onset_tick.max(measure.start_tick);
            clipped.offset_tick = clipped.offset_tick.min(measure.end_tick);
            clipped
        })
        .collect()
}
