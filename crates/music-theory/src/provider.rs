use midi_score::{NoteEvent, Score};

use crate::chordify::ChordifiedMeasure;
use crate::key::KeyEstimate;
use crate::roman::RomanNumeral;

/// Trait for theory capability backends.
///
/// `HeuristicTheory` ships the profile/template algorithms. Callers hold a
/// provider behind `Arc<dyn TheoryProvider>` so tests can inject failing
/// capabilities and exercise degraded analysis paths.
pub trait TheoryProvider: Send + Sync {
    fn find_key(&self, notes: &[&NoteEvent]) -> crate::Result<KeyEstimate>;

    fn chordify(&self, score: &Score) -> crate::Result<Vec<ChordifiedMeasure>>;

    fn classify_in_key(&self, pitches: &[u8], key: &KeyEstimate) -> crate::Result<RomanNumeral>;
}

/// Heuristic provider: Krumhansl-Schmuckler key profiles, onset-slice
/// chordification, and template-matching harmonic classification.
pub struct HeuristicTheory;

impl TheoryProvider for HeuristicTheory {
    fn find_key(&self, notes: &[&NoteEvent]) -> crate::Result<KeyEstimate> {
        crate::key::find_key(notes)
    }

    fn chordify(&self, score: &Score) -> crate::Result<Vec<ChordifiedMeasure>> {
        crate::chordify::chordify(score)
    }

    fn classify_in_key(&self, pitches: &[u8], key: &KeyEstimate) -> crate::Result<RomanNumeral> {
        crate::roman::classify_in_key(pitches, key)
    }
}
