use midi_score::{Measure, Score};
use serde::{Deserialize, Serialize};

/// Every pitch sounding at one onset position within a measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockChord {
    /// Offset from the measure start, in quarter-note beats.
    pub onset_beats: f64,
    pub duration_beats: f64,
    /// Distinct pitches, ascending.
    pub pitches: Vec<u8>,
}

/// A measure flattened into block chords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordifiedMeasure {
    pub measure_index: usize,
    /// Measure start in quarter-note beats from the score start.
    pub start_beats: f64,
    pub chords: Vec<BlockChord>,
}

/// Flatten a score into per-measure block chords.
///
/// Each distinct onset position inside a measure yields one chord carrying
/// every pitch sounding there, including notes sustained from earlier
/// positions or other parts. A chord lasts until the next onset in the
/// measure, or the barline.
pub fn chordify(score: &Score) -> crate::Result<Vec<ChordifiedMeasure>> {
    Ok(score
        .measures()
        .iter()
        .map(|m| chordify_measure(score, m))
        .collect())
}

fn chordify_measure(score: &Score, measure: &Measure) -> ChordifiedMeasure {
    let mut onsets: Vec<u64> = score
        .notes
        .iter()
        .filter(|n| measure.contains_tick(n.onset_tick))
        .map(|n| n.onset_tick)
        .collect();
    onsets.sort_unstable();
    onsets.dedup();

    let mut chords = Vec::with_capacity(onsets.len());
    for (i, &onset) in onsets.iter().enumerate() {
        let mut pitches: Vec<u8> = score
            .notes
            .iter()
            .filter(|n| n.onset_tick <= onset && onset < n.offset_tick)
            .map(|n| n.pitch)
            .collect();
        pitches.sort_unstable();
        pitches.dedup();
        if pitches.is_empty() {
            // Only zero-length notes start here
            continue;
        }

        let slice_end = onsets.get(i + 1).copied().unwrap_or(measure.end_tick);
        chords.push(BlockChord {
            onset_beats: score.beats(onset - measure.start_tick),
            duration_beats: score.beats(slice_end.saturating_sub(onset)),
            pitches,
        });
    }

    ChordifiedMeasure {
        measure_index: measure.index,
        start_beats: score.beats(measure.start_tick),
        chords,
    }
}
