use serde::{Deserialize, Serialize};

/// Chord qualities recognized by template matching, a classical set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Suspended4,
    Dominant7,
    Major7,
    Minor7,
    Diminished7,
    HalfDiminished7,
}

impl ChordQuality {
    pub fn is_minor_flavored(&self) -> bool {
        matches!(
            self,
            ChordQuality::Minor
                | ChordQuality::Minor7
                | ChordQuality::Diminished
                | ChordQuality::Diminished7
                | ChordQuality::HalfDiminished7
        )
    }

    pub fn is_seventh(&self) -> bool {
        matches!(
            self,
            ChordQuality::Dominant7
                | ChordQuality::Major7
                | ChordQuality::Minor7
                | ChordQuality::Diminished7
                | ChordQuality::HalfDiminished7
        )
    }
}

/// A chord template: quality + interval set from root (as bitmask over 12 pitch classes).
struct ChordTemplate {
    quality: ChordQuality,
    intervals: u16, // bitmask: bit i set means interval i is in the template
    size: usize,
}

impl ChordTemplate {
    const fn new(quality: ChordQuality, intervals: &[u8]) -> Self {
        let mut mask = 0u16;
        let mut i = 0;
        while i < intervals.len() {
            mask |= 1 << intervals[i];
            i += 1;
        }
        Self {
            quality,
            intervals: mask,
            size: intervals.len(),
        }
    }
}

/// Recognized templates, ordered by specificity (larger first for tiebreaking).
static TEMPLATES: &[ChordTemplate] = &[
    // 4-note chords first (more specific)
    ChordTemplate::new(ChordQuality::Dominant7, &[0, 4, 7, 10]),
    ChordTemplate::new(ChordQuality::Major7, &[0, 4, 7, 11]),
    ChordTemplate::new(ChordQuality::Minor7, &[0, 3, 7, 10]),
    ChordTemplate::new(ChordQuality::Diminished7, &[0, 3, 6, 9]),
    ChordTemplate::new(ChordQuality::HalfDiminished7, &[0, 3, 6, 10]),
    // Triads
    ChordTemplate::new(ChordQuality::Major, &[0, 4, 7]),
    ChordTemplate::new(ChordQuality::Minor, &[0, 3, 7]),
    ChordTemplate::new(ChordQuality::Diminished, &[0, 3, 6]),
    ChordTemplate::new(ChordQuality::Augmented, &[0, 4, 8]),
    ChordTemplate::new(ChordQuality::Suspended4, &[0, 5, 7]),
];

/// Convert a set of pitch classes to an interval bitmask relative to a root.
fn to_interval_mask(pitch_classes: &[u8], root: u8) -> u16 {
    let mut mask = 0u16;
    for &pc in pitch_classes {
        let interval = (pc + 12 - root) % 12;
        mask |= 1 << interval;
    }
    mask
}

fn popcount(mut x: u16) -> usize {
    let mut count = 0;
    while x != 0 {
        count += x & 1;
        x >>= 1;
    }
    count as usize
}

/// Match a set of pitch classes against chord templates.
///
/// Returns `(root_pc, quality, score)` or `None` if nothing matches. Tries
/// all 12 possible roots, scores by template coverage with a penalty for
/// extra notes. `bass_hint` biases root selection when ambiguous.
pub fn match_chord(pitch_classes: &[u8], bass_hint: Option<u8>) -> Option<(u8, ChordQuality, f64)> {
    if pitch_classes.len() < 2 {
        return None;
    }

    let mut best_root: u8 = 0;
    let mut best_score = 0.0_f64;
    let mut best_quality = ChordQuality::Major;

    for root in 0..12u8 {
        let intervals = to_interval_mask(pitch_classes, root);

        for template in TEMPLATES {
            let matched = popcount(intervals & template.intervals);
            if matched < template.size.min(2) {
                continue;
            }

            // Fraction of template matched, penalized for extra notes
            let extra = popcount(intervals & !template.intervals);
            let mut score = matched as f64 / template.size as f64 - extra as f64 * 0.1;

            if let Some(bass) = bass_hint {
                if bass % 12 == root {
                    score += 0.15;
                }
            }

            // Bonus for complete match (all template tones present)
            if intervals & template.intervals == template.intervals {
                score += 0.1;
            }

            if score > best_score {
                best_score = score;
                best_root = root;
                best_quality = template.quality;
            }
        }
    }

    if best_score > 0.4 {
        Some((best_root, best_quality, best_score.min(1.0)))
    } else {
        None
    }
}
