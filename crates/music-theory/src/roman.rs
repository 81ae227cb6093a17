use serde::{Deserialize, Serialize};

use crate::key::{KeyEstimate, KeyMode};
use crate::templates::{match_chord, ChordQuality};
use crate::TheoryError;

const MAJOR_SCALE: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
const MINOR_SCALE: [u8; 7] = [0, 2, 3, 5, 7, 8, 10];
const NUMERALS: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

/// A chord classified against a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RomanNumeral {
    /// Scale degree of the chord root, 1–7.
    pub degree: u8,
    /// True when the root lies outside the key's scale.
    pub chromatic: bool,
    pub quality: ChordQuality,
    /// Display figure: "V7", "ii", "vii°", "♭VII".
    pub figure: String,
}

impl RomanNumeral {
    /// Dominant function: diatonic degree 5, or its leading-tone
    /// diminished substitute on degree 7.
    pub fn is_dominant(&self) -> bool {
        if self.chromatic {
            return false;
        }
        self.degree == 5
            || (self.degree == 7
                && matches!(
                    self.quality,
                    ChordQuality::Diminished
                        | ChordQuality::Diminished7
                        | ChordQuality::HalfDiminished7
                ))
    }

    /// Tonic function: diatonic degree 1, either quality.
    pub fn is_tonic(&self) -> bool {
        self.degree == 1 && !self.chromatic
    }
}

/// Classify a chord's pitches against a key.
///
/// The root comes from template matching with the lowest pitch as bass
/// hint; its interval above the tonic maps to a scale degree. Chromatic
/// roots are named as the flattened upper neighbor. In minor, the raised
/// leading tone counts as diatonic degree 7.
pub fn classify_in_key(pitches: &[u8], key: &KeyEstimate) -> crate::Result<RomanNumeral> {
    let mut pcs: Vec<u8> = Vec::new();
    for &p in pitches {
        let pc = p % 12;
        if !pcs.contains(&pc) {
            pcs.push(pc);
        }
    }
    let bass = pitches.iter().min().map(|&p| p % 12);

    let (root, quality, _) =
        match_chord(&pcs, bass).ok_or(TheoryError::NoChordMatch(pcs))?;

    let interval = (root + 12 - key.tonic_pc) % 12;
    let scale = match key.mode {
        KeyMode::Major => &MAJOR_SCALE,
        KeyMode::Minor => &MINOR_SCALE,
    };

    let (degree, chromatic) = match scale.iter().position(|&s| s == interval) {
        Some(pos) => (pos as u8 + 1, false),
        None if key.mode == KeyMode::Minor && interval == 11 => (7, false),
        None => {
            // Name a chromatic root as its flattened upper scale neighbor
            let upper = (interval + 1) % 12;
            let pos = scale.iter().position(|&s| s == upper).unwrap_or(0);
            (pos as u8 + 1, true)
        }
    };

    let mut figure = String::new();
    if chromatic {
        figure.push('♭');
    }
    let numeral = NUMERALS[(degree - 1) as usize];
    if quality.is_minor_flavored() {
        figure.push_str(&numeral.to_lowercase());
    } else {
        figure.push_str(numeral);
    }
    figure.push_str(match quality {
        ChordQuality::Diminished => "°",
        ChordQuality::Diminished7 => "°7",
        ChordQuality::HalfDiminished7 => "ø7",
        ChordQuality::Augmented => "+",
        q if q.is_seventh() => "7",
        _ => "",
    });

    Ok(RomanNumeral {
        degree,
        chromatic,
        quality,
        figure,
    })
}
