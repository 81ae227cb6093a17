pub mod chordify;
pub mod key;
pub mod pitch;
pub mod provider;
pub mod roman;
pub mod templates;

pub use chordify::{chordify, BlockChord, ChordifiedMeasure};
pub use key::{find_key, KeyEstimate, KeyMode};
pub use pitch::{dominant_pc, note_name, parse_note_name, relative_major_pc, relative_minor_pc};
pub use provider::{HeuristicTheory, TheoryProvider};
pub use roman::{classify_in_key, RomanNumeral};
pub use templates::{match_chord, ChordQuality};

/// Errors from theory capabilities.
#[derive(Debug, thiserror::Error)]
pub enum TheoryError {
    #[error("no pitch content to analyze")]
    EmptyPitchContent,
    #[error("no chord interpretation for pitch classes {0:?}")]
    NoChordMatch(Vec<u8>),
}

pub type Result<T> = std::result::Result<T, TheoryError>;
