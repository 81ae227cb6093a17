pub mod decode;
pub mod note;
pub mod score;

pub use decode::{decode, decode_file};
pub use note::NoteEvent;
pub use score::{Measure, Part, Score, SecondsSpan, TempoMarker, TimeSignatureMarker};

/// Errors from score decoding operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    MidiParse(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
