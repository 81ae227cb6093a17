use serde::{Deserialize, Serialize};

/// A single note with absolute tick timing and source metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub onset_tick: u64,
    pub offset_tick: u64,
    pub pitch: u8,
    pub velocity: u8,
    pub channel: u8,
    /// Index into the score's parts, not the raw MIDI track index.
    pub part_index: usize,
}

impl NoteEvent {
    pub fn duration_ticks(&self) -> u64 {
        self.offset_tick.saturating_sub(self.onset_tick)
    }

    pub fn pitch_class(&self) -> u8 {
        self.pitch % 12
    }
}
