use crate::note::NoteEvent;
use crate::score::{Part, Score, SecondsSpan, TempoMarker, TimeSignatureMarker};
use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use std::collections::HashMap;
use std::path::Path;

/// Decode a Standard MIDI File from raw bytes.
pub fn decode(midi_bytes: &[u8]) -> crate::Result<Score> {
    let smf = Smf::parse(midi_bytes).map_err(|e| crate::Error::MidiParse(e.to_string()))?;
    Ok(build_score(&smf))
}

/// Decode a MIDI file from disk.
pub fn decode_file(path: &Path) -> crate::Result<Score> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

fn build_score(smf: &Smf) -> Score {
    let ppq = match smf.header.timing {
        midly::Timing::Metrical(ticks) => ticks.as_int(),
        midly::Timing::Timecode(_, _) => 480,
    };

    let format = match smf.header.format {
        midly::Format::SingleTrack => 0,
        midly::Format::Parallel => 1,
        midly::Format::Sequential => 2,
    };

    let mut tempo_markers: Vec<TempoMarker> = Vec::new();
    let mut time_signatures: Vec<TimeSignatureMarker> = Vec::new();
    let mut total_ticks: u64 = 0;
    let mut track_names: Vec<Option<String>> = Vec::with_capacity(smf.tracks.len());
    let mut track_notes: Vec<Vec<NoteEvent>> = Vec::with_capacity(smf.tracks.len());

    for track in &smf.tracks {
        let mut current_tick: u64 = 0;
        let mut name: Option<String> = None;
        let mut notes: Vec<NoteEvent> = Vec::new();
        // Map (channel, pitch) → Vec<(onset_tick, velocity)> for stacking
        let mut pending: HashMap<(u8, u8), Vec<(u64, u8)>> = HashMap::new();

        for event in track {
            current_tick += event.delta.as_int() as u64;

            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => {
                    let usec = tempo.as_int();
                    tempo_markers.push(TempoMarker {
                        tick: current_tick,
                        microseconds_per_beat: usec,
                        bpm: 60_000_000.0 / usec as f64,
                    });
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, denom_pow, _, _)) => {
                    time_signatures.push(TimeSignatureMarker {
                        tick: current_tick,
                        numerator: num,
                        denominator: 1u8 << denom_pow,
                    });
                }
                TrackEventKind::Meta(MetaMessage::TrackName(raw)) => {
                    name = String::from_utf8(raw.to_vec()).ok();
                }
                TrackEventKind::Midi { channel, message } => {
                    let ch = channel.as_int();
                    match message {
                        MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                            pending
                                .entry((ch, key.as_int()))
                                .or_default()
                                .push((current_tick, vel.as_int()));
                        }
                        MidiMessage::NoteOff { key, .. } | MidiMessage::NoteOn { key, .. } => {
                            // vel=0 NoteOn is NoteOff
                            if let Some(stack) = pending.get_mut(&(ch, key.as_int())) {
                                if let Some((onset, velocity)) = stack.pop() {
                                    notes.push(NoteEvent {
                                        onset_tick: onset,
                                        offset_tick: current_tick,
                                        pitch: key.as_int(),
                                        velocity,
                                        channel: ch,
                                        part_index: 0,
                                    });
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            }

            total_ticks = total_ticks.max(current_tick);
        }

        // Close any unclosed notes at the track's final tick
        for (&(ch, pitch), stack) in &pending {
            for &(onset, velocity) in stack {
                notes.push(NoteEvent {
                    onset_tick: onset,
                    offset_tick: current_tick,
                    pitch,
                    velocity,
                    channel: ch,
                    part_index: 0,
                });
            }
        }

        track_names.push(name);
        track_notes.push(notes);
    }

    // Note-bearing tracks become parts, in file order; meta-only tracks
    // (conductor tracks) do not.
    let mut parts: Vec<Part> = Vec::new();
    let mut all_notes: Vec<NoteEvent> = Vec::new();
    for (track_index, notes) in track_notes.into_iter().enumerate() {
        if notes.is_empty() {
            continue;
        }
        let part_index = parts.len();
        parts.push(Part {
            index: part_index,
            name: track_names[track_index].clone(),
            note_count: notes.len(),
        });
        for mut note in notes {
            note.part_index = part_index;
            all_notes.push(note);
        }
    }

    // Sort by onset, then pitch for determinism
    all_notes.sort_by(|a, b| a.onset_tick.cmp(&b.onset_tick).then(a.pitch.cmp(&b.pitch)));

    // Deduplicate markers (multiple tracks may repeat them in format 1)
    tempo_markers.sort_by_key(|t| t.tick);
    tempo_markers
        .dedup_by(|a, b| a.tick == b.tick && a.microseconds_per_beat == b.microseconds_per_beat);
    time_signatures.sort_by_key(|t| t.tick);
    time_signatures.dedup_by(|a, b| a.tick == b.tick);

    let seconds_map = if tempo_markers.is_empty() {
        None
    } else {
        Some(
            all_notes
                .iter()
                .map(|n| {
                    let onset = ticks_to_seconds(n.onset_tick, ppq, &tempo_markers);
                    let offset = ticks_to_seconds(n.offset_tick, ppq, &tempo_markers);
                    SecondsSpan {
                        onset_seconds: onset,
                        duration_seconds: (offset - onset).max(0.0),
                    }
                })
                .collect(),
        )
    };

    Score {
        ppq,
        format,
        track_count: smf.tracks.len(),
        notes: all_notes,
        parts,
        tempo_markers,
        time_signatures,
        total_ticks,
        seconds_map,
    }
}

/// Convert an absolute tick to seconds, walking the tempo map. The first
/// marker's tempo is treated as in effect from tick 0.
fn ticks_to_seconds(tick: u64, ppq: u16, tempo_markers: &[TempoMarker]) -> f64 {
    let mut seconds = 0.0;
    let mut last_tick = 0u64;
    let mut current_bpm = tempo_markers.first().map(|t| t.bpm).unwrap_or(120.0);

    for marker in tempo_markers {
        if marker.tick >= tick {
            break;
        }
        if marker.tick > last_tick {
            let delta = (marker.tick - last_tick) as f64;
            seconds += delta * 60.0 / (current_bpm * ppq as f64);
        }
        last_tick = marker.tick;
        current_bpm = marker.bpm;
    }

    if tick > last_tick {
        let delta = (tick - last_tick) as f64;
        seconds += delta * 60.0 / (current_bpm * ppq as f64);
    }

    seconds
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn smf_bytes(ppq: u16, tracks: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"MThd");
        buf.extend_from_slice(&6u32.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes()); // format 1
        buf.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
        buf.extend_from_slice(&ppq.to_be_bytes());
        for track in tracks {
            buf.extend_from_slice(b"MTrk");
            buf.extend_from_slice(&(track.len() as u32).to_be_bytes());
            buf.extend_from_slice(track);
        }
        buf
    }

    fn conductor_track() -> Vec<u8> {
        let mut t = Vec::new();
        // Tempo 120 BPM (500000 usec/beat)
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        // Time sig 4/4
        t.extend_from_slice(&[0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08]);
        // End of track
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }

    fn melody_track() -> Vec<u8> {
        let mut t = Vec::new();
        // Track name "Melody"
        t.extend_from_slice(&[0x00, 0xFF, 0x03, 0x06]);
        t.extend_from_slice(b"Melody");
        // D4 for one beat, then F#4, then A4
        t.extend_from_slice(&[0x00, 0x90, 62, 100]);
        t.extend_from_slice(&[0x83, 0x60, 0x80, 62, 0]);
        t.extend_from_slice(&[0x00, 0x90, 66, 100]);
        t.extend_from_slice(&[0x83, 0x60, 0x80, 66, 0]);
        t.extend_from_slice(&[0x00, 0x90, 69, 100]);
        t.extend_from_slice(&[0x83, 0x60, 0x80, 69, 0]);
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }

    #[test]
    fn decode_two_track_file() {
        let midi = smf_bytes(480, &[conductor_track(), melody_track()]);
        let score = decode(&midi).unwrap();

        assert_eq!(score.ppq, 480);
        assert_eq!(score.format, 1);
        assert_eq!(score.track_count, 2);
        assert_eq!(score.notes.len(), 3);
        assert_eq!(score.notes[0].pitch, 62);
        assert_eq!(score.notes[1].pitch, 66);
        assert_eq!(score.notes[2].pitch, 69);
        assert_eq!(score.notes[0].duration_ticks(), 480);
        assert_eq!(score.total_ticks, 480 * 3);
    }

    #[test]
    fn conductor_track_is_not_a_part() {
        let midi = smf_bytes(480, &[conductor_track(), melody_track()]);
        let score = decode(&midi).unwrap();

        assert_eq!(score.parts.len(), 1);
        assert_eq!(score.parts[0].name.as_deref(), Some("Melody"));
        assert_eq!(score.parts[0].note_count, 3);
        assert!(score.notes.iter().all(|n| n.part_index == 0));
    }

    #[test]
    fn velocity_zero_note_on_closes_note() {
        let mut t = Vec::new();
        t.extend_from_slice(&[0x00, 0x90, 60, 90]);
        // NoteOn with vel 0 acts as NoteOff
        t.extend_from_slice(&[0x83, 0x60, 0x90, 60, 0]);
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let midi = smf_bytes(480, &[t]);
        let score = decode(&midi).unwrap();

        assert_eq!(score.notes.len(), 1);
        assert_eq!(score.notes[0].duration_ticks(), 480);
    }

    #[test]
    fn unclosed_note_ends_at_track_end() {
        let mut t = Vec::new();
        t.extend_from_slice(&[0x00, 0x90, 64, 90]);
        // 960 ticks of silence, then end of track with the note still open
        t.extend_from_slice(&[0x87, 0x40, 0xFF, 0x2F, 0x00]);

        let midi = smf_bytes(480, &[t]);
        let score = decode(&midi).unwrap();

        assert_eq!(score.notes.len(), 1);
        assert_eq!(score.notes[0].offset_tick, 960);
    }

    #[test]
    fn tempo_markers_deduplicated_and_converted() {
        let midi = smf_bytes(480, &[conductor_track(), conductor_track()]);
        let score = decode(&midi).unwrap();

        assert_eq!(score.tempo_markers.len(), 1);
        assert!((score.tempo_markers[0].bpm - 120.0).abs() < 0.1);
        assert_eq!(score.time_signatures.len(), 1);
        assert_eq!(score.time_signatures[0].numerator, 4);
    }

    #[test]
    fn seconds_map_present_only_with_tempo_marker() {
        let with_tempo = smf_bytes(480, &[conductor_track(), melody_track()]);
        let score = decode(&with_tempo).unwrap();
        let map = score.seconds_map.as_ref().unwrap();

        // 480 ticks at 120 BPM is half a second
        assert_eq!(map.len(), 3);
        assert!((map[1].onset_seconds - 0.5).abs() < 1e-9);
        assert!((map[1].duration_seconds - 0.5).abs() < 1e-9);

        let without_tempo = smf_bytes(480, &[melody_track()]);
        let score = decode(&without_tempo).unwrap();
        assert!(score.seconds_map.is_none());
    }

    #[test]
    fn seconds_map_walks_tempo_changes() {
        let mut conductor = Vec::new();
        // 120 BPM at tick 0, 60 BPM at tick 480
        conductor.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        conductor.extend_from_slice(&[0x83, 0x60, 0xFF, 0x51, 0x03, 0x0F, 0x42, 0x40]);
        conductor.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let mut melody = Vec::new();
        // One note from tick 480 to tick 960
        melody.extend_from_slice(&[0x83, 0x60, 0x90, 60, 100]);
        melody.extend_from_slice(&[0x83, 0x60, 0x80, 60, 0]);
        melody.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

        let midi = smf_bytes(480, &[conductor, melody]);
        let score = decode(&midi).unwrap();
        let map = score.seconds_map.as_ref().unwrap();

        // First beat at 120 BPM (0.5 s), note itself at 60 BPM (1.0 s)
        assert!((map[0].onset_seconds - 0.5).abs() < 1e-9);
        assert!((map[0].duration_seconds - 1.0).abs() < 1e-9);
    }

    #[test]
    fn garbage_bytes_are_a_parse_error() {
        let result = decode(b"not a midi file");
        assert!(matches!(result, Err(crate::Error::MidiParse(_))));
    }
}
