pub const NOTE_NAMES_SHARP: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Flat spellings use the typographic flat sign.
pub const NOTE_NAMES_FLAT: [&str; 12] = [
    "C", "D♭", "D", "E♭", "E", "F", "G♭", "G", "A♭", "A", "B♭", "B",
];

/// Pitch classes conventionally spelled with flats.
pub const FLAT_ROOTS: [u8; 6] = [1, 3, 5, 6, 8, 10]; // D♭, E♭, F, G♭, A♭, B♭

pub fn note_name(pitch_class: u8, use_flats: bool) -> &'static str {
    let idx = (pitch_class % 12) as usize;
    if use_flats {
        NOTE_NAMES_FLAT[idx]
    } else {
        NOTE_NAMES_SHARP[idx]
    }
}

/// Parse a pitch name into its pitch class. Accepts `#` sharps and any of
/// the `b`, `♭`, or `-` flat spellings, stacked accidentals included.
pub fn parse_note_name(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let base: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut pc = base;
    for c in chars {
        match c {
            '#' => pc += 1,
            'b' | '♭' | '-' => pc -= 1,
            _ => return None,
        }
    }
    Some(pc.rem_euclid(12) as u8)
}

/// Pitch class a perfect fifth above.
pub fn dominant_pc(pitch_class: u8) -> u8 {
    (pitch_class + 7) % 12
}

/// Pitch class of the relative major, a minor third above.
pub fn relative_major_pc(pitch_class: u8) -> u8 {
    (pitch_class + 3) % 12
}

/// Pitch class of the relative minor, a minor third below.
pub fn relative_minor_pc(pitch_class: u8) -> u8 {
    (pitch_class + 9) % 12
}
