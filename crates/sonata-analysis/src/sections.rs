//! Sonata-form section synthesis.
//!
//! The form is laid out proportionally: exposition over the first 35% of
//! the piece, development to 70%, recapitulation to the end, with fixed
//! subdivisions inside each span. [`SECTION_TABLE`] holds the whole
//! partition so the shape is auditable in one place. Key areas only
//! influence the labels and the development confidence, never the
//! boundaries.

use music_theory::pitch::{dominant_pc, note_name, parse_note_name, relative_major_pc, FLAT_ROOTS};

use crate::result::{ascii_flats, KeyArea, KeySummary, Section, SectionKind};

pub(crate) const EXPOSITION_END_FRAC: f64 = 0.35;
pub(crate) const DEVELOPMENT_END_FRAC: f64 = 0.70;

#[derive(Clone, Copy)]
enum ParentSpan {
    Exposition,
    Development,
    Recapitulation,
}

#[derive(Clone, Copy)]
enum SectionKeySource {
    Primary,
    Modulating,
    Secondary,
    Unstable,
}

struct SectionSpec {
    kind: SectionKind,
    parent: ParentSpan,
    start_frac: f64,
    end_frac: f64,
    confidence: f64,
    key_source: SectionKeySource,
}

/// The nine-section partition: each entry places one section inside its
/// parent span by fractional boundaries and carries its base confidence.
const SECTION_TABLE: [SectionSpec; 9] = [
    SectionSpec {
        kind: SectionKind::ExpositionTheme1,
        parent: ParentSpan::Exposition,
        start_frac: 0.0,
        end_frac: 0.40,
        confidence: 0.85,
        key_source: SectionKeySource::Primary,
    },
    SectionSpec {
        kind: SectionKind::ExpositionTransition,
        parent: ParentSpan::Exposition,
        start_frac: 0.40,
        end_frac: 0.55,
        confidence: 0.75,
        key_source: SectionKeySource::Modulating,
    },
    SectionSpec {
        kind: SectionKind::ExpositionTheme2,
        parent: ParentSpan::Exposition,
        start_frac: 0.55,
        end_frac: 0.85,
        confidence: 0.80,
        key_source: SectionKeySource::Secondary,
    },
    SectionSpec {
        kind: SectionKind::ExpositionClosing,
        parent: ParentSpan::Exposition,
        start_frac: 0.85,
        end_frac: 1.0,
        confidence: 0.70,
        key_source: SectionKeySource::Secondary,
    },
    SectionSpec {
        kind: SectionKind::Development,
        parent: ParentSpan::Development,
        start_frac: 0.0,
        end_frac: 1.0,
        confidence: 0.75,
        key_source: SectionKeySource::Unstable,
    },
    SectionSpec {
        kind: SectionKind::RecapitulationTheme1,
        parent: ParentSpan::Recapitulation,
        start_frac: 0.0,
        end_frac: 0.35,
        confidence: 0.80,
        key_source: SectionKeySource::Primary,
    },
    SectionSpec {
        kind: SectionKind::RecapitulationTransition,
        parent: ParentSpan::Recapitulation,
        start_frac: 0.35,
        end_frac: 0.45,
        confidence: 0.70,
        key_source: SectionKeySource::Primary,
    },
    SectionSpec {
        kind: SectionKind::RecapitulationTheme2,
        parent: ParentSpan::Recapitulation,
        start_frac: 0.45,
        end_frac: 0.75,
        confidence: 0.80,
        key_source: SectionKeySource::Primary,
    },
    SectionSpec {
        kind: SectionKind::Coda,
        parent: ParentSpan::Recapitulation,
        start_frac: 0.75,
        end_frac: 1.0,
        confidence: 0.75,
        key_source: SectionKeySource::Primary,
    },
];

/// Lay out the nine sections over `duration` seconds.
pub fn synthesize_sections(
    duration: f64,
    key_areas: &[KeyArea],
    global_key: Option<&KeySummary>,
) -> Vec<Section> {
    let exposition_end = duration * EXPOSITION_END_FRAC;
    let development_end = duration * DEVELOPMENT_END_FRAC;

    let primary = primary_key_label(global_key, key_areas);
    let secondary = secondary_key_label(key_areas, &primary, exposition_end);

    SECTION_TABLE
        .iter()
        .map(|spec| {
            let (parent_start, parent_end) = match spec.parent {
                ParentSpan::Exposition => (0.0, exposition_end),
                ParentSpan::Development => (exposition_end, development_end),
                ParentSpan::Recapitulation => (development_end, duration),
            };
            let span = parent_end - parent_start;

            let confidence = match spec.kind {
                SectionKind::Development => {
                    let stability = key_stability(key_areas, exposition_end, development_end);
                    spec.confidence + (1.0 - stability) * 0.20
                }
                _ => spec.confidence,
            };

            let musical_key = match spec.key_source {
                SectionKeySource::Primary => primary.clone(),
                SectionKeySource::Modulating => "modulating".to_string(),
                SectionKeySource::Secondary => secondary.clone(),
                SectionKeySource::Unstable => "unstable".to_string(),
            };

            Section {
                kind: spec.kind,
                start_time: parent_start + span * spec.start_frac,
                end_time: parent_start + span * spec.end_frac,
                confidence,
                description: describe(spec.kind, &primary, &secondary),
                musical_key,
            }
        })
        .collect()
}

/// The label everything tonic-related hangs off: the global key when it
/// exists, else the first key area, else a plain C major guess.
pub(crate) fn primary_key_label(global_key: Option<&KeySummary>, key_areas: &[KeyArea]) -> String {
    global_key
        .map(|key| key.label())
        .or_else(|| key_areas.first().map(|area| area.key.label()))
        .unwrap_or_else(|| "C major".to_string())
}

/// Pick the secondary key: a mid-exposition key area in a foreign key if
/// one exists, otherwise the textbook answer derived from the primary
/// (dominant of a major key, relative major of a minor one).
fn secondary_key_label(key_areas: &[KeyArea], primary: &str, exposition_end: f64) -> String {
    let mid_area = key_areas.iter().find(|area| {
        area.start_sec > exposition_end * 0.40
            && area.start_sec < exposition_end
            && area.key.label() != primary
    });
    if let Some(area) = mid_area {
        return area.key.label();
    }

    theoretic_secondary(primary).unwrap_or_else(|| format!("V of {}", primary))
}

fn theoretic_secondary(primary: &str) -> Option<String> {
    let (tonic, mode) = primary.rsplit_once(' ')?;
    let pc = parse_note_name(tonic)?;
    let target = match mode {
        "major" => dominant_pc(pc),
        "minor" => relative_major_pc(pc),
        _ => return None,
    };
    let name = note_name(target, FLAT_ROOTS.contains(&target));
    Some(ascii_flats(&format!("{} major", name)))
}

/// Inverse of the number of distinct keys holding sway between `start` and
/// `end`; 0.5 when no key area sits fully inside the span.
fn key_stability(key_areas: &[KeyArea], start: f64, end: f64) -> f64 {
    let mut labels: Vec<String> = key_areas
        .iter()
        .filter(|area| area.start_sec >= start && area.end_sec <= end)
        .map(|area| area.key.label())
        .collect();
    if labels.is_empty() {
        return 0.5;
    }
    labels.sort();
    labels.dedup();
    1.0 / labels.len() as f64
}

fn describe(kind: SectionKind, primary: &str, secondary: &str) -> String {
    match kind {
        SectionKind::ExpositionTheme1 => format!("First theme area in {}", primary),
        SectionKind::ExpositionTransition => {
            "Transitional passage modulating to secondary key".to_string()
        }
        SectionKind::ExpositionTheme2 => format!("Second theme area in {}", secondary),
        SectionKind::ExpositionClosing => "Closing theme confirming secondary key".to_string(),
        SectionKind::Development => {
            "Development section with thematic fragmentation and key exploration".to_string()
        }
        SectionKind::RecapitulationTheme1 => format!("Return of first theme in {}", primary),
        SectionKind::RecapitulationTransition => "Modified transition remaining in tonic".to_string(),
        SectionKind::RecapitulationTheme2 => format!("Second theme now in {}", primary),
        SectionKind::Coda => format!("Coda confirming {}", primary),
    }
}
