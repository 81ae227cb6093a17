//! Analysis result model and its JSON wire shape.
//!
//! Everything here serializes with camelCase field names; enum-like fields
//! use the lowercase strings clients match on. Flat accidentals are spelled
//! with an ASCII `b` so labels survive naive string handling downstream.

use std::fmt;

use music_theory::{KeyEstimate, KeyMode};
use serde::{Deserialize, Serialize};

/// Rewrite `♭` to ASCII `b` in note and key labels.
pub(crate) fn ascii_flats(text: &str) -> String {
    text.replace('♭', "b")
}

/// A detected key with its profile correlation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySummary {
    pub tonic: String,
    pub mode: KeyMode,
    pub correlation: f64,
}

impl KeySummary {
    pub fn from_estimate(estimate: &KeyEstimate) -> Self {
        Self {
            tonic: ascii_flats(&estimate.tonic),
            mode: estimate.mode,
            correlation: estimate.correlation,
        }
    }

    /// Human-readable label, e.g. `"Bb major"`.
    pub fn label(&self) -> String {
        format!("{} {}", self.tonic, self.mode)
    }
}

/// A span of the piece governed by one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyArea {
    pub key: KeySummary,
    pub start_sec: f64,
    pub end_sec: f64,
}

/// Key findings: the whole-piece estimate plus local areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAnalysis {
    pub global_key: Option<KeySummary>,
    pub key_areas: Vec<KeyArea>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourDirection {
    Ascending,
    Descending,
}

/// Features of one sliding melody window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeWindow {
    pub start_sec: f64,
    pub end_sec: f64,
    pub melodic_range: u32,
    pub avg_interval: f64,
    pub rhythmic_density: f64,
    pub contour_direction: ContourDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CadenceKind {
    Authentic,
    Half,
}

/// A cadence located at a chord change within one measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cadence {
    #[serde(rename = "type")]
    pub kind: CadenceKind,
    pub measure: usize,
    pub offset_sec: f64,
    pub key: String,
}

/// The nine structural roles of the sonata partition, in score order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    ExpositionTheme1,
    ExpositionTransition,
    ExpositionTheme2,
    ExpositionClosing,
    Development,
    RecapitulationTheme1,
    RecapitulationTransition,
    RecapitulationTheme2,
    Coda,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::ExpositionTheme1 => "exposition-theme1",
            SectionKind::ExpositionTransition => "exposition-transition",
            SectionKind::ExpositionTheme2 => "exposition-theme2",
            SectionKind::ExpositionClosing => "exposition-closing",
            SectionKind::Development => "development",
            SectionKind::RecapitulationTheme1 => "recapitulation-theme1",
            SectionKind::RecapitulationTransition => "recapitulation-transition",
            SectionKind::RecapitulationTheme2 => "recapitulation-theme2",
            SectionKind::Coda => "coda",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural section of the synthesized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionKind,
    pub start_time: f64,
    pub end_time: f64,
    pub confidence: f64,
    pub description: String,
    pub musical_key: String,
}

/// Raw per-stage evidence carried alongside the synthesized sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub themes: Vec<ThemeWindow>,
    pub cadences: Vec<Cadence>,
}

/// Complete output of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub sections: Vec<Section>,
    pub overall_confidence: f64,
    pub summary: String,
    pub musical_insights: Vec<String>,
    pub key_analysis: KeyAnalysis,
    pub diagnostics: Diagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_tonics_are_normalized_to_ascii() {
        let estimate = KeyEstimate {
            tonic: "E♭".to_string(),
            tonic_pc: 3,
            mode: KeyMode::Major,
            correlation: 0.91,
        };
        let summary = KeySummary::from_estimate(&estimate);
        assert_eq!(summary.tonic, "Eb");
        assert_eq!(summary.label(), "Eb major");
    }

    #[test]
    fn section_kind_serializes_as_kebab_case() {
        let json = serde_json::to_value(SectionKind::RecapitulationTheme1).unwrap();
        assert_eq!(json, serde_json::json!("recapitulation-theme1"));
        assert_eq!(
            SectionKind::RecapitulationTheme1.as_str(),
            "recapitulation-theme1"
        );
    }

    #[test]
    fn cadence_wire_shape_uses_type_field() {
        let cadence = Cadence {
            kind: CadenceKind::Authentic,
            measure: 3,
            offset_sec: 7.5,
            key: "C major".to_string(),
        };
        let json = serde_json::to_value(&cadence).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "authentic",
                "measure": 3,
                "offsetSec": 7.5,
                "key": "C major",
            })
        );
    }
}
