//! Heuristic sonata-form analysis.
//!
//! The pipeline takes a decoded [`midi_score::Score`] and produces an
//! [`AnalysisResult`]: nine structural sections laid out over the piece's
//! duration, annotated with key areas, theme contours and cadences. Each
//! stage degrades to a neutral default when its input defeats it, so a
//! parseable file always yields a complete result.

pub mod cadences;
pub mod duration;
pub mod key_areas;
pub mod pipeline;
pub mod result;
pub mod sections;
pub mod themes;
pub mod timebase;

pub use cadences::detect_cadences;
pub use duration::{resolve_duration, FALLBACK_DURATION_SECS};
pub use key_areas::analyze_key_areas;
pub use pipeline::AnalysisPipeline;
pub use result::{
    AnalysisResult, Cadence, CadenceKind, ContourDirection, Diagnostics, KeyAnalysis, KeyArea,
    KeySummary, Section, SectionKind, ThemeWindow,
};
pub use sections::synthesize_sections;
pub use themes::extract_themes;
pub use timebase::Timebase;

/// Errors surfaced by individual analysis stages.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("theory capability failed: {0}")]
    Theory(#[from] music_theory::TheoryError),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
