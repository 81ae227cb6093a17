//! Staged analysis orchestration.

use std::sync::Arc;

use midi_score::Score;
use music_theory::{HeuristicTheory, TheoryProvider};
use tracing::warn;

use crate::cadences::detect_cadences;
use crate::duration::resolve_duration;
use crate::key_areas::analyze_key_areas;
use crate::result::{AnalysisResult, Diagnostics, KeyAnalysis};
use crate::sections::{primary_key_label, synthesize_sections};
use crate::themes::extract_themes;
use crate::timebase::Timebase;

/// Runs the analysis stages in order and assembles the result.
///
/// The theory capabilities sit behind [`TheoryProvider`] so tests can
/// inject failing or scripted implementations. A stage that fails degrades
/// to its neutral default; the run as a whole always produces a result.
pub struct AnalysisPipeline {
    theory: Arc<dyn TheoryProvider>,
}

impl AnalysisPipeline {
    pub fn new() -> Self {
        Self::with_provider(Arc::new(HeuristicTheory))
    }

    pub fn with_provider(theory: Arc<dyn TheoryProvider>) -> Self {
        Self { theory }
    }

    pub fn analyze(&self, score: &Score) -> AnalysisResult {
        let timebase = Timebase::from_score(score);
        let duration = resolve_duration(score, &timebase);

        let (global_key, key_areas) =
            analyze_key_areas(self.theory.as_ref(), score, duration, &timebase);

        let themes = extract_themes(score, &timebase);

        let cadences = match detect_cadences(self.theory.as_ref(), score, &timebase) {
            Ok(cadences) => cadences,
            Err(err) => {
                warn!(error = %err, "cadence detection failed, continuing without cadences");
                Vec::new()
            }
        };

        let sections = synthesize_sections(duration, &key_areas, global_key.as_ref());
        let overall_confidence =
            sections.iter().map(|s| s.confidence).sum::<f64>() / sections.len() as f64;

        let primary_key = primary_key_label(global_key.as_ref(), &key_areas);
        let summary = format!(
            "Analysis of sonata form in {}. Identified {} structural sections with {:.0}% average confidence.",
            primary_key,
            sections.len(),
            overall_confidence * 100.0
        );

        let mut musical_insights = vec![
            format!("Primary key: {}", primary_key),
            format!("Total duration: {:.1} seconds", duration),
            format!("Key areas detected: {}", key_areas.len()),
            format!("Potential cadences: {}", cadences.len()),
        ];
        let mut labels: Vec<String> = key_areas.iter().map(|area| area.key.label()).collect();
        labels.sort();
        labels.dedup();
        if labels.len() > 3 {
            musical_insights
                .push("High key variety suggests extensive development section".to_string());
        }

        AnalysisResult {
            sections,
            overall_confidence,
            summary,
            musical_insights,
            key_analysis: KeyAnalysis {
                global_key,
                key_areas,
            },
            diagnostics: Diagnostics { themes, cadences },
        }
    }
}

impl Default for AnalysisPipeline {
    fn default() -> Self {
        Self::new()
    }
}
