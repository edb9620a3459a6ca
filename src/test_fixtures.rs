//! Canned oracle samples for development and testing
//!
//! Lets the pipeline run deterministically without ever calling the real oracle.

use crate::models::{
    CareerDecision, IdentifiedArtist, MusicalTheoryAnalysis, ProductionAnalysis, Sample,
    VocalMetric,
};

/// Metric labels used by [`sample`]
pub const METRIC_LABELS: &[&str] = &[
    "Pitch Accuracy",
    "Breath Control",
    "Tone Quality",
    "Rhythmic Precision",
];

/// Build a sample whose free text is tagged with its overall score, so tests
/// can tell which sample a field came from.
///
/// # Example
/// ```
/// use vocal_consensus::test_fixtures::sample;
/// let s = sample(85.0, "Ado", &[70.0, 80.0, 90.0, 60.0]);
/// assert_eq!(s.verdict, "verdict@85");
/// assert_eq!(s.metrics.len(), 4);
/// ```
pub fn sample(overall_score: f64, artist: &str, metric_scores: &[f64]) -> Sample {
    let tag = format!("@{}", overall_score);

    Sample {
        overall_score,
        verdict: format!("verdict{}", tag),
        brutal_honesty: format!("honesty{}", tag),
        detected_key: format!("key{}", tag),
        career_decision: decision_for(overall_score),
        identified_artist: IdentifiedArtist {
            name: artist.to_string(),
            confidence: overall_score,
            is_original: overall_score >= 90.0,
            signature_reasoning: format!("reasoning{}", tag),
            notes: format!("notes{}", tag),
        },
        metrics: metric_scores
            .iter()
            .enumerate()
            .map(|(idx, score)| VocalMetric {
                label: METRIC_LABELS
                    .get(idx)
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| format!("Metric {}", idx + 1)),
                score: *score,
                description: format!("metric {} {}", idx + 1, tag),
            })
            .collect(),
        musical_theory_analysis: MusicalTheoryAnalysis {
            pitch: format!("pitch{}", tag),
            timing: format!("timing{}", tag),
            timbre: format!("timbre{}", tag),
            tonal_consistency: format!("tonal{}", tag),
        },
        production_analysis: ProductionAnalysis {
            mixing: format!("mixing{}", tag),
            levelization: format!("levels{}", tag),
            processing: format!("processing{}", tag),
        },
        strengths: vec![format!("strength{}", tag)],
        industry_viability: format!("viability{}", tag),
        redirection_advice: format!("advice{}", tag),
        recommended_path: format!("path{}", tag),
    }
}

/// Same as [`sample`], as the raw JSON an oracle would send
pub fn sample_json(overall_score: f64, artist: &str, metric_scores: &[f64]) -> serde_json::Value {
    serde_json::to_value(sample(overall_score, artist, metric_scores))
        .unwrap_or(serde_json::Value::Null)
}

fn decision_for(score: f64) -> CareerDecision {
    match score {
        s if s >= 85.0 => CareerDecision::Proceed,
        s if s >= 60.0 => CareerDecision::Train,
        s if s >= 30.0 => CareerDecision::Pivot,
        _ => CareerDecision::Stop,
    }
}
