//! Core data models for vocal analysis

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

/// Number of oracle samples fused into one consensus
pub const SAMPLE_COUNT: usize = 3;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum CareerDecision {
    Proceed,
    Train,
    Pivot,
    Stop,
}

//
// ================= Analysis =================
//

/// One complete structured judgment of an audio clip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocalAnalysis {
    pub overall_score: f64,
    pub verdict: String,
    pub brutal_honesty: String,
    pub detected_key: String,
    pub career_decision: CareerDecision,
    pub identified_artist: IdentifiedArtist,
    pub metrics: Vec<VocalMetric>,
    pub musical_theory_analysis: MusicalTheoryAnalysis,
    pub production_analysis: ProductionAnalysis,
    pub strengths: Vec<String>,
    pub industry_viability: String,
    pub redirection_advice: String,
    pub recommended_path: String,
}

/// A single oracle response
pub type Sample = VocalAnalysis;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedArtist {
    pub name: String,
    /// 0-100
    pub confidence: f64,
    /// True only for the official studio master of the original artist
    pub is_original: bool,
    pub signature_reasoning: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VocalMetric {
    pub label: String,
    /// 0-100
    pub score: f64,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MusicalTheoryAnalysis {
    pub pitch: String,
    pub timing: String,
    pub timbre: String,
    pub tonal_consistency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionAnalysis {
    pub mixing: String,
    pub levelization: String,
    pub processing: String,
}

//
// ================= Sample Set =================
//

/// Exactly [`SAMPLE_COUNT`] samples for one input, in request-slot order
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    samples: [Sample; SAMPLE_COUNT],
}

impl SampleSet {
    pub fn new(samples: [Sample; SAMPLE_COUNT]) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample; SAMPLE_COUNT] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

//
// ================= Consensus =================
//

/// The fused judgment returned to callers. Same JSON shape as a [`Sample`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ConsensusResult(VocalAnalysis);

impl ConsensusResult {
    pub(crate) fn new(analysis: VocalAnalysis) -> Self {
        Self(analysis)
    }

    pub fn into_inner(self) -> VocalAnalysis {
        self.0
    }
}

impl Deref for ConsensusResult {
    type Target = VocalAnalysis;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for CareerDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CareerDecision::Proceed => "PROCEED",
            CareerDecision::Train => "TRAIN",
            CareerDecision::Pivot => "PIVOT",
            CareerDecision::Stop => "STOP",
        };
        write!(f, "{}", s)
    }
}
