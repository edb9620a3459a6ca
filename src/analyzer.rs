//! Analysis orchestrator - the facade used by presentation layers
//!
//! INPUT → ENCODE → COLLECT (3 concurrent oracle calls) → AGGREGATE → RESULT

use crate::collector::SampleCollector;
use crate::config::Config;
use crate::consensus::aggregate;
use crate::error::AnalysisFailure;
use crate::input::AudioInput;
use crate::models::{ConsensusResult, SAMPLE_COUNT};
use crate::oracle::{GeminiOracle, Oracle};
use crate::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Runs one independent analysis per call; holds no per-request state
pub struct VocalAnalyzer {
    collector: SampleCollector,
}

impl VocalAnalyzer {
    pub fn new(oracle: Arc<dyn Oracle>, oracle_timeout: Duration) -> Self {
        Self {
            collector: SampleCollector::new(oracle, oracle_timeout),
        }
    }

    /// Analyzer backed by the Gemini oracle
    pub fn from_config(config: &Config) -> Result<Self> {
        let oracle = GeminiOracle::new(config.oracle.clone())?;
        Ok(Self::new(Arc::new(oracle), config.oracle.timeout))
    }

    /// Analyze one clip.
    ///
    /// Either every sample succeeds and fuses cleanly, or the call fails with a
    /// single classified [`AnalysisFailure`]. Nothing partial is returned.
    pub async fn analyze(
        &self,
        input: &AudioInput,
    ) -> std::result::Result<ConsensusResult, AnalysisFailure> {
        let analysis_id = Uuid::new_v4();
        let digest = input.digest();
        let start_time = Instant::now();

        info!(
            analysis_id = %analysis_id,
            audio_digest = %digest,
            media_type = %input.media_type(),
            bytes = input.len(),
            file_name = ?input.file_name(),
            "Analysis: starting"
        );

        let outcome = self.run(analysis_id, input).await;
        let elapsed_ms = start_time.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                info!(
                    analysis_id = %analysis_id,
                    overall_score = result.overall_score,
                    decision = %result.career_decision,
                    artist = %result.identified_artist.name,
                    elapsed_ms,
                    "Analysis: complete"
                );
                Ok(result)
            }
            Err(e) => {
                let failure = AnalysisFailure::from(e);
                error!(
                    analysis_id = %analysis_id,
                    audio_digest = %digest,
                    kind = %failure.kind(),
                    error = %failure.cause(),
                    elapsed_ms,
                    "Analysis: failed"
                );
                Err(failure)
            }
        }
    }

    async fn run(&self, analysis_id: Uuid, input: &AudioInput) -> Result<ConsensusResult> {
        let payload = Arc::new(input.to_payload());

        debug!(
            analysis_id = %analysis_id,
            samples = SAMPLE_COUNT,
            "Collecting oracle samples"
        );
        let samples = self.collector.collect(payload).await?;

        let scores: Vec<f64> = samples.iter().map(|s| s.overall_score).collect();
        debug!(analysis_id = %analysis_id, ?scores, "Samples collected - aggregating");

        aggregate(&samples)
    }
}
