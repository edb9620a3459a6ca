//! Sample set collection
//!
//! Fans one payload out to the oracle [`SAMPLE_COUNT`] times and joins the
//! answers all-or-nothing. The first failure wins; siblings keep running as
//! detached tasks and whatever they return is dropped.

use crate::error::AnalysisError;
use crate::input::AudioPayload;
use crate::models::{Sample, SampleSet, SAMPLE_COUNT};
use crate::oracle::Oracle;
use crate::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Issues concurrent oracle calls for one input
pub struct SampleCollector {
    oracle: Arc<dyn Oracle>,
    timeout: Duration,
}

impl SampleCollector {
    pub fn new(oracle: Arc<dyn Oracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Collect a full sample set (fail-fast, no partial credit)
    pub async fn collect(&self, payload: Arc<AudioPayload>) -> Result<SampleSet> {
        let mut pending: FuturesUnordered<_> = (0..SAMPLE_COUNT)
            .map(|slot| {
                let handle = tokio::spawn(classify_with_timeout(
                    Arc::clone(&self.oracle),
                    Arc::clone(&payload),
                    self.timeout,
                    slot,
                ));
                async move { (slot, handle.await) }
            })
            .collect();

        debug!(
            calls = SAMPLE_COUNT,
            timeout_ms = self.timeout.as_millis() as u64,
            "Oracle calls issued"
        );

        let mut slots: [Option<Sample>; SAMPLE_COUNT] = Default::default();

        while let Some((slot, joined)) = pending.next().await {
            let outcome = joined.map_err(|e| {
                AnalysisError::Transport(format!("oracle call {} aborted: {}", slot, e))
            })?;

            match outcome {
                Ok(sample) => slots[slot] = Some(sample),
                Err(e) => {
                    warn!(
                        slot,
                        kind = %e.kind(),
                        error = %e,
                        "Oracle call failed - abandoning sample set"
                    );
                    return Err(e);
                }
            }
        }

        match slots {
            [Some(a), Some(b), Some(c)] => Ok(SampleSet::new([a, b, c])),
            _ => Err(AnalysisError::Transport(
                "oracle calls settled without a complete sample set".to_string(),
            )),
        }
    }
}

async fn classify_with_timeout(
    oracle: Arc<dyn Oracle>,
    payload: Arc<AudioPayload>,
    timeout: Duration,
    slot: usize,
) -> Result<Sample> {
    let start = Instant::now();

    let outcome = match tokio::time::timeout(timeout, oracle.classify(&payload)).await {
        Ok(result) => result,
        Err(_) => Err(AnalysisError::Timeout(timeout)),
    };

    debug!(
        slot,
        elapsed_ms = start.elapsed().as_millis() as u64,
        success = outcome.is_ok(),
        "Oracle call settled"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::oracle::{MockOracle, MockResponse};
    use crate::test_fixtures::{sample, sample_json};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    const METRICS: &[f64] = &[60.0, 70.0, 80.0, 90.0];

    fn payload() -> Arc<AudioPayload> {
        Arc::new(AudioPayload {
            mime_type: "audio/wav".to_string(),
            data: "UklGRg==".to_string(),
        })
    }

    fn collector(oracle: Arc<dyn Oracle>, timeout: Duration) -> SampleCollector {
        SampleCollector::new(oracle, timeout)
    }

    #[tokio::test]
    async fn test_collects_three_samples() {
        let mock = Arc::new(MockOracle::new(vec![
            MockResponse::Sample(sample(70.0, "Ado", METRICS)),
            MockResponse::Sample(sample(75.0, "Ado", METRICS)),
            MockResponse::Sample(sample(80.0, "Ado", METRICS)),
        ]));

        let set = assert_ok!(
            collector(mock.clone(), Duration::from_secs(5))
                .collect(payload())
                .await
        );

        let mut scores: Vec<f64> = set.iter().map(|s| s.overall_score).collect();
        scores.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(scores, vec![70.0, 75.0, 80.0]);
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_fails_the_set() {
        let slow = Duration::from_millis(400);
        let mock = Arc::new(MockOracle::with_delays(vec![
            (slow, MockResponse::Sample(sample(80.0, "Ado", METRICS))),
            (Duration::ZERO, MockResponse::Transport("connection reset".into())),
            (slow, MockResponse::Sample(sample(85.0, "Ado", METRICS))),
        ]));

        let start = Instant::now();
        let err = assert_err!(
            collector(mock.clone(), Duration::from_secs(5))
                .collect(payload())
                .await
        );

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(start.elapsed() < slow, "did not fail fast: {:?}", start.elapsed());
        assert_eq!(mock.calls(), 3);

        // Siblings are left running, not cancelled
        tokio::time::sleep(slow + Duration::from_millis(200)).await;
        assert_eq!(mock.completed(), 3);
    }

    #[tokio::test]
    async fn test_schema_failure_propagates_kind() {
        let mock = Arc::new(MockOracle::new(vec![
            MockResponse::Json(sample_json(80.0, "Ado", METRICS)),
            MockResponse::Json(json!({ "overallScore": 80, "verdict": "missing the rest" })),
            MockResponse::Json(sample_json(80.0, "Ado", METRICS)),
        ]));

        let err = assert_err!(
            collector(mock, Duration::from_secs(5))
                .collect(payload())
                .await
        );
        assert_eq!(err.kind(), ErrorKind::SchemaValidation);
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let mock = Arc::new(MockOracle::with_delays(vec![
            (Duration::ZERO, MockResponse::Sample(sample(80.0, "Ado", METRICS))),
            (Duration::from_secs(10), MockResponse::Sample(sample(80.0, "Ado", METRICS))),
            (Duration::ZERO, MockResponse::Sample(sample(80.0, "Ado", METRICS))),
        ]));

        let err = assert_err!(
            collector(mock, Duration::from_millis(50))
                .collect(payload())
                .await
        );

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(matches!(err, AnalysisError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
