//! Oracle trait and implementations
//!
//! The oracle is the external, non-deterministic classifier. Identical input
//! may produce different samples on every call.

use crate::error::AnalysisError;
use crate::input::AudioPayload;
use crate::models::Sample;
use crate::schema::validate_sample;
use crate::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub mod gemini;
pub use gemini::GeminiOracle;

/// Produces one validated sample per call
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Judge one audio payload
    async fn classify(&self, payload: &AudioPayload) -> Result<Sample>;
}

/// What a [`MockOracle`] answers for one call
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A ready-made sample
    Sample(Sample),
    /// Raw oracle JSON, run through schema validation like a real answer
    Json(serde_json::Value),
    /// A network-level failure
    Transport(String),
}

#[derive(Debug, Clone)]
struct MockCall {
    delay: Duration,
    response: MockResponse,
}

/// Scripted oracle for development & testing.
///
/// Call `n` (in the order calls start) gets script entry `n % len`. The mock
/// never sees which collector slot a call belongs to, so entries map to slots
/// deterministically only on the current-thread test runtime. On a
/// multi-threaded runtime any slot may receive any entry; tests there should
/// assert on results that do not depend on slot placement.
pub struct MockOracle {
    script: Vec<MockCall>,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl MockOracle {
    pub fn new(responses: Vec<MockResponse>) -> Self {
        Self::with_delays(responses.into_iter().map(|r| (Duration::ZERO, r)).collect())
    }

    /// Each response is returned after its paired delay
    pub fn with_delays(responses: Vec<(Duration, MockResponse)>) -> Self {
        Self {
            script: responses
                .into_iter()
                .map(|(delay, response)| MockCall { delay, response })
                .collect(),
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same sample
    pub fn repeating(sample: Sample) -> Self {
        Self::new(vec![MockResponse::Sample(sample)])
    }

    /// Calls started so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that ran to the end of their delay, whether or not anyone kept
    /// waiting for them
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for MockOracle {
    async fn classify(&self, _payload: &AudioPayload) -> Result<Sample> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);

        let call = self.script.get(n % self.script.len().max(1)).cloned().ok_or_else(|| {
            AnalysisError::Transport("mock oracle has no scripted responses".to_string())
        })?;

        if !call.delay.is_zero() {
            tokio::time::sleep(call.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        match call.response {
            MockResponse::Sample(sample) => Ok(sample),
            MockResponse::Json(value) => validate_sample(value),
            MockResponse::Transport(message) => Err(AnalysisError::Transport(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn payload() -> AudioPayload {
        AudioPayload {
            mime_type: "audio/wav".to_string(),
            data: "AAAA".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mock_cycles_script() {
        let oracle = MockOracle::new(vec![
            MockResponse::Transport("first".into()),
            MockResponse::Json(json!({ "overallScore": 50 })),
        ]);

        let first = oracle.classify(&payload()).await.unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Transport);

        let second = oracle.classify(&payload()).await.unwrap_err();
        assert_eq!(second.kind(), ErrorKind::SchemaValidation);

        let third = oracle.classify(&payload()).await.unwrap_err();
        assert_eq!(third.kind(), ErrorKind::Transport);

        assert_eq!(oracle.calls(), 3);
        assert_eq!(oracle.completed(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let oracle = MockOracle::new(vec![]);
        assert!(oracle.classify(&payload()).await.is_err());
    }
}
