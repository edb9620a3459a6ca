//! Vocal Consensus
//!
//! Judges an audio clip by asking a non-deterministic oracle three times and
//! fusing the answers into one stable verdict:
//! - Issues the three oracle calls concurrently, failing fast on any error
//! - Validates every oracle answer against a fixed schema
//! - Fuses scores by rounded mean and free text by representative pick
//! - Hides failure details from end users while keeping them in logs
//!
//! PIPELINE:
//! INPUT → ENCODE → COLLECT ×3 → AGGREGATE → CONSENSUS

pub mod analyzer;
pub mod api;
pub mod collector;
pub mod config;
pub mod consensus;
pub mod error;
pub mod input;
pub mod models;
pub mod oracle;
pub mod schema;

// Canned samples for tests and local development
pub mod test_fixtures;

pub use error::Result;

// Re-export common types
pub use analyzer::VocalAnalyzer;
pub use config::Config;
pub use error::{AnalysisError, AnalysisFailure, ErrorKind};
pub use input::AudioInput;
pub use models::*;
pub use oracle::{GeminiOracle, MockOracle, MockResponse, Oracle};
