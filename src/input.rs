//! Input artifacts and their oracle payload form

use crate::error::AnalysisError;
use crate::Result;
use base64::{engine::general_purpose, Engine as _};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// Largest clip accepted by default (10 MiB)
pub const DEFAULT_MAX_AUDIO_BYTES: usize = 10 * 1024 * 1024;

/// Raw audio as handed over by the presentation layer
#[derive(Debug, Clone)]
pub struct AudioInput {
    bytes: Vec<u8>,
    media_type: String,
    file_name: Option<String>,
}

impl AudioInput {
    /// Wrap raw bytes with their declared media type.
    ///
    /// Rejects empty clips and anything that is not `audio/*`.
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>) -> Result<Self> {
        let media_type = normalize_media_type(&media_type.into());

        if bytes.is_empty() {
            return Err(AnalysisError::InvalidInput("audio clip is empty".to_string()));
        }

        if !media_type.starts_with("audio/") {
            return Err(AnalysisError::InvalidInput(format!(
                "expected an audio/* media type, got '{}'",
                media_type
            )));
        }

        Ok(Self {
            bytes,
            media_type,
            file_name: None,
        })
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Load a clip from disk, sniffing its media type from magic bytes and
    /// falling back to the file extension.
    ///
    /// Files larger than `max_bytes` are rejected before they are read.
    pub async fn from_path(path: impl AsRef<Path>, max_bytes: usize) -> Result<Self> {
        let path = path.as_ref();

        let size = tokio::fs::metadata(path).await?.len();
        if size > max_bytes as u64 {
            return Err(AnalysisError::InvalidInput(format!(
                "{} is {} bytes; the limit is {} bytes",
                path.display(),
                size,
                max_bytes
            )));
        }

        let bytes = tokio::fs::read(path).await?;

        let media_type = sniff_media_type(&bytes)
            .or_else(|| media_type_from_extension(path))
            .ok_or_else(|| {
                AnalysisError::InvalidInput(format!(
                    "cannot determine an audio media type for {}",
                    path.display()
                ))
            })?;

        debug!(
            path = %path.display(),
            media_type = %media_type,
            bytes = bytes.len(),
            "Loaded audio input"
        );

        let input = Self::new(bytes, media_type)?;
        Ok(match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => input.with_file_name(name),
            None => input,
        })
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex SHA-256 of the raw bytes, used to correlate log lines
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(&self.bytes))
    }

    /// Encode into the form the oracle consumes
    pub fn to_payload(&self) -> AudioPayload {
        AudioPayload {
            mime_type: self.media_type.clone(),
            data: general_purpose::STANDARD.encode(&self.bytes),
        }
    }
}

/// Base64 audio plus media type, shared read-only by concurrent oracle calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub mime_type: String,
    pub data: String,
}

/// Strip parameters (`audio/mpeg; charset=...`) and lowercase
fn normalize_media_type(raw: &str) -> String {
    raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
}

fn sniff_media_type(bytes: &[u8]) -> Option<String> {
    infer::get(bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Audio)
        .map(|kind| kind.mime_type().to_string())
}

fn media_type_from_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "flac" => "audio/flac",
        "aiff" | "aif" => "audio/aiff",
        "webm" => "audio/webm",
        _ => return None,
    };
    Some(media_type.to_string())
}
