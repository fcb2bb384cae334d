//! Request and response bodies of the mood and recommendation endpoints.

use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Message used when no usable frame could be captured.
pub const CAPTURE_FAILED_MESSAGE: &str = "Failed to capture image";

/// An encoded webcam frame ready for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    bytes: Vec<u8>,
    file_name: String,
    mime: String,
}

impl CapturedFrame {
    /// A JPEG frame, as produced by a canvas snapshot.
    ///
    /// Fails without touching the network if the buffer is empty.
    pub fn jpeg(bytes: impl Into<Vec<u8>>) -> ClientResult<Self> {
        Self::new(bytes, "capture.jpg", "image/jpeg")
    }

    /// A frame with an explicit file name and MIME type.
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        file_name: impl Into<String>,
        mime: impl Into<String>,
    ) -> ClientResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(ClientError::Capture(CAPTURE_FAILED_MESSAGE.to_string()));
        }
        Ok(Self {
            bytes,
            file_name: file_name.into(),
            mime: mime.into(),
        })
    }

    /// Encoded image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Upload file name.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type.
    pub fn mime(&self) -> &str {
        &self.mime
    }
}

/// Result of `/api/mood/detect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReport {
    /// Strongest emotion
    pub dominant_emotion: String,

    /// Emotion scores in percent
    #[serde(default)]
    pub emotions: HashMap<String, f64>,
}

impl MoodReport {
    /// Emotions sorted by descending score.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .emotions
            .iter()
            .map(|(name, score)| (name.as_str(), *score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}

/// Body of `/api/music/recommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    /// Free-text mood, or a detected emotion
    pub mood_description: String,
}

/// Result of `/api/music/recommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    /// Suggested songs as formatted by the backend
    pub suggested_songs: String,

    /// Spotify playlist created for this mood
    pub playlist_url: String,
}

/// FastAPI-style error body.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Best human-readable message in the body.
    pub(crate) fn message(&self) -> Option<String> {
        match &self.detail {
            Some(serde_json::Value::String(detail)) if !detail.is_empty() => Some(detail.clone()),
            // Validation errors come back as a list of objects.
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .next()
                .map(String::from),
            _ => self.error.clone().filter(|e| !e.is_empty()),
        }
    }
}
