//! Vision analysis port.
//!
//! The core treats image understanding as a black box behind
//! [`VisionAnalyzer`]: one operation analyzes a single room photo against a
//! checklist, the other contrasts a check-in photo with a check-out photo of
//! the same room. Two interchangeable HTTP backends are provided (the hosted
//! Anthropic Messages API and any OpenAI-compatible endpoint such as a local
//! Ollama running a llava-class model) plus a scriptable mock for tests.
//!
//! Malformed model output never escapes this module: the backends parse
//! leniently and fall back to a neutral result. Transport failures do
//! surface as [`VisionError`] so callers can degrade explicitly.

pub mod anthropic;
pub mod mock;
pub mod openai;
mod prompt;

pub use anthropic::AnthropicVision;
pub use mock::MockVision;
pub use openai::OpenAiVision;

use std::path::Path;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Error raised by a vision backend. Parse failures of the model's own
/// output are absorbed into neutral results and never reported here.
#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("vision backend unavailable: {0}")]
    Unavailable(String),
    #[error("vision request failed: {0}")]
    RequestFailed(String),
    #[error("failed to read image {path}: {source}")]
    Image {
        path: String,
        source: std::io::Error,
    },
}

/// Structured findings for a single room photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAnalysis {
    #[serde(default)]
    pub missing_items: Vec<String>,
    #[serde(default)]
    pub damage_detected: Vec<String>,
    #[serde(default)]
    pub cleanliness_issues: Vec<String>,
    #[serde(default = "neutral_score")]
    pub condition_score: u8,
}

fn neutral_score() -> u8 {
    5
}

impl RoomAnalysis {
    /// Safe default: nothing found, neutral condition.
    pub fn neutral() -> Self {
        Self {
            missing_items: Vec::new(),
            damage_detected: Vec::new(),
            cleanliness_issues: Vec::new(),
            condition_score: neutral_score(),
        }
    }
}

/// Direction of a room's condition between check-in and check-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionChange {
    Better,
    #[default]
    Same,
    Worse,
}

/// Structured findings from contrasting a before/after photo pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoComparison {
    #[serde(default)]
    pub new_damage: Vec<String>,
    #[serde(default)]
    pub missing_items: Vec<String>,
    #[serde(default)]
    pub condition_change: ConditionChange,
    #[serde(default)]
    pub recommended_claim: bool,
    #[serde(default)]
    pub estimated_damage_cost: f64,
}

impl PhotoComparison {
    /// Safe default: no change, no claim.
    pub fn neutral() -> Self {
        Self {
            new_damage: Vec::new(),
            missing_items: Vec::new(),
            condition_change: ConditionChange::Same,
            recommended_claim: false,
            estimated_damage_cost: 0.0,
        }
    }
}

/// External image-understanding capability the core delegates to.
#[async_trait]
pub trait VisionAnalyzer: Send + Sync {
    /// Backend identifier for logs (backend/model).
    fn id(&self) -> &str;

    /// Analyze a room photo against the room's checklist.
    async fn analyze(
        &self,
        image: &Path,
        checklist: &[String],
        room_name: &str,
    ) -> Result<RoomAnalysis, VisionError>;

    /// Contrast a check-in photo with a check-out photo of the same room.
    async fn compare(
        &self,
        before: &Path,
        after: &Path,
        room_name: &str,
    ) -> Result<PhotoComparison, VisionError>;
}

pub(crate) async fn encoded_image(path: &Path) -> Result<(String, &'static str), VisionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| VisionError::Image {
            path: path.display().to_string(),
            source,
        })?;
    let media_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
        _ => "image/jpeg",
    };
    Ok((
        base64::engine::general_purpose::STANDARD.encode(bytes),
        media_type,
    ))
}

pub(crate) fn transport_error(err: reqwest::Error) -> VisionError {
    if err.is_timeout() || err.is_connect() {
        VisionError::Unavailable(err.to_string())
    } else {
        VisionError::RequestFailed(err.to_string())
    }
}
