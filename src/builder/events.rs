//! Pipeline event types for JSON output.
//!
//! These events are emitted, one JSON object per line, when using
//! `--message-format=json`.
//!
//! # Event Types
//!
//! - `stage-started`: A pipeline stage began
//! - `stage-finished`: A pipeline stage ended (success or failure)
//! - `artifact-installed`: A file was written to the install directory
//! - `pipeline-finished`: The run is over
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use serde::Serialize;

use crate::builder::error::{PipelineFailure, Stage};
use crate::core::artifact::InstalledArtifact;

/// An event emitted while the pipeline runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum PipelineEvent {
    StageStarted {
        stage: Stage,
    },

    StageFinished {
        stage: Stage,
        success: bool,
        duration_ms: u64,
    },

    ArtifactInstalled {
        #[serde(flatten)]
        artifact: InstalledArtifact,
    },

    PipelineFinished {
        success: bool,
        duration_ms: u64,
        /// Stage that failed, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        failed_stage: Option<Stage>,
        /// Machine-readable error kind (e.g., "tool-version-too-old")
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<&'static str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        artifacts: Vec<InstalledArtifact>,
    },
}

impl PipelineEvent {
    pub fn finished_ok(duration_ms: u64, artifacts: Vec<InstalledArtifact>) -> Self {
        PipelineEvent::PipelineFinished {
            success: true,
            duration_ms,
            failed_stage: None,
            error_kind: None,
            message: None,
            artifacts,
        }
    }

    pub fn finished_err(duration_ms: u64, failure: &PipelineFailure) -> Self {
        PipelineEvent::PipelineFinished {
            success: false,
            duration_ms,
            failed_stage: Some(failure.stage),
            error_kind: Some(failure.error.kind()),
            message: Some(failure.error.to_string()),
            artifacts: Vec::new(),
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
