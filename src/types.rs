//! Core types for contact-archiver

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use utoipa::ToSchema;

/// Phase of the archive job
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No job has been started, or the last one was reset
    #[default]
    Idle,
    /// Job started and still accumulating progress
    Running,
    /// Job finished and the artifact is available
    Complete,
}

impl Phase {
    /// Lowercase name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a completed archive job
///
/// Cloning is cheap: the serialized content is shared.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchiveArtifact {
    /// Download name/path the caller serves the content under
    pub location: PathBuf,
    /// Serialized JSON snapshot of the records
    pub content: Arc<[u8]>,
    /// Number of records in the snapshot
    pub record_count: usize,
    /// When the job completed
    pub created_at: DateTime<Utc>,
}

impl ArchiveArtifact {
    /// Size of the serialized content in bytes
    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }

    /// Summary without the content bytes
    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            location: self.location.clone(),
            record_count: self.record_count,
            size_bytes: self.size_bytes(),
            created_at: self.created_at,
        }
    }
}

/// Artifact summary included in [`ArchiveStatus`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactInfo {
    /// Download name/path of the artifact
    #[schema(value_type = String)]
    pub location: PathBuf,
    /// Number of records archived
    pub record_count: usize,
    /// Size of the serialized content
    pub size_bytes: u64,
    /// Completion timestamp
    pub created_at: DateTime<Utc>,
}

/// Point-in-time view of the archive job, suitable for rendering
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArchiveStatus {
    /// Current phase
    pub phase: Phase,
    /// Fractional progress (0.0 to 1.0)
    pub progress: f64,
    /// When the current run started (None while idle)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Artifact summary (only when complete)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactInfo>,
}

impl ArchiveStatus {
    /// Progress as a percentage (0.0 to 100.0), as shown in a progress bar
    pub fn percent(&self) -> f64 {
        self.progress * 100.0
    }

    /// Whether the job has finished and its artifact can be downloaded
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }
}

/// Event emitted by the archiver
///
/// Consumers subscribe via [`crate::Archiver::subscribe`]. Triggers that do
/// not change state emit nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job moved from idle to running
    Started {
        /// Start timestamp
        started_at: DateTime<Utc>,
    },

    /// Progress recomputed while running
    Progress {
        /// Fractional progress (0.0 to 1.0)
        progress: f64,
    },

    /// Job completed and the artifact was materialized
    Completed {
        /// Download name/path of the artifact
        #[schema(value_type = String)]
        location: PathBuf,
        /// Number of records archived
        record_count: usize,
    },

    /// Job returned to idle (cancellation when it was still running)
    Reset {
        /// Phase the job was in before the reset
        from: Phase,
    },
}
