//! Content item rows, which double as analysis queue entries.

use rivalwatch_core::analysis::{AnalysisKind, AnalysisResult};
use rivalwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{AnalysisStatus, StatusId};

/// A row from the `content_items` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentItem {
    pub id: DbId,
    pub link: Option<String>,
    pub body: Option<String>,
    pub media_urls: Vec<String>,
    pub analysis_kind: i16,
    pub status_id: Option<StatusId>,
    pub content_type: Option<String>,
    pub related_entities: Option<Vec<String>>,
    pub summary: Option<String>,
    pub error_message: Option<String>,
    pub claimed_at: Option<Timestamp>,
    pub analyzed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Where an item sits in the analysis lifecycle, derived from its columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    InProgress,
    Failed,
    /// No usable link; never claimable regardless of `status_id`.
    NoContent,
    /// Settled with a result.
    Analyzed,
    /// Settled without a result (never queued).
    Idle,
}

impl ContentItem {
    /// The link trimmed of whitespace, or `None` when it is absent or blank.
    pub fn usable_link(&self) -> Option<&str> {
        self.link.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Job kind, falling back to [`AnalysisKind::Summary`] for values the
    /// check constraint should already have rejected.
    pub fn kind(&self) -> AnalysisKind {
        AnalysisKind::from_id(self.analysis_kind).unwrap_or(AnalysisKind::Summary)
    }

    pub fn status(&self) -> Option<AnalysisStatus> {
        self.status_id.and_then(AnalysisStatus::from_id)
    }

    pub fn state(&self) -> JobState {
        if self.usable_link().is_none() {
            return JobState::NoContent;
        }
        match self.status() {
            Some(AnalysisStatus::Pending) => JobState::Pending,
            Some(AnalysisStatus::InProgress) => JobState::InProgress,
            Some(AnalysisStatus::Failed) => JobState::Failed,
            None if self.summary.is_some() => JobState::Analyzed,
            None => JobState::Idle,
        }
    }

    /// The stored result, present only once the item has been analyzed.
    pub fn result(&self) -> Option<AnalysisResult> {
        if self.status_id.is_some() {
            return None;
        }
        self.summary.as_ref().map(|summary| AnalysisResult {
            content_type: self.content_type.clone(),
            related_entities: self.related_entities.clone(),
            summary: summary.clone(),
        })
    }
}

/// DTO for queueing a new item. Used by ingestion and by tests.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContentItem {
    pub link: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub media_urls: Vec<String>,
    pub analysis_kind: AnalysisKind,
}

/// Per-state counts over the whole queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize)]
pub struct AnalysisStats {
    /// Pending items with a usable link.
    pub pending: i64,
    pub in_progress: i64,
    pub failed: i64,
    /// Items whose link is absent or blank, whatever their stored status.
    pub no_content: i64,
    pub analyzed: i64,
    pub total: i64,
}
