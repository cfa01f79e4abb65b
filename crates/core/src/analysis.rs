//! Typed outputs of an AI analysis pass.

use serde::{Deserialize, Serialize};

/// Delimiter the model is told to place on both sides of its JSON payload.
pub const SENTINEL: &str = "@@@";

/// Raw completion a model returns when it refuses to review the content.
/// Treated exactly like an unparseable sensitivity response.
pub const UNSAFE_SHORTCUT: &str = "ext";

/// What a job asks the model to produce.
///
/// Discriminants match the `analysis_kind` SMALLINT column.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// A single-sentence `summary`.
    Summary = 1,
    /// `content_type`, `related_entities` and `summary`.
    Classification = 2,
}

impl AnalysisKind {
    /// Return the database column value.
    pub fn id(self) -> i16 {
        self as i16
    }

    /// Map a column value back to a kind. Unknown values yield `None`.
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(Self::Summary),
            2 => Some(Self::Classification),
            _ => None,
        }
    }
}

/// Successful analysis of one content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Content category. Only set for [`AnalysisKind::Classification`].
    pub content_type: Option<String>,
    /// Brands, products or accounts the content refers to. Only set for
    /// [`AnalysisKind::Classification`]; may be empty.
    pub related_entities: Option<Vec<String>>,
    /// One-sentence summary. Never blank.
    pub summary: String,
}

/// Outcome of a sensitivity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityVerdict {
    pub safe: bool,
    pub description: String,
}

impl SensitivityVerdict {
    /// The conservative outcome used whenever the model's answer cannot be
    /// trusted.
    pub fn unsafe_default() -> Self {
        Self {
            safe: false,
            description: String::new(),
        }
    }
}
