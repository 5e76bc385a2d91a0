//! Attachment Model (read-only, owned by the attachment collaborator)

use serde::{Deserialize, Serialize};

/// Review status of an uploaded order document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum AttachmentStatus {
    PendingReview,
    Approved,
    Rejected,
}

impl AttachmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingReview => "pending_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Per-order attachment counts by review status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentCounts {
    pub pending_review: i64,
    pub approved: i64,
    pub rejected: i64,
}
