//! Tracker client trait and wire types.

use serde::{Deserialize, Serialize};

/// Open/closed state of a tracker ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

/// Minimal view of a tracker ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: u64,
    pub title: String,
    pub state: IssueState,
}

/// Tracker API failures. Logged by the sync layer, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tracker API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// The tracker interface the sync layer consumes.
#[async_trait::async_trait]
pub trait IssueTracker: Send + Sync {
    /// Find an existing issue whose title matches exactly, searching
    /// issues in any state carrying the sync label.
    async fn find_issue_by_title(&self, title: &str) -> Result<Option<IssueRef>, TrackerError>;

    async fn create_issue(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<IssueRef, TrackerError>;

    async fn update_issue(
        &self,
        id: u64,
        body: &str,
        state: IssueState,
    ) -> Result<(), TrackerError>;
}
