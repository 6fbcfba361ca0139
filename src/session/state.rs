use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    InProgress,
    Success,
    Failed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Success => "success",
            SessionStatus::Failed => "failed",
            SessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "in_progress" => Ok(SessionStatus::InProgress),
            "success" => Ok(SessionStatus::Success),
            "failed" => Ok(SessionStatus::Failed),
            "cancelled" => Ok(SessionStatus::Cancelled),
            other => Err(format!("unknown session status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    pub description: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub status: HypothesisStatus,
    pub cycle: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CapturedLog {
    pub source: String,
    pub content: String,
    pub captured_at: DateTime<Utc>,
    pub cycle: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResearchFinding {
    pub topic: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFix {
    pub description: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    pub applied_at: DateTime<Utc>,
    pub cycle: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentedFile {
    pub path: PathBuf,
    /// Lines where logging was inserted.
    #[serde(default)]
    pub lines: Vec<usize>,
    #[serde(default)]
    pub reverted: bool,
}

/// Persisted record of one debugging investigation.
///
/// The identifier is fixed at creation; it has no setter and deserializing
/// a file is the only other way to obtain one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    session_id: String,
    pub issue: String,
    pub issue_hash: String,
    pub started_at: DateTime<Utc>,
    pub initial_commit: Option<String>,
    pub initial_branch: Option<String>,
    pub reproduction: Option<String>,
    #[serde(default)]
    pub hypotheses: Vec<Hypothesis>,
    #[serde(default)]
    pub logs: Vec<CapturedLog>,
    #[serde(default)]
    pub research: Vec<ResearchFinding>,
    #[serde(default)]
    pub fixes: Vec<AppliedFix>,
    #[serde(default)]
    pub instrumented_files: Vec<InstrumentedFile>,
    pub cycle: u32,
    pub status: SessionStatus,
    pub last_updated: DateTime<Utc>,
}

impl SessionState {
    pub(crate) fn new(session_id: String, issue: String, issue_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            session_id,
            issue,
            issue_hash,
            started_at: now,
            initial_commit: None,
            initial_branch: None,
            reproduction: None,
            hypotheses: Vec::new(),
            logs: Vec::new(),
            research: Vec::new(),
            fixes: Vec::new(),
            instrumented_files: Vec::new(),
            cycle: 1,
            status: SessionStatus::InProgress,
            last_updated: now,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
