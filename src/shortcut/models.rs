//! Wire models for the tracker's v3 REST API (subset of fields we care about).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An epic as returned by search and by the epic detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub id: i64,
    pub name: String,
    /// Tracker-level epic state ("to do", "in progress", "done").
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub owner_ids: Vec<Uuid>,
    #[serde(default)]
    pub stats: Option<EpicStats>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// Rollup counters the tracker attaches to an epic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpicStats {
    #[serde(default)]
    pub num_stories_total: u32,
    #[serde(default)]
    pub num_stories_started: u32,
    #[serde(default)]
    pub num_stories_done: u32,
}

/// A story inside an epic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: i64,
    pub name: String,
    pub workflow_state_id: i64,
    #[serde(default)]
    pub owner_ids: Vec<Uuid>,
    /// Raw type string; classify with [`StoryType::from_str`]. Kept as a
    /// string so an unknown type never fails the whole story list.
    #[serde(default)]
    pub story_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

/// The three story types the dashboard displays. Anything else counts as
/// "other" and stays out of type percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoryType {
    Feature,
    Chore,
    Bug,
}

impl StoryType {
    /// Display order for breakdowns and charts.
    pub const DISPLAYED: [StoryType; 3] = [StoryType::Feature, StoryType::Chore, StoryType::Bug];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::Feature => "feature",
            StoryType::Chore => "chore",
            StoryType::Bug => "bug",
        }
    }
}

impl fmt::Display for StoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feature" => Ok(StoryType::Feature),
            "chore" => Ok(StoryType::Chore),
            "bug" => Ok(StoryType::Bug),
            other => Err(format!("Unknown story type: {}", other)),
        }
    }
}

/// A tracker member. Display names live under `profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    #[serde(default)]
    pub profile: MemberProfile,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub mention_name: Option<String>,
}

impl Member {
    /// Human-readable name, falling back to the mention handle. `None` when
    /// the profile carries neither.
    pub fn display_name(&self) -> Option<&str> {
        self.profile
            .name
            .as_deref()
            .or(self.profile.mention_name.as_deref())
    }
}

/// A workflow and its ordered states.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub states: Vec<WorkflowState>,
}

/// One state of a workflow. Also persisted verbatim into the config file,
/// so the board can label states without a network round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub id: i64,
    pub name: String,
}

/// Envelope around epic search results.
#[derive(Debug, Clone, Deserialize)]
pub struct EpicSearchResults {
    #[serde(default)]
    pub data: Vec<Epic>,
    #[serde(default)]
    pub next: Option<String>,
}
