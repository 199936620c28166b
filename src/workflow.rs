//! Workflow state index: id ↔ label lookups for the selected workflow.
//!
//! The board buckets stories into six canonical pipeline states. A
//! workspace workflow may define more states than that; the extras stay in
//! the index (so every story can still be labeled) but never become board
//! buckets or chart segments.

use std::collections::HashMap;

use crate::shortcut::models::WorkflowState;

/// The six pipeline states the board recognizes, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalState {
    Backlog,
    ReadyForDevelopment,
    InDevelopment,
    InReview,
    ReadyForRelease,
    Complete,
}

impl CanonicalState {
    /// Bucket order for boards and charts, Backlog first.
    pub const ORDERED: [CanonicalState; 6] = [
        CanonicalState::Backlog,
        CanonicalState::ReadyForDevelopment,
        CanonicalState::InDevelopment,
        CanonicalState::InReview,
        CanonicalState::ReadyForRelease,
        CanonicalState::Complete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalState::Backlog => "Backlog",
            CanonicalState::ReadyForDevelopment => "Ready for Development",
            CanonicalState::InDevelopment => "In Development",
            CanonicalState::InReview => "In Review",
            CanonicalState::ReadyForRelease => "Ready for Release",
            CanonicalState::Complete => "Complete",
        }
    }

    /// Match a workflow state label, ignoring case and surrounding
    /// whitespace. `None` for labels outside the canonical six.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "backlog" => Some(CanonicalState::Backlog),
            "ready for development" => Some(CanonicalState::ReadyForDevelopment),
            "in development" => Some(CanonicalState::InDevelopment),
            "in review" => Some(CanonicalState::InReview),
            "ready for release" => Some(CanonicalState::ReadyForRelease),
            "complete" => Some(CanonicalState::Complete),
            _ => None,
        }
    }
}

/// Bidirectional state lookup built from one workflow's state list.
///
/// Rebuilt whenever a workflow is loaded; building from the same input is
/// idempotent and a rebuild fully replaces any previous index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateIndex {
    id_to_name: HashMap<i64, String>,
    /// Keys are normalized (trimmed, lowercased) labels.
    name_to_id: HashMap<String, i64>,
    /// State ids in workflow definition order, duplicates dropped.
    state_order: Vec<i64>,
}

impl StateIndex {
    pub fn build(states: &[WorkflowState]) -> Self {
        let mut index = Self::default();
        for state in states {
            // First definition of an id wins.
            if index.id_to_name.contains_key(&state.id) {
                continue;
            }
            index.state_order.push(state.id);
            index.name_to_id.insert(normalize(&state.name), state.id);
            index.id_to_name.insert(state.id, state.name.clone());
        }
        index
    }

    /// Label for a state id, as the workflow defined it.
    pub fn state_name(&self, id: i64) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// State id for a label, matched case-insensitively.
    pub fn state_id(&self, name: &str) -> Option<i64> {
        self.name_to_id.get(&normalize(name)).copied()
    }

    /// All state ids in workflow definition order.
    pub fn state_order(&self) -> &[i64] {
        &self.state_order
    }

    /// Canonical bucket for a state id, if its label is one of the six.
    pub fn canonical(&self, id: i64) -> Option<CanonicalState> {
        self.state_name(id).and_then(CanonicalState::parse)
    }

    /// The recognized buckets present in this workflow, in pipeline order.
    pub fn buckets(&self) -> Vec<(CanonicalState, i64)> {
        CanonicalState::ORDERED
            .iter()
            .filter_map(|canonical| {
                self.state_id(canonical.as_str())
                    .map(|id| (*canonical, id))
            })
            .collect()
    }

    /// Whether a state id maps to the Complete bucket. Stories anywhere
    /// else, including unrecognized states, count as open.
    pub fn is_complete(&self, id: i64) -> bool {
        self.canonical(id) == Some(CanonicalState::Complete)
    }

    pub fn len(&self) -> usize {
        self.state_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state_order.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
