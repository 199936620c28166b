//! Per-cycle view state.
//!
//! All presentation flags for one search cycle live in a single
//! serializable value, mutated only through [`BoardView::apply`]. A new
//! cycle replaces the previous view wholesale; there is no merging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    #[default]
    Idle,
    Loading,
    Ready,
}

/// Events emitted while a search cycle runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CycleEvent {
    Started { epics_total: usize },
    EpicResolved { name: String, found: bool },
    AuthRequired,
    Finished { at: DateTime<Utc> },
}

/// View-model for the board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardView {
    pub phase: CyclePhase,
    pub epics_total: usize,
    pub epics_resolved: usize,
    pub epics_missing: usize,
    /// Raised at most once per cycle, however many requests failed auth.
    pub auth_required: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

impl BoardView {
    /// Apply one event. `Started` resets the whole view for the new cycle;
    /// everything else accumulates into the current one.
    pub fn apply(&mut self, event: CycleEvent) {
        match event {
            CycleEvent::Started { epics_total } => {
                *self = BoardView {
                    phase: CyclePhase::Loading,
                    epics_total,
                    ..BoardView::default()
                };
            }
            CycleEvent::EpicResolved { found, .. } => {
                if found {
                    self.epics_resolved += 1;
                } else {
                    self.epics_missing += 1;
                }
            }
            CycleEvent::AuthRequired => self.auth_required = true,
            CycleEvent::Finished { at } => {
                self.phase = CyclePhase::Ready;
                self.last_updated = Some(at);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_cycle(view: &mut BoardView, events: Vec<CycleEvent>) {
        for event in events {
            view.apply(event);
        }
    }

    #[test]
    fn test_fresh_view_is_idle() {
        let view = BoardView::default();
        assert_eq!(view.phase, CyclePhase::Idle);
        assert!(!view.auth_required);
        assert!(view.last_updated.is_none());
    }

    #[test]
    fn test_full_cycle_counts_resolved_and_missing() {
        let mut view = BoardView::default();
        run_cycle(
            &mut view,
            vec![
                CycleEvent::Started { epics_total: 3 },
                CycleEvent::EpicResolved {
                    name: "Checkout Redesign".to_string(),
                    found: true,
                },
                CycleEvent::EpicResolved {
                    name: "Ghost Epic".to_string(),
                    found: false,
                },
                CycleEvent::EpicResolved {
                    name: "Search Revamp".to_string(),
                    found: true,
                },
                CycleEvent::Finished { at: Utc::now() },
            ],
        );
        assert_eq!(view.phase, CyclePhase::Ready);
        assert_eq!(view.epics_total, 3);
        assert_eq!(view.epics_resolved, 2);
        assert_eq!(view.epics_missing, 1);
        assert!(view.last_updated.is_some());
    }

    #[test]
    fn test_started_resets_previous_cycle() {
        let mut view = BoardView::default();
        run_cycle(
            &mut view,
            vec![
                CycleEvent::Started { epics_total: 1 },
                CycleEvent::AuthRequired,
                CycleEvent::EpicResolved {
                    name: "A".to_string(),
                    found: false,
                },
                CycleEvent::Finished { at: Utc::now() },
            ],
        );
        assert!(view.auth_required);

        view.apply(CycleEvent::Started { epics_total: 2 });
        assert_eq!(view.phase, CyclePhase::Loading);
        assert_eq!(view.epics_total, 2);
        assert_eq!(view.epics_resolved, 0);
        assert_eq!(view.epics_missing, 0);
        // The auth banner from the previous cycle does not leak forward.
        assert!(!view.auth_required);
        assert!(view.last_updated.is_none());
    }

    #[test]
    fn test_auth_required_is_sticky_within_a_cycle() {
        let mut view = BoardView::default();
        view.apply(CycleEvent::Started { epics_total: 2 });
        view.apply(CycleEvent::AuthRequired);
        view.apply(CycleEvent::AuthRequired);
        view.apply(CycleEvent::Finished { at: Utc::now() });
        assert!(view.auth_required);
        assert_eq!(view.phase, CyclePhase::Ready);
    }

    #[test]
    fn test_view_serializes_for_snapshotting() {
        let mut view = BoardView::default();
        view.apply(CycleEvent::Started { epics_total: 1 });
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"loading\""));
        let restored: BoardView = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, view);
    }

    #[test]
    fn test_events_serialize_tagged() {
        let event = CycleEvent::EpicResolved {
            name: "Checkout Redesign".to_string(),
            found: true,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"epic_resolved\""));
        assert!(json.contains("\"found\":true"));
    }
}
