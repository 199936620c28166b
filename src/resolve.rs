//! Epic resolution pipeline.
//!
//! Each configured name resolves independently: search, pick the exact
//! case-insensitive match, then fetch that epic's stories. All names fan
//! out at once and join at a single barrier, and the output list always
//! has one entry per input name, in input order. Failures degrade the one
//! name they hit; nothing here aborts a cycle.

use std::collections::HashMap;

use futures::future::join_all;
use uuid::Uuid;

use crate::errors::FetchError;
use crate::shortcut::client::EpicSource;
use crate::shortcut::models::{Epic, Story};

/// One configured name's outcome.
#[derive(Debug, Clone)]
pub enum EpicResolution {
    Found(ResolvedEpic),
    /// No exact case-insensitive match among the search results, or the
    /// search itself failed.
    NotFound { name: String },
}

/// A configured name matched to its remote epic.
#[derive(Debug, Clone)]
pub struct ResolvedEpic {
    pub epic: Epic,
    /// `None` when the story fetch failed; the card renders degraded.
    pub stories: Option<Vec<Story>>,
}

impl EpicResolution {
    /// The display name: the remote record's name when found, otherwise
    /// the configured name that missed.
    pub fn name(&self) -> &str {
        match self {
            EpicResolution::Found(resolved) => &resolved.epic.name,
            EpicResolution::NotFound { name } => name,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EpicResolution::NotFound { .. })
    }
}

/// Everything one search cycle produced.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOutcome {
    /// One entry per configured name, in configured order.
    pub epics: Vec<EpicResolution>,
    /// True when any request in the cycle failed authentication. Raised
    /// once per cycle so the UI prompts once, not once per request.
    pub auth_required: bool,
}

/// Resolve every configured name against the tracker.
pub async fn resolve_epics<S>(source: &S, names: &[String]) -> ResolutionOutcome
where
    S: EpicSource + Sync,
{
    let tasks = names.iter().map(|name| resolve_one(source, name));
    let results = join_all(tasks).await;

    let mut epics = Vec::with_capacity(results.len());
    let mut auth_required = false;
    for (resolution, auth) in results {
        auth_required |= auth;
        epics.push(resolution);
    }
    ResolutionOutcome {
        epics,
        auth_required,
    }
}

/// Resolve a single name. The story fetch strictly follows a successful
/// name match. Returns the resolution plus whether an auth failure was hit.
async fn resolve_one<S>(source: &S, name: &str) -> (EpicResolution, bool)
where
    S: EpicSource + Sync,
{
    let candidates = match source.search_epics(name).await {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::warn!(epic = name, error = %err, "epic search failed");
            return (
                EpicResolution::NotFound {
                    name: name.to_string(),
                },
                err.is_auth(),
            );
        }
    };

    let wanted = name.to_lowercase();
    let Some(epic) = candidates
        .into_iter()
        .find(|candidate| candidate.name.to_lowercase() == wanted)
    else {
        return (
            EpicResolution::NotFound {
                name: name.to_string(),
            },
            false,
        );
    };

    match source.epic_stories(epic.id).await {
        Ok(stories) => (
            EpicResolution::Found(ResolvedEpic {
                epic,
                stories: Some(stories),
            }),
            false,
        ),
        Err(err) => {
            tracing::warn!(epic = name, error = %err, "story fetch failed, rendering without stories");
            let auth = err.is_auth();
            (
                EpicResolution::Found(ResolvedEpic {
                    epic,
                    stories: None,
                }),
                auth,
            )
        }
    }
}

/// Owner id → display name cache. Lives for the whole session; entries are
/// added as new ids appear and never invalidated, so a mid-session rename
/// shows the old name until restart.
#[derive(Debug, Clone, Default)]
pub struct MemberDirectory {
    names: HashMap<Uuid, String>,
}

impl MemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached display name, or the raw id when the member was never
    /// resolved.
    pub fn display_name(&self, id: &Uuid) -> String {
        self.names
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.names.contains_key(id)
    }

    pub fn insert(&mut self, id: Uuid, name: String) {
        self.names.insert(id, name);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Fetch display names for every owner id in `epics` the directory has not
/// seen yet, one concurrent lookup per id. Lookup failures leave the id
/// unresolved (rendered raw); returns whether any failure was auth-flavored.
pub async fn prefetch_members<S>(
    source: &S,
    epics: &[EpicResolution],
    directory: &mut MemberDirectory,
) -> bool
where
    S: EpicSource + Sync,
{
    let mut missing: Vec<Uuid> = Vec::new();
    for resolution in epics {
        let EpicResolution::Found(resolved) = resolution else {
            continue;
        };
        let story_owners = resolved
            .stories
            .iter()
            .flatten()
            .flat_map(|story| story.owner_ids.iter());
        for owner in resolved.epic.owner_ids.iter().chain(story_owners) {
            if !directory.contains(owner) && !missing.contains(owner) {
                missing.push(*owner);
            }
        }
    }

    let lookups = missing.iter().map(|id| {
        let id = *id;
        async move { (id, source.member(id).await) }
    });
    let results = join_all(lookups).await;

    let mut auth_required = false;
    for (id, result) in results {
        match result {
            Ok(member) => {
                if let Some(name) = member.display_name() {
                    directory.insert(id, name.to_string());
                }
            }
            Err(err) => {
                tracing::debug!(member = %id, error = %err, "member lookup failed, showing raw id");
                auth_required |= err.is_auth();
            }
        }
    }
    auth_required
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::shortcut::models::{Member, MemberProfile, Workflow, WorkflowState};
    use crate::workflow::StateIndex;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory tracker with scriptable failures.
    #[derive(Default)]
    struct FakeTracker {
        search_results: HashMap<String, Vec<Epic>>,
        stories: HashMap<i64, Vec<Story>>,
        members: HashMap<Uuid, Member>,
        /// query → fail with auth (true) or generic (false)
        search_failures: HashMap<String, bool>,
        /// epic id → fail with auth (true) or generic (false)
        story_failures: HashMap<i64, bool>,
        member_failures: HashSet<Uuid>,
        member_calls: AtomicUsize,
    }

    impl FakeTracker {
        fn with_epic(mut self, query: &str, epic: Epic) -> Self {
            self.search_results
                .entry(query.to_string())
                .or_default()
                .push(epic);
            self
        }

        fn with_stories(mut self, epic_id: i64, stories: Vec<Story>) -> Self {
            self.stories.insert(epic_id, stories);
            self
        }

        fn with_member(mut self, id: Uuid, name: &str) -> Self {
            self.members.insert(
                id,
                Member {
                    id,
                    profile: MemberProfile {
                        name: Some(name.to_string()),
                        mention_name: None,
                    },
                },
            );
            self
        }

        fn failing_search(mut self, query: &str, auth: bool) -> Self {
            self.search_failures.insert(query.to_string(), auth);
            self
        }

        fn failing_stories(mut self, epic_id: i64, auth: bool) -> Self {
            self.story_failures.insert(epic_id, auth);
            self
        }

        fn failing_member(mut self, id: Uuid) -> Self {
            self.member_failures.insert(id);
            self
        }
    }

    fn auth_err() -> FetchError {
        FetchError::Auth {
            status: 401,
            message: "invalid token".to_string(),
        }
    }

    fn api_err() -> FetchError {
        FetchError::Api {
            status: 500,
            message: "boom".to_string(),
        }
    }

    #[async_trait]
    impl EpicSource for FakeTracker {
        async fn search_epics(&self, query: &str) -> Result<Vec<Epic>, FetchError> {
            if let Some(auth) = self.search_failures.get(query) {
                return Err(if *auth { auth_err() } else { api_err() });
            }
            Ok(self.search_results.get(query).cloned().unwrap_or_default())
        }

        async fn epic(&self, id: i64) -> Result<Epic, FetchError> {
            self.search_results
                .values()
                .flatten()
                .find(|e| e.id == id)
                .cloned()
                .ok_or(FetchError::Api {
                    status: 404,
                    message: "epic not found".to_string(),
                })
        }

        async fn epic_stories(&self, epic_id: i64) -> Result<Vec<Story>, FetchError> {
            if let Some(auth) = self.story_failures.get(&epic_id) {
                return Err(if *auth { auth_err() } else { api_err() });
            }
            Ok(self.stories.get(&epic_id).cloned().unwrap_or_default())
        }

        async fn member(&self, id: Uuid) -> Result<Member, FetchError> {
            self.member_calls.fetch_add(1, Ordering::SeqCst);
            if self.member_failures.contains(&id) {
                return Err(auth_err());
            }
            self.members.get(&id).cloned().ok_or(FetchError::Api {
                status: 404,
                message: "member not found".to_string(),
            })
        }

        async fn workflows(&self) -> Result<Vec<Workflow>, FetchError> {
            Ok(Vec::new())
        }
    }

    fn remote_epic(id: i64, name: &str) -> Epic {
        Epic {
            id,
            name: name.to_string(),
            state: Some("in progress".to_string()),
            owner_ids: Vec::new(),
            stats: None,
            description: None,
            archived: false,
        }
    }

    fn remote_story(id: i64, state_id: i64, story_type: &str, owners: &[Uuid]) -> Story {
        Story {
            id,
            name: format!("story-{id}"),
            workflow_state_id: state_id,
            owner_ids: owners.to_vec(),
            story_type: story_type.to_string(),
            description: None,
            archived: false,
        }
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    // ── resolve_epics ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_output_preserves_configured_order_and_length() {
        let tracker = FakeTracker::default()
            .with_epic("Beta", remote_epic(2, "Beta"))
            .with_epic("Alpha", remote_epic(1, "Alpha"));
        let outcome = resolve_epics(&tracker, &names(&["Alpha", "Missing", "Beta"])).await;
        let got: Vec<&str> = outcome.epics.iter().map(|e| e.name()).collect();
        assert_eq!(got, vec!["Alpha", "Missing", "Beta"]);
        assert!(!outcome.auth_required);
    }

    #[tokio::test]
    async fn test_match_is_case_insensitive_but_exact() {
        let tracker = FakeTracker::default()
            .with_epic("checkout redesign", remote_epic(10, "Checkout Redesign V2"))
            .with_epic("checkout redesign", remote_epic(11, "Checkout Redesign"));
        let outcome = resolve_epics(&tracker, &names(&["checkout redesign"])).await;
        match &outcome.epics[0] {
            EpicResolution::Found(resolved) => {
                // The substring candidate is skipped; only the exact
                // (case-insensitive) name matches.
                assert_eq!(resolved.epic.id, 11);
            }
            _ => panic!("Expected a match"),
        }
    }

    #[tokio::test]
    async fn test_no_exact_match_yields_not_found_without_stories() {
        let tracker =
            FakeTracker::default().with_epic("Checkout", remote_epic(10, "Checkout Redesign"));
        let outcome = resolve_epics(&tracker, &names(&["Checkout"])).await;
        assert!(outcome.epics[0].is_not_found());
        assert_eq!(outcome.epics[0].name(), "Checkout");
    }

    #[tokio::test]
    async fn test_search_failure_degrades_one_name_only() {
        let tracker = FakeTracker::default()
            .with_epic("Alpha", remote_epic(1, "Alpha"))
            .failing_search("Broken", false);
        let outcome = resolve_epics(&tracker, &names(&["Broken", "Alpha"])).await;
        assert!(outcome.epics[0].is_not_found());
        assert!(!outcome.epics[1].is_not_found());
        assert!(!outcome.auth_required);
    }

    #[tokio::test]
    async fn test_auth_failure_on_search_raises_cycle_flag() {
        let tracker = FakeTracker::default()
            .with_epic("Alpha", remote_epic(1, "Alpha"))
            .failing_search("Secret", true);
        let outcome = resolve_epics(&tracker, &names(&["Secret", "Alpha"])).await;
        assert!(outcome.auth_required);
        // The other name still resolved.
        assert!(!outcome.epics[1].is_not_found());
    }

    #[tokio::test]
    async fn test_story_fetch_failure_keeps_epic_without_stories() {
        let tracker = FakeTracker::default()
            .with_epic("Alpha", remote_epic(1, "Alpha"))
            .failing_stories(1, false);
        let outcome = resolve_epics(&tracker, &names(&["Alpha"])).await;
        match &outcome.epics[0] {
            EpicResolution::Found(resolved) => {
                assert!(resolved.stories.is_none());
            }
            _ => panic!("Expected a degraded match, not not-found"),
        }
        assert!(!outcome.auth_required);
    }

    #[tokio::test]
    async fn test_auth_failure_on_stories_raises_cycle_flag() {
        let tracker = FakeTracker::default()
            .with_epic("Alpha", remote_epic(1, "Alpha"))
            .failing_stories(1, true);
        let outcome = resolve_epics(&tracker, &names(&["Alpha"])).await;
        assert!(outcome.auth_required);
    }

    #[tokio::test]
    async fn test_empty_name_list_resolves_to_empty_outcome() {
        let tracker = FakeTracker::default();
        let outcome = resolve_epics(&tracker, &[]).await;
        assert!(outcome.epics.is_empty());
        assert!(!outcome.auth_required);
    }

    // ── MemberDirectory / prefetch_members ───────────────────────────

    #[test]
    fn test_directory_falls_back_to_raw_id() {
        let directory = MemberDirectory::new();
        let id = Uuid::new_v4();
        assert_eq!(directory.display_name(&id), id.to_string());
    }

    #[tokio::test]
    async fn test_prefetch_resolves_story_and_epic_owners_once() {
        let ana = Uuid::new_v4();
        let ben = Uuid::new_v4();
        let mut epic = remote_epic(1, "Alpha");
        epic.owner_ids.push(ben);
        let tracker = FakeTracker::default()
            .with_member(ana, "Ana Lee")
            .with_member(ben, "Ben Tran");
        let epics = vec![EpicResolution::Found(ResolvedEpic {
            epic,
            stories: Some(vec![
                remote_story(1, 1, "feature", &[ana]),
                remote_story(2, 1, "feature", &[ana, ben]),
            ]),
        })];
        let mut directory = MemberDirectory::new();
        let auth = prefetch_members(&tracker, &epics, &mut directory).await;
        assert!(!auth);
        assert_eq!(directory.display_name(&ana), "Ana Lee");
        assert_eq!(directory.display_name(&ben), "Ben Tran");
        // Each distinct id was fetched exactly once.
        assert_eq!(tracker.member_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_prefetch_skips_already_cached_ids() {
        let ana = Uuid::new_v4();
        let tracker = FakeTracker::default().with_member(ana, "Ana Lee");
        let epics = vec![EpicResolution::Found(ResolvedEpic {
            epic: remote_epic(1, "Alpha"),
            stories: Some(vec![remote_story(1, 1, "feature", &[ana])]),
        })];
        let mut directory = MemberDirectory::new();
        directory.insert(ana, "Ana Lee".to_string());
        prefetch_members(&tracker, &epics, &mut directory).await;
        assert_eq!(tracker.member_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_prefetch_failure_leaves_raw_id_and_flags_auth() {
        let ghost = Uuid::new_v4();
        let tracker = FakeTracker::default().failing_member(ghost);
        let epics = vec![EpicResolution::Found(ResolvedEpic {
            epic: remote_epic(1, "Alpha"),
            stories: Some(vec![remote_story(1, 1, "feature", &[ghost])]),
        })];
        let mut directory = MemberDirectory::new();
        let auth = prefetch_members(&tracker, &epics, &mut directory).await;
        assert!(auth);
        assert_eq!(directory.display_name(&ghost), ghost.to_string());
    }

    // ── End-to-end cycle ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_checkout_redesign_cycle() {
        // One tracked epic, three stories: two in development (one Ana's),
        // one complete and also Ana's. The complete story must not count
        // toward her open tickets.
        let ana = Uuid::new_v4();
        let states = vec![
            WorkflowState {
                id: 500,
                name: "In Development".to_string(),
            },
            WorkflowState {
                id: 501,
                name: "Complete".to_string(),
            },
        ];
        let index = StateIndex::build(&states);
        let tracker = FakeTracker::default()
            .with_epic("Checkout Redesign", remote_epic(77, "Checkout Redesign"))
            .with_stories(
                77,
                vec![
                    remote_story(1, 500, "feature", &[ana]),
                    remote_story(2, 500, "feature", &[]),
                    remote_story(3, 501, "chore", &[ana]),
                ],
            )
            .with_member(ana, "Ana Lee");

        let outcome = resolve_epics(&tracker, &names(&["Checkout Redesign"])).await;
        assert_eq!(outcome.epics.len(), 1);
        assert!(!outcome.auth_required);
        let EpicResolution::Found(resolved) = &outcome.epics[0] else {
            panic!("Expected the epic to resolve");
        };
        let stories = resolved.stories.as_ref().unwrap();

        let mut directory = MemberDirectory::new();
        prefetch_members(&tracker, &outcome.epics, &mut directory).await;

        let by_state = aggregate::count_by_state(stories);
        assert_eq!(by_state[&500], 2);
        assert_eq!(by_state[&501], 1);

        let roster = vec!["Ana".to_string()];
        let open = aggregate::count_open_by_roster(stories, &roster, &directory, &index);
        assert_eq!(open, vec![("Ana".to_string(), 1)]);
    }
}
