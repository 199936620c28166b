//! Client-side aggregation over one epic's stories.
//!
//! Everything here is pure: stories in, counts out. The terminal board and
//! the SVG export both render from these results, so ordering rules live
//! here and nowhere else.

use std::collections::HashMap;

use crate::resolve::MemberDirectory;
use crate::shortcut::models::{Story, StoryType};
use crate::workflow::StateIndex;

/// One aggregated value, ready for charting.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub key: String,
    pub count: usize,
    pub percentage: f64,
}

/// `count` as a percentage of `total`. Zero when `total` is zero, never NaN.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Stories per workflow state id. Every story lands in exactly one entry,
/// unrecognized states included, so the values sum to `stories.len()`.
pub fn count_by_state(stories: &[Story]) -> HashMap<i64, usize> {
    let mut counts = HashMap::new();
    for story in stories {
        *counts.entry(story.workflow_state_id).or_insert(0) += 1;
    }
    counts
}

/// Chart segments for the recognized state buckets, in pipeline order.
/// Percentages are over the full story count, so stories sitting in
/// unrecognized states dilute every bucket rather than vanishing.
pub fn state_segments(stories: &[Story], index: &StateIndex) -> Vec<Segment> {
    let counts = count_by_state(stories);
    let total = stories.len();
    index
        .buckets()
        .into_iter()
        .map(|(canonical, id)| {
            let count = counts.get(&id).copied().unwrap_or(0);
            Segment {
                key: canonical.as_str().to_string(),
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

/// Story counts by type. Only feature, chore, and bug are displayed;
/// anything else tallies under `other` and stays out of the percentage
/// denominator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeBreakdown {
    pub feature: usize,
    pub chore: usize,
    pub bug: usize,
    pub other: usize,
}

impl TypeBreakdown {
    /// The denominator for type percentages: displayed types only.
    pub fn displayed_total(&self) -> usize {
        self.feature + self.chore + self.bug
    }

    /// Segments in fixed feature, chore, bug order. They sum to 100% even
    /// when `other` stories exist, and to 0% when nothing is displayed.
    pub fn segments(&self) -> Vec<Segment> {
        let total = self.displayed_total();
        StoryType::DISPLAYED
            .iter()
            .map(|ty| {
                let count = match ty {
                    StoryType::Feature => self.feature,
                    StoryType::Chore => self.chore,
                    StoryType::Bug => self.bug,
                };
                Segment {
                    key: ty.as_str().to_string(),
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect()
    }
}

pub fn count_by_type(stories: &[Story]) -> TypeBreakdown {
    let mut breakdown = TypeBreakdown::default();
    for story in stories {
        match story.story_type.parse::<StoryType>() {
            Ok(StoryType::Feature) => breakdown.feature += 1,
            Ok(StoryType::Chore) => breakdown.chore += 1,
            Ok(StoryType::Bug) => breakdown.bug += 1,
            Err(_) => breakdown.other += 1,
        }
    }
    breakdown
}

/// Story counts per owner display name, plus the unassigned count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OwnerCounts {
    /// Sorted by count descending; ties keep first-encountered order.
    pub owners: Vec<(String, usize)>,
    pub unassigned: usize,
}

/// Count stories per owner. A story with several owners credits each of
/// them; a story with none increments `unassigned` instead.
pub fn count_by_owner(stories: &[Story], directory: &MemberDirectory) -> OwnerCounts {
    let mut owners: Vec<(String, usize)> = Vec::new();
    let mut unassigned = 0;
    for story in stories {
        if story.owner_ids.is_empty() {
            unassigned += 1;
            continue;
        }
        for owner_id in &story.owner_ids {
            let name = directory.display_name(owner_id);
            match owners.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, count)) => *count += 1,
                None => owners.push((name, 1)),
            }
        }
    }
    // sort_by is stable, so equal counts keep encounter order.
    owners.sort_by(|a, b| b.1.cmp(&a.1));
    OwnerCounts { owners, unassigned }
}

/// Open stories (anything not in the Complete bucket) per configured team
/// member. Every roster name appears in the result, zero-initialized.
///
/// An owner matches a roster name when either string contains the other,
/// case-insensitively, so "Dana" credits "Dana Osei" and the other way
/// around. A roster name overlapping several owners is credited once per
/// match; the over-count is accepted behavior, not deduplicated.
pub fn count_open_by_roster(
    stories: &[Story],
    roster: &[String],
    directory: &MemberDirectory,
    index: &StateIndex,
) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = roster.iter().map(|name| (name.clone(), 0)).collect();
    for story in stories {
        if index.is_complete(story.workflow_state_id) {
            continue;
        }
        for owner_id in &story.owner_ids {
            let owner = directory.display_name(owner_id);
            for (name, count) in counts.iter_mut() {
                if names_overlap(&owner, name) {
                    *count += 1;
                }
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Case-insensitive bidirectional substring match.
fn names_overlap(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}
