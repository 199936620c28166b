//! Terminal rendering of the board: one card per tracked epic, with state
//! gauges and the aggregated summary lines.

use console::style;

use crate::aggregate;
use crate::board_config::TrackedEpic;
use crate::resolve::{EpicResolution, MemberDirectory};
use crate::shortcut::models::{Epic, Story};
use crate::ui::icons;
use crate::view::BoardView;
use crate::workflow::StateIndex;

const GAUGE_WIDTH: usize = 12;

/// How many owners a card lists before truncating.
const OWNER_LIMIT: usize = 6;

pub fn render_board(
    view: &BoardView,
    tracked: &[TrackedEpic],
    resolutions: &[EpicResolution],
    index: &StateIndex,
    directory: &MemberDirectory,
    workflow_name: &str,
) {
    println!();
    println!(
        "{}{} · workflow {}",
        icons::CHART,
        style("Epic Board").bold(),
        style(workflow_name).cyan()
    );
    if let Some(at) = view.last_updated {
        println!(
            "{}updated {} · {} resolved · {} missing",
            icons::CLOCK,
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            view.epics_resolved,
            view.epics_missing
        );
    }
    if view.auth_required {
        println!(
            "{}{}",
            icons::WARN,
            style("The tracker rejected the API token. Run `epicboard config set-token <token>`.")
                .yellow()
        );
    }

    for (epic_cfg, resolution) in tracked.iter().zip(resolutions) {
        render_card(epic_cfg, resolution, index, directory);
    }
    println!();
}

fn render_card(
    epic_cfg: &TrackedEpic,
    resolution: &EpicResolution,
    index: &StateIndex,
    directory: &MemberDirectory,
) {
    println!();
    let resolved = match resolution {
        EpicResolution::NotFound { name } => {
            println!(
                "{}{} {}",
                icons::MISSING,
                style(name).bold(),
                style("no matching epic found").red()
            );
            return;
        }
        EpicResolution::Found(resolved) => resolved,
    };

    let epic = &resolved.epic;
    let epic_state = epic.state.as_deref().unwrap_or("unknown");

    let Some(stories) = &resolved.stories else {
        println!(
            "{}{}  [{}]",
            icons::FOUND,
            style(&epic.name).bold(),
            epic_state
        );
        println!("   {}", style("stories unavailable (fetch failed)").dim());
        return;
    };

    println!(
        "{}{}  [{} · {} stories]",
        icons::FOUND,
        style(&epic.name).bold(),
        epic_state,
        stories.len()
    );

    for segment in aggregate::state_segments(stories, index) {
        println!(
            "   {:<22} {} {:>3}  ({:.0}%)",
            segment.key,
            gauge(segment.percentage, GAUGE_WIDTH),
            segment.count,
            segment.percentage
        );
    }

    let breakdown = aggregate::count_by_type(stories);
    let mut type_line = breakdown
        .segments()
        .iter()
        .map(|s| format!("{} {} ({:.0}%)", s.key, s.count, s.percentage))
        .collect::<Vec<_>>()
        .join(" · ");
    if breakdown.other > 0 {
        type_line.push_str(&format!(" (+{} other)", breakdown.other));
    }
    println!("   Types:  {type_line}");

    let owners = aggregate::count_by_owner(stories, directory);
    let mut owner_parts: Vec<String> = owners
        .owners
        .iter()
        .take(OWNER_LIMIT)
        .map(|(name, count)| format!("{name} {count}"))
        .collect();
    if owners.owners.len() > OWNER_LIMIT {
        owner_parts.push(format!("+{} more", owners.owners.len() - OWNER_LIMIT));
    }
    if owners.unassigned > 0 {
        owner_parts.push(format!("unassigned {}", owners.unassigned));
    }
    if !owner_parts.is_empty() {
        println!("   Owners: {}", owner_parts.join(" · "));
    }

    if !epic_cfg.team.is_empty() {
        let open = aggregate::count_open_by_roster(stories, &epic_cfg.team, directory, index);
        let roster_line = open
            .iter()
            .map(|(name, count)| format!("{name} {count}"))
            .collect::<Vec<_>>()
            .join(" · ");
        println!("   Open by team: {roster_line}");
    }
}

/// Detail card for a single epic, with its full story list.
pub fn render_detail(
    epic: &Epic,
    stories: Option<&[Story]>,
    index: &StateIndex,
    directory: &MemberDirectory,
) {
    println!();
    println!("{}{}", icons::FOUND, style(&epic.name).bold());
    if let Some(state) = &epic.state {
        println!("   State:   {state}");
    }
    if !epic.owner_ids.is_empty() {
        let names: Vec<String> = epic
            .owner_ids
            .iter()
            .map(|id| directory.display_name(id))
            .collect();
        println!("   Owners:  {}", names.join(", "));
    }
    if let Some(stats) = &epic.stats {
        println!(
            "   Stories: {} total · {} started · {} done",
            stats.num_stories_total, stats.num_stories_started, stats.num_stories_done
        );
    }
    if let Some(description) = epic.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!();
        let width = content_width().saturating_sub(3);
        let wrapped = textwrap::fill(description.trim(), width);
        println!("{}", textwrap::indent(&wrapped, "   "));
    }

    match stories {
        None => println!("\n   {}", style("stories unavailable (fetch failed)").dim()),
        Some([]) => println!("\n   {}", style("no stories").dim()),
        Some(stories) => {
            println!();
            for story in stories {
                let state = index
                    .state_name(story.workflow_state_id)
                    .unwrap_or("Unknown");
                let owners = if story.owner_ids.is_empty() {
                    "unassigned".to_string()
                } else {
                    story
                        .owner_ids
                        .iter()
                        .map(|id| directory.display_name(id))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                println!(
                    "   {} {:<8} {}  {}",
                    style(format!("{state:<22}")).cyan(),
                    story.story_type,
                    story.name,
                    style(owners).dim()
                );
            }
        }
    }
    println!();
}

/// Fixed-width block gauge, filled proportionally to `percent`.
fn gauge(percent: f64, width: usize) -> String {
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Usable text width, clamped so narrow panes still wrap sanely and very
/// wide ones do not produce unreadable lines.
fn content_width() -> usize {
    terminal_size::terminal_size()
        .map(|(terminal_size::Width(w), _)| w as usize)
        .unwrap_or(100)
        .clamp(40, 100)
}
