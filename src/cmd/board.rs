//! Board rendering command — `epicboard board`.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use console::Term;

use epicboard::board_config::{BoardConfig, TrackedEpic};
use epicboard::resolve::{self, MemberDirectory};
use epicboard::shortcut::client::{EpicSource, ShortcutClient};
use epicboard::ui::{self, FetchSpinner};
use epicboard::view::{BoardView, CycleEvent};
use epicboard::workflow::StateIndex;

pub async fn cmd_board(config_path: &Path, watch: Option<u64>) -> Result<()> {
    let config = BoardConfig::load_or_default(config_path)?;
    let token = config.require_token()?;
    let workflow = config.require_workflow()?;
    let tracked = config.require_epics()?;

    let client = ShortcutClient::new(token)?;
    let index = StateIndex::build(&workflow.states);
    let names: Vec<String> = tracked.iter().map(|epic| epic.name.clone()).collect();

    // The member directory outlives individual cycles so watch mode only
    // pays for lookups the first time an owner id appears.
    let mut directory = MemberDirectory::new();
    let mut view = BoardView::default();

    loop {
        run_cycle(
            &client,
            &names,
            tracked,
            &index,
            &mut directory,
            &mut view,
            &workflow.name,
        )
        .await;

        let Some(seconds) = watch else { break };
        tokio::time::sleep(Duration::from_secs(seconds.max(1))).await;
        Term::stdout().clear_screen().ok();
    }

    Ok(())
}

/// One full search cycle: resolve every tracked name, prefetch member
/// names, fold the results into the view, render. Individual fetch
/// failures degrade the affected epic instead of aborting the cycle.
async fn run_cycle<S>(
    source: &S,
    names: &[String],
    tracked: &[TrackedEpic],
    index: &StateIndex,
    directory: &mut MemberDirectory,
    view: &mut BoardView,
    workflow_name: &str,
) where
    S: EpicSource + Sync,
{
    view.apply(CycleEvent::Started {
        epics_total: names.len(),
    });

    let spinner = FetchSpinner::new(format!("Fetching {} tracked epic(s)...", names.len()));
    let outcome = resolve::resolve_epics(source, names).await;
    spinner.set_message("Resolving member names...");
    let member_auth = resolve::prefetch_members(source, &outcome.epics, directory).await;
    spinner.finish_and_clear();

    for resolution in &outcome.epics {
        view.apply(CycleEvent::EpicResolved {
            name: resolution.name().to_string(),
            found: !resolution.is_not_found(),
        });
    }
    if outcome.auth_required || member_auth {
        view.apply(CycleEvent::AuthRequired);
    }
    view.apply(CycleEvent::Finished { at: Utc::now() });

    ui::board::render_board(view, tracked, &outcome.epics, index, directory, workflow_name);
}
