//! SVG chart export — `epicboard export`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;

use epicboard::board_config::BoardConfig;
use epicboard::resolve::{self, MemberDirectory};
use epicboard::shortcut::client::ShortcutClient;
use epicboard::svg::SvgWriter;
use epicboard::ui::FetchSpinner;
use epicboard::workflow::StateIndex;

pub async fn cmd_export(config_path: &Path, out: &Path) -> Result<()> {
    let config = BoardConfig::load_or_default(config_path)?;
    let token = config.require_token()?;
    let workflow = config.require_workflow()?;
    let tracked = config.require_epics()?;

    let client = ShortcutClient::new(token)?;
    let index = StateIndex::build(&workflow.states);
    let names: Vec<String> = tracked.iter().map(|epic| epic.name.clone()).collect();

    let spinner = FetchSpinner::new(format!("Fetching {} tracked epic(s)...", names.len()));
    let outcome = resolve::resolve_epics(&client, &names).await;
    spinner.set_message("Resolving member names...");
    let mut directory = MemberDirectory::new();
    resolve::prefetch_members(&client, &outcome.epics, &mut directory).await;
    spinner.finish_and_clear();

    let file =
        File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    let mut buffered = BufWriter::new(file);
    SvgWriter::new(&mut buffered).write_board(
        tracked,
        &outcome.epics,
        &index,
        &directory,
        Utc::now(),
    )?;
    buffered
        .flush()
        .with_context(|| format!("Failed to write {}", out.display()))?;

    let found = outcome.epics.iter().filter(|r| !r.is_not_found()).count();
    println!(
        "Wrote {} ({} of {} epics resolved).",
        out.display(),
        found,
        names.len()
    );
    if outcome.auth_required {
        println!("Warning: some requests failed authentication; the export may be incomplete.");
    }

    Ok(())
}
