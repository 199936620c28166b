//! Tracked-epic management commands — `epicboard epics`.

use std::path::Path;

use anyhow::Result;

use super::super::EpicsCommands;
use epicboard::board_config::BoardConfig;
use epicboard::resolve::{self, EpicResolution, MemberDirectory};
use epicboard::shortcut::client::{EpicSource, ShortcutClient};
use epicboard::ui::{self, FetchSpinner};
use epicboard::workflow::StateIndex;

pub async fn cmd_epics(config_path: &Path, command: Option<EpicsCommands>) -> Result<()> {
    match command {
        None | Some(EpicsCommands::List) => {
            let config = BoardConfig::load_or_default(config_path)?;

            println!();
            println!("Tracked Epics");
            println!("=============");
            println!();

            if config.epics.is_empty() {
                println!("No epics tracked yet.");
                println!();
                println!("Track one with:");
                println!("  epicboard epics add <name> --team ana,ben");
                println!();
                return Ok(());
            }

            for (i, epic) in config.epics.iter().enumerate() {
                if epic.team.is_empty() {
                    println!("  {}. {}", i + 1, epic.name);
                } else {
                    println!("  {}. {} (team: {})", i + 1, epic.name, epic.team.join(", "));
                }
            }
            println!();
            println!(
                "{} epic(s) tracked. The board renders them in this order.",
                config.epics.len()
            );
            println!();
        }
        Some(EpicsCommands::Add { name, team }) => {
            let mut config = BoardConfig::load_or_default(config_path)?;
            config.add_epic(&name, split_names(team.as_deref()))?;
            config.save(config_path)?;
            println!("Tracking '{}' at position {}.", name, config.epics.len());
        }
        Some(EpicsCommands::Remove { name }) => {
            let mut config = BoardConfig::load_or_default(config_path)?;
            let removed = config.remove_epic(&name)?;
            config.save(config_path)?;
            println!("Stopped tracking '{}'.", removed.name);
        }
        Some(EpicsCommands::Move { name, position }) => {
            let mut config = BoardConfig::load_or_default(config_path)?;
            config.move_epic(&name, position)?;
            config.save(config_path)?;
            println!("New order:");
            for (i, epic) in config.epics.iter().enumerate() {
                println!("  {}. {}", i + 1, epic.name);
            }
        }
        Some(EpicsCommands::Team { name, add, remove }) => {
            let add_names = split_names(add.as_deref());
            let remove_names = split_names(remove.as_deref());
            if add_names.is_empty() && remove_names.is_empty() {
                anyhow::bail!("Nothing to do: pass --add and/or --remove");
            }

            let mut config = BoardConfig::load_or_default(config_path)?;
            config.edit_team(&name, &add_names, &remove_names)?;
            config.save(config_path)?;

            if let Some(epic) = config.find_epic(&name) {
                if epic.team.is_empty() {
                    println!("'{}' now has an empty roster.", epic.name);
                } else {
                    println!("'{}' roster: {}", epic.name, epic.team.join(", "));
                }
            }
        }
        Some(EpicsCommands::Show { name }) => {
            cmd_epics_show(config_path, &name).await?;
        }
    }

    Ok(())
}

/// Resolve one tracked epic and render it story by story.
async fn cmd_epics_show(config_path: &Path, name: &str) -> Result<()> {
    let config = BoardConfig::load_or_default(config_path)?;
    let token = config.require_token()?;
    let workflow = config.require_workflow()?;
    let tracked = config.find_epic(name).ok_or_else(|| {
        anyhow::anyhow!("Epic '{name}' is not tracked. Run 'epicboard epics add \"{name}\"' first")
    })?;

    let client = ShortcutClient::new(token)?;
    let index = StateIndex::build(&workflow.states);

    let spinner = FetchSpinner::new(format!("Resolving '{}'...", tracked.name));
    let outcome = resolve::resolve_epics(&client, std::slice::from_ref(&tracked.name)).await;
    let mut directory = MemberDirectory::new();
    resolve::prefetch_members(&client, &outcome.epics, &mut directory).await;
    spinner.finish_and_clear();

    match outcome.epics.into_iter().next() {
        Some(EpicResolution::Found(resolved)) => {
            // Search hits can carry stale rollup stats; refresh the epic
            // record itself and fall back to the hit when that fails.
            let epic = match client.epic(resolved.epic.id).await {
                Ok(fresh) => fresh,
                Err(err) => {
                    tracing::debug!(error = %err, "epic refresh failed, using search result");
                    resolved.epic
                }
            };
            ui::board::render_detail(&epic, resolved.stories.as_deref(), &index, &directory);
        }
        _ => {
            println!();
            println!("No epic named '{}' was found in the tracker.", tracked.name);
            if outcome.auth_required {
                println!("Authentication failed; check your token with 'epicboard config show'.");
            }
            println!();
        }
    }

    Ok(())
}

/// Split a comma-delimited `--team ana, ben` style list into clean names.
fn split_names(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
