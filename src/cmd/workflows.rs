//! Workflow listing and selection — `epicboard workflows`.

use std::path::Path;

use anyhow::Result;
use dialoguer::Select;

use epicboard::board_config::{BoardConfig, WorkflowConfig};
use epicboard::shortcut::client::{EpicSource, ShortcutClient};
use epicboard::ui::FetchSpinner;

pub async fn cmd_workflows(config_path: &Path, select: Option<i64>, pick: bool) -> Result<()> {
    let mut config = BoardConfig::load_or_default(config_path)?;
    let client = ShortcutClient::new(config.require_token()?)?;

    let spinner = FetchSpinner::new("Fetching workflows...");
    let fetched = client.workflows().await;
    spinner.finish_and_clear();
    let workflows = fetched?;

    if workflows.is_empty() {
        println!("The tracker returned no workflows.");
        return Ok(());
    }

    let current = config.workflow.as_ref().map(|w| w.id);

    let chosen = if let Some(id) = select {
        Some(
            workflows
                .iter()
                .find(|w| w.id == id)
                .ok_or_else(|| anyhow::anyhow!("No workflow with id {id}"))?,
        )
    } else if pick {
        let labels: Vec<String> = workflows
            .iter()
            .map(|w| format!("{} ({} states)", w.name, w.states.len()))
            .collect();
        let default = workflows
            .iter()
            .position(|w| Some(w.id) == current)
            .unwrap_or(0);
        let choice = Select::new()
            .with_prompt("Workflow for the board")
            .items(&labels)
            .default(default)
            .interact()?;
        Some(&workflows[choice])
    } else {
        None
    };

    match chosen {
        Some(workflow) => {
            config.workflow = Some(WorkflowConfig {
                id: workflow.id,
                name: workflow.name.clone(),
                states: workflow.states.clone(),
            });
            config.save(config_path)?;
            println!(
                "Workflow '{}' selected ({} states cached).",
                workflow.name,
                workflow.states.len()
            );
        }
        None => {
            println!();
            println!("Workflows");
            println!("=========");
            println!();
            for workflow in &workflows {
                let marker = if Some(workflow.id) == current { "*" } else { " " };
                println!(
                    "{} {:>6}  {} ({} states)",
                    marker,
                    workflow.id,
                    workflow.name,
                    workflow.states.len()
                );
            }
            println!();
            println!("Select one with 'epicboard workflows --select <id>' or '--pick'.");
            println!();
        }
    }

    Ok(())
}
