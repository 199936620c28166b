//! Configuration commands — `epicboard init` and `epicboard config`.

use std::path::Path;

use anyhow::Result;

use super::super::ConfigCommands;
use epicboard::board_config::BoardConfig;

pub fn cmd_init(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        println!("Delete it first if you want to recreate it.");
        return Ok(());
    }

    BoardConfig::default().save(config_path)?;

    println!("Created {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. epicboard config set-token <token>     store your Shortcut API token");
    println!("  2. epicboard workflows --pick             choose the workflow the board reads");
    println!("  3. epicboard epics add <name> --team a,b  track your first epic");
    println!();
    println!("Have an old .env / shortcut.yml / epics.yml setup?");
    println!("Run 'epicboard config migrate' from that directory instead.");
    println!();
    Ok(())
}

pub fn cmd_config(config_path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Epicboard Configuration");
            println!("=======================");
            println!();

            if !config_path.exists() {
                println!("No config found at {}", config_path.display());
                println!();
                println!("Run 'epicboard init' to create one.");
                println!();
                return Ok(());
            }

            println!("Config file: {}", config_path.display());
            println!();

            let config = BoardConfig::load(config_path)?;
            match &config.api_token {
                Some(token) => println!("  api_token = \"{}\"", redact(token)),
                None => println!("  api_token = (not set)"),
            }
            match &config.workflow {
                Some(workflow) => println!(
                    "  workflow  = \"{}\" (id {}, {} states cached)",
                    workflow.name,
                    workflow.id,
                    workflow.states.len()
                ),
                None => println!("  workflow  = (not set)"),
            }
            if config.epics.is_empty() {
                println!("  epics     = (none tracked)");
            } else {
                println!("  epics:");
                for (i, epic) in config.epics.iter().enumerate() {
                    if epic.team.is_empty() {
                        println!("    {}. {}", i + 1, epic.name);
                    } else {
                        println!("    {}. {} (team: {})", i + 1, epic.name, epic.team.join(", "));
                    }
                }
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating {}...", config_path.display());
            println!();

            if !config_path.exists() {
                println!("No config file found. Defaults are valid.");
                println!("Run 'epicboard init' to create one.");
                println!();
                return Ok(());
            }

            let config = BoardConfig::load(config_path)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::SetToken { token }) => {
            let trimmed = token.trim();
            if trimmed.is_empty() {
                anyhow::bail!("Token cannot be empty");
            }

            let mut config = BoardConfig::load_or_default(config_path)?;
            config.api_token = Some(trimmed.to_string());
            config.save(config_path)?;

            println!("Token saved to {}", config_path.display());
        }
        Some(ConfigCommands::Migrate { dir }) => {
            let dir = match dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };

            println!();
            println!("Scanning {} for legacy config files...", dir.display());
            println!();

            let import = BoardConfig::migrate_legacy(&dir)?;
            if import.is_empty() {
                println!("Nothing to import: no .env, shortcut.yml, or epics.yml found there.");
                println!();
                return Ok(());
            }

            let mut config = BoardConfig::load_or_default(config_path)?;
            import.apply_to(&mut config);
            config.save(config_path)?;

            println!("Imported into {}:", config_path.display());
            if import.api_token.is_some() {
                println!("  - API token (from .env)");
            }
            if let Some(workflow) = &import.workflow {
                println!(
                    "  - workflow \"{}\" with {} states (from shortcut.yml)",
                    workflow.name,
                    workflow.states.len()
                );
            }
            if let Some(epics) = &import.epics {
                println!("  - {} tracked epic(s) (from epics.yml)", epics.len());
            }
            println!();
        }
    }

    Ok(())
}

/// Show enough of the token to recognize it, never the whole thing.
fn redact(token: &str) -> String {
    let trimmed = token.trim();
    match (trimmed.get(..4), trimmed.get(trimmed.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if trimmed.len() > 8 => format!("{head}...{tail}"),
        _ => "********".to_string(),
    }
}
