use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "epicboard")]
#[command(version, about = "Terminal dashboard for tracked epics")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the config file. Defaults to ~/.config/epicboard/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a starter config file
    Init,
    /// Render the board for every tracked epic
    Board {
        /// Re-render every N seconds instead of once
        #[arg(long, value_name = "SECONDS")]
        watch: Option<u64>,
    },
    /// View or edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Manage the tracked epic list
    Epics {
        #[command(subcommand)]
        command: Option<EpicsCommands>,
    },
    /// List workflows or select the one the board reads states from
    Workflows {
        /// Persist this workflow id in the config
        #[arg(long)]
        select: Option<i64>,

        /// Choose a workflow interactively
        #[arg(long)]
        pick: bool,
    },
    /// Write the board charts to an SVG file
    Export {
        /// Output path
        #[arg(short, long, default_value = "epicboard.svg")]
        out: PathBuf,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration (token redacted)
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Store the Shortcut API token
    SetToken { token: String },
    /// Import token, workflow, and epics from the legacy dotfile layout
    Migrate {
        /// Directory holding .env / shortcut.yml / epics.yml (defaults to cwd)
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Clone)]
pub enum EpicsCommands {
    /// List tracked epics in board order
    List,
    /// Track a new epic by name
    Add {
        name: String,

        /// Comma-separated roster of team member names
        #[arg(long)]
        team: Option<String>,
    },
    /// Stop tracking an epic
    Remove { name: String },
    /// Move an epic to a 1-based position in the board order
    Move { name: String, position: usize },
    /// Edit an epic's team roster
    Team {
        name: String,

        /// Comma-separated names to add
        #[arg(long)]
        add: Option<String>,

        /// Comma-separated names to remove
        #[arg(long)]
        remove: Option<String>,
    },
    /// Fetch and show one tracked epic story by story
    Show { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => epicboard::board_config::BoardConfig::default_path()?,
    };

    match &cli.command {
        Commands::Init => cmd::cmd_init(&config_path)?,
        Commands::Board { watch } => cmd::cmd_board(&config_path, *watch).await?,
        Commands::Config { command } => cmd::cmd_config(&config_path, command.clone())?,
        Commands::Epics { command } => cmd::cmd_epics(&config_path, command.clone()).await?,
        Commands::Workflows { select, pick } => {
            cmd::cmd_workflows(&config_path, *select, *pick).await?
        }
        Commands::Export { out } => cmd::cmd_export(&config_path, out).await?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "epicboard=debug"
    } else {
        "epicboard=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}
