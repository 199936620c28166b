//! Versioned configuration for epicboard.
//!
//! Everything lives in one TOML document, by default at
//! `~/.config/epicboard/config.toml`:
//!
//! ```toml
//! version = 1
//! api_token = "12345678-..."
//!
//! [workflow]
//! id = 500000
//! name = "Engineering"
//!
//! [[workflow.states]]
//! id = 500000001
//! name = "Backlog"
//!
//! [[epics]]
//! name = "Checkout Redesign"
//! team = ["Ana", "Ben"]
//! ```
//!
//! The `version` field is stamped on load so documents written before a
//! schema change migrate forward once and silently. Earlier deployments
//! spread the same data across three files (`.env`, `shortcut.yml`,
//! `epics.yml`); [`BoardConfig::migrate_legacy`] imports those.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::shortcut::models::WorkflowState;

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 1;

const CONFIG_DIR: &str = "epicboard";
const CONFIG_FILE: &str = "config.toml";

const LEGACY_ENV_FILE: &str = ".env";
const LEGACY_ENV_TOKEN_KEY: &str = "SHORTCUT_API_TOKEN";
const LEGACY_WORKFLOW_FILE: &str = "shortcut.yml";
const LEGACY_EPICS_FILE: &str = "epics.yml";

/// One epic the board tracks, with its team roster. List order is display
/// and resolution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEpic {
    pub name: String,
    #[serde(default)]
    pub team: Vec<String>,
}

/// The workflow the user selected as canonical, with its states cached so
/// the board can label stories without an extra round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub states: Vec<WorkflowState>,
}

/// The complete config document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Schema version. Documents written before versioning parse as 0 and
    /// are stamped forward on load.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub workflow: Option<WorkflowConfig>,
    #[serde(default)]
    pub epics: Vec<TrackedEpic>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            api_token: None,
            workflow: None,
            epics: Vec::new(),
        }
    }
}

impl BoardConfig {
    /// The default config file path (`~/.config/epicboard/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine the user config directory"))?;
        Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load and migrate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.migrate_schema();
        Ok(config)
    }

    /// Parse a config document from a TOML string. Does not migrate.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the config file, or start from defaults when it does not exist
    /// yet (the normal first-run state).
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save the document, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Other(anyhow::anyhow!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Upgrade older schema versions in place. Version 0 marks documents
    /// written before the field existed; they need only the stamp. Future
    /// schema changes chain their rewrites here.
    pub fn migrate_schema(&mut self) {
        if self.version == 0 {
            self.version = SCHEMA_VERSION;
        }
    }

    // ── Required-config accessors ────────────────────────────────────
    //
    // Token, workflow, and a non-empty epic list must all exist before a
    // board cycle can run. Absence is expected on first run; the errors
    // name the command that fixes it.

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::Missing {
                what: "API token",
                hint: "config set-token <token>",
            })
    }

    pub fn require_workflow(&self) -> Result<&WorkflowConfig, ConfigError> {
        self.workflow
            .as_ref()
            .filter(|w| !w.states.is_empty())
            .ok_or(ConfigError::Missing {
                what: "Workflow mapping",
                hint: "workflows --select <id>",
            })
    }

    pub fn require_epics(&self) -> Result<&[TrackedEpic], ConfigError> {
        if self.epics.is_empty() {
            Err(ConfigError::Missing {
                what: "Tracked epic list",
                hint: "epics add <name>",
            })
        } else {
            Ok(&self.epics)
        }
    }

    // ── Tracked-epic edits ───────────────────────────────────────────

    /// Case-insensitive lookup by tracked name.
    pub fn find_epic(&self, name: &str) -> Option<&TrackedEpic> {
        self.epics
            .iter()
            .find(|epic| epic.name.eq_ignore_ascii_case(name))
    }

    /// Append a new tracked epic at the end of the list.
    pub fn add_epic(&mut self, name: &str, team: Vec<String>) -> Result<()> {
        if self.find_epic(name).is_some() {
            bail!("Epic '{name}' is already tracked");
        }
        self.epics.push(TrackedEpic {
            name: name.to_string(),
            team,
        });
        Ok(())
    }

    /// Remove a tracked epic, returning it.
    pub fn remove_epic(&mut self, name: &str) -> Result<TrackedEpic> {
        let position = self
            .epics
            .iter()
            .position(|epic| epic.name.eq_ignore_ascii_case(name));
        match position {
            Some(index) => Ok(self.epics.remove(index)),
            None => bail!("Epic '{name}' is not tracked"),
        }
    }

    /// Move a tracked epic to a 1-based position, clamped to the list end.
    /// The relative order of every other epic is preserved.
    pub fn move_epic(&mut self, name: &str, position: usize) -> Result<()> {
        let epic = self.remove_epic(name)?;
        let index = position.saturating_sub(1).min(self.epics.len());
        self.epics.insert(index, epic);
        Ok(())
    }

    /// Edit one epic's roster: `add` names append (duplicates skipped),
    /// `remove` names are dropped, both case-insensitive. Existing roster
    /// order is preserved.
    pub fn edit_team(&mut self, name: &str, add: &[String], remove: &[String]) -> Result<()> {
        let Some(epic) = self
            .epics
            .iter_mut()
            .find(|epic| epic.name.eq_ignore_ascii_case(name))
        else {
            bail!("Epic '{name}' is not tracked");
        };
        epic.team
            .retain(|member| !remove.iter().any(|r| r.eq_ignore_ascii_case(member)));
        for member in add {
            if !epic.team.iter().any(|m| m.eq_ignore_ascii_case(member)) {
                epic.team.push(member.clone());
            }
        }
        Ok(())
    }

    /// Validate the document and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.version > SCHEMA_VERSION {
            warnings.push(format!(
                "Config schema version {} is newer than this build supports ({}); fields may be ignored",
                self.version, SCHEMA_VERSION
            ));
        }

        if let Some(token) = &self.api_token
            && token.trim() != token
        {
            warnings.push("API token has surrounding whitespace".to_string());
        }

        if let Some(workflow) = &self.workflow
            && workflow.states.is_empty()
        {
            warnings.push(format!(
                "Workflow '{}' has no cached states; re-run `epicboard workflows --select {}`",
                workflow.name, workflow.id
            ));
        }

        let mut seen: Vec<String> = Vec::new();
        for epic in &self.epics {
            if epic.name.trim().is_empty() {
                warnings.push("A tracked epic has an empty name".to_string());
                continue;
            }
            let lowered = epic.name.to_lowercase();
            if seen.contains(&lowered) {
                warnings.push(format!("Epic '{}' is tracked more than once", epic.name));
            } else {
                seen.push(lowered);
            }
        }

        warnings
    }

    /// Import the legacy three-file layout from `dir`. Missing files are
    /// skipped; present but unreadable ones are errors. Nothing is written
    /// here; the caller decides whether to apply and save.
    pub fn migrate_legacy(dir: &Path) -> Result<LegacyImport, ConfigError> {
        let mut import = LegacyImport::default();

        let env_path = dir.join(LEGACY_ENV_FILE);
        if env_path.exists() {
            for entry in dotenvy::from_path_iter(&env_path).map_err(|e| {
                ConfigError::LegacyImport {
                    path: env_path.clone(),
                    message: e.to_string(),
                }
            })? {
                let (key, value) = entry.map_err(|e| ConfigError::LegacyImport {
                    path: env_path.clone(),
                    message: e.to_string(),
                })?;
                if key == LEGACY_ENV_TOKEN_KEY && !value.trim().is_empty() {
                    import.api_token = Some(value.trim().to_string());
                }
            }
        }

        let workflow_path = dir.join(LEGACY_WORKFLOW_FILE);
        if workflow_path.exists() {
            let content = std::fs::read_to_string(&workflow_path).map_err(|source| {
                ConfigError::Read {
                    path: workflow_path.clone(),
                    source,
                }
            })?;
            let legacy: LegacyWorkflowFile =
                serde_yaml::from_str(&content).map_err(|e| ConfigError::LegacyImport {
                    path: workflow_path.clone(),
                    message: e.to_string(),
                })?;
            import.workflow = Some(WorkflowConfig {
                id: legacy.workflow_id,
                name: legacy.workflow_name,
                states: legacy.states,
            });
        }

        let epics_path = dir.join(LEGACY_EPICS_FILE);
        if epics_path.exists() {
            let content =
                std::fs::read_to_string(&epics_path).map_err(|source| ConfigError::Read {
                    path: epics_path.clone(),
                    source,
                })?;
            let legacy: LegacyEpicsFile =
                serde_yaml::from_str(&content).map_err(|e| ConfigError::LegacyImport {
                    path: epics_path.clone(),
                    message: e.to_string(),
                })?;
            import.epics = Some(legacy.epics);
        }

        Ok(import)
    }
}

/// What a legacy-layout scan found. Each field is independent, matching
/// the old one-file-per-key layout.
#[derive(Debug, Clone, Default)]
pub struct LegacyImport {
    pub api_token: Option<String>,
    pub workflow: Option<WorkflowConfig>,
    pub epics: Option<Vec<TrackedEpic>>,
}

impl LegacyImport {
    pub fn is_empty(&self) -> bool {
        self.api_token.is_none() && self.workflow.is_none() && self.epics.is_none()
    }

    /// Overwrite the config's fields with whatever the import found.
    /// Fields the import is missing are left untouched.
    pub fn apply_to(&self, config: &mut BoardConfig) {
        if let Some(token) = &self.api_token {
            config.api_token = Some(token.clone());
        }
        if let Some(workflow) = &self.workflow {
            config.workflow = Some(workflow.clone());
        }
        if let Some(epics) = &self.epics {
            config.epics = epics.clone();
        }
    }
}

/// `shortcut.yml` shape from the legacy layout.
#[derive(Debug, Deserialize)]
struct LegacyWorkflowFile {
    workflow_id: i64,
    workflow_name: String,
    #[serde(default)]
    states: Vec<WorkflowState>,
}

/// `epics.yml` shape from the legacy layout.
#[derive(Debug, Deserialize)]
struct LegacyEpicsFile {
    #[serde(default)]
    epics: Vec<TrackedEpic>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tracked(name: &str) -> TrackedEpic {
        TrackedEpic {
            name: name.to_string(),
            team: Vec::new(),
        }
    }

    // =========================================
    // Parsing and schema migration
    // =========================================

    #[test]
    fn test_parse_empty_document() {
        let config = BoardConfig::parse("").unwrap();
        assert_eq!(config.version, 0);
        assert!(config.api_token.is_none());
        assert!(config.workflow.is_none());
        assert!(config.epics.is_empty());
    }

    #[test]
    fn test_parse_full_document() {
        let content = r#"
version = 1
api_token = "12345678-aaaa-bbbb-cccc-123456789012"

[workflow]
id = 500000
name = "Engineering"

[[workflow.states]]
id = 500000001
name = "Backlog"

[[epics]]
name = "Checkout Redesign"
team = ["Ana", "Ben"]

[[epics]]
name = "Search Revamp"
"#;
        let config = BoardConfig::parse(content).unwrap();
        assert_eq!(config.version, 1);
        assert!(config.api_token.is_some());
        let workflow = config.workflow.unwrap();
        assert_eq!(workflow.id, 500000);
        assert_eq!(workflow.states.len(), 1);
        assert_eq!(config.epics.len(), 2);
        assert_eq!(config.epics[0].team, vec!["Ana", "Ben"]);
        assert!(config.epics[1].team.is_empty());
    }

    #[test]
    fn test_migrate_schema_stamps_unversioned_documents() {
        let mut config = BoardConfig::parse("api_token = \"t\"").unwrap();
        assert_eq!(config.version, 0);
        config.migrate_schema();
        assert_eq!(config.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_schema_leaves_current_version_alone() {
        let mut config = BoardConfig::default();
        config.migrate_schema();
        assert_eq!(config.version, SCHEMA_VERSION);
    }

    #[test]
    fn test_load_applies_migration() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_token = \"t\"").unwrap();
        let config = BoardConfig::load(&path).unwrap();
        assert_eq!(config.version, SCHEMA_VERSION);
    }

    // =========================================
    // File I/O
    // =========================================

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = BoardConfig::default();
        config.api_token = Some("secret".to_string());
        config.add_epic("Checkout Redesign", vec!["Ana".to_string()]).unwrap();
        config.save(&path).unwrap();

        let loaded = BoardConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = BoardConfig::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, BoardConfig::default());
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "version = \"not a number\"").unwrap();
        let err = BoardConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    // =========================================
    // Required-config accessors
    // =========================================

    #[test]
    fn test_require_token_absent_or_blank() {
        let mut config = BoardConfig::default();
        assert!(matches!(
            config.require_token(),
            Err(ConfigError::Missing { .. })
        ));
        config.api_token = Some("   ".to_string());
        assert!(config.require_token().is_err());
        config.api_token = Some(" tok ".to_string());
        assert_eq!(config.require_token().unwrap(), "tok");
    }

    #[test]
    fn test_require_workflow_needs_states() {
        let mut config = BoardConfig::default();
        assert!(config.require_workflow().is_err());
        config.workflow = Some(WorkflowConfig {
            id: 1,
            name: "Engineering".to_string(),
            states: Vec::new(),
        });
        // A workflow without cached states cannot label anything.
        assert!(config.require_workflow().is_err());
        config.workflow.as_mut().unwrap().states.push(WorkflowState {
            id: 10,
            name: "Backlog".to_string(),
        });
        assert!(config.require_workflow().is_ok());
    }

    #[test]
    fn test_require_epics_needs_at_least_one() {
        let mut config = BoardConfig::default();
        assert!(config.require_epics().is_err());
        config.epics.push(tracked("Checkout Redesign"));
        assert_eq!(config.require_epics().unwrap().len(), 1);
    }

    // =========================================
    // Tracked-epic edits
    // =========================================

    #[test]
    fn test_add_epic_rejects_case_insensitive_duplicate() {
        let mut config = BoardConfig::default();
        config.add_epic("Checkout Redesign", Vec::new()).unwrap();
        let err = config.add_epic("checkout redesign", Vec::new()).unwrap_err();
        assert!(err.to_string().contains("already tracked"));
        assert_eq!(config.epics.len(), 1);
    }

    #[test]
    fn test_remove_epic_returns_removed_entry() {
        let mut config = BoardConfig::default();
        config.add_epic("Alpha", vec!["Ana".to_string()]).unwrap();
        config.add_epic("Beta", Vec::new()).unwrap();
        let removed = config.remove_epic("alpha").unwrap();
        assert_eq!(removed.name, "Alpha");
        assert_eq!(removed.team, vec!["Ana"]);
        assert_eq!(config.epics.len(), 1);
        assert!(config.remove_epic("Alpha").is_err());
    }

    #[test]
    fn test_move_epic_preserves_relative_order() {
        let mut config = BoardConfig::default();
        for name in ["A", "B", "C", "D"] {
            config.add_epic(name, Vec::new()).unwrap();
        }
        config.move_epic("C", 1).unwrap();
        let order: Vec<&str> = config.epics.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B", "D"]);
    }

    #[test]
    fn test_move_epic_position_clamps_to_end() {
        let mut config = BoardConfig::default();
        for name in ["A", "B"] {
            config.add_epic(name, Vec::new()).unwrap();
        }
        config.move_epic("A", 99).unwrap();
        let order: Vec<&str> = config.epics.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(order, vec!["B", "A"]);
    }

    #[test]
    fn test_edit_team_appends_and_removes() {
        let mut config = BoardConfig::default();
        config
            .add_epic("Alpha", vec!["Ana".to_string(), "Ben".to_string()])
            .unwrap();
        config
            .edit_team(
                "Alpha",
                &["Cleo".to_string(), "ana".to_string()],
                &["BEN".to_string()],
            )
            .unwrap();
        let epic = config.find_epic("Alpha").unwrap();
        // Ana kept her slot, Ben removed, Cleo appended, no duplicate Ana.
        assert_eq!(epic.team, vec!["Ana", "Cleo"]);
    }

    #[test]
    fn test_edit_team_unknown_epic_is_error() {
        let mut config = BoardConfig::default();
        assert!(config.edit_team("Ghost", &[], &[]).is_err());
    }

    // =========================================
    // Validation
    // =========================================

    #[test]
    fn test_validate_clean_config_has_no_warnings() {
        let mut config = BoardConfig::default();
        config.api_token = Some("token".to_string());
        config.add_epic("Alpha", Vec::new()).unwrap();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_newer_schema() {
        let mut config = BoardConfig::default();
        config.version = SCHEMA_VERSION + 1;
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("newer"));
    }

    #[test]
    fn test_validate_flags_duplicate_names() {
        let mut config = BoardConfig::default();
        config.epics.push(tracked("Alpha"));
        config.epics.push(tracked("alpha"));
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("more than once")));
    }

    #[test]
    fn test_validate_flags_stateless_workflow() {
        let mut config = BoardConfig::default();
        config.workflow = Some(WorkflowConfig {
            id: 5,
            name: "Engineering".to_string(),
            states: Vec::new(),
        });
        let warnings = config.validate();
        assert!(warnings.iter().any(|w| w.contains("no cached states")));
    }

    // =========================================
    // Legacy migration
    // =========================================

    #[test]
    fn test_migrate_legacy_empty_dir() {
        let dir = tempdir().unwrap();
        let import = BoardConfig::migrate_legacy(dir.path()).unwrap();
        assert!(import.is_empty());
    }

    #[test]
    fn test_migrate_legacy_full_layout() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "OTHER=1\nSHORTCUT_API_TOKEN=legacy-token\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("shortcut.yml"),
            "workflow_id: 500000\nworkflow_name: Engineering\nstates:\n  - id: 1\n    name: Backlog\n  - id: 2\n    name: Complete\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("epics.yml"),
            "epics:\n  - name: Checkout Redesign\n    team:\n      - Ana\n      - Ben\n  - name: Search Revamp\n",
        )
        .unwrap();

        let import = BoardConfig::migrate_legacy(dir.path()).unwrap();
        assert_eq!(import.api_token.as_deref(), Some("legacy-token"));
        let workflow = import.workflow.as_ref().unwrap();
        assert_eq!(workflow.id, 500000);
        assert_eq!(workflow.states.len(), 2);
        let epics = import.epics.as_ref().unwrap();
        assert_eq!(epics.len(), 2);
        assert_eq!(epics[0].team, vec!["Ana", "Ben"]);
        assert!(epics[1].team.is_empty());
    }

    #[test]
    fn test_migrate_legacy_partial_layout() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "SHORTCUT_API_TOKEN=tok\n").unwrap();
        let import = BoardConfig::migrate_legacy(dir.path()).unwrap();
        assert_eq!(import.api_token.as_deref(), Some("tok"));
        assert!(import.workflow.is_none());
        assert!(import.epics.is_none());
        assert!(!import.is_empty());
    }

    #[test]
    fn test_migrate_legacy_malformed_yaml_is_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("epics.yml"), "epics: [unclosed").unwrap();
        let err = BoardConfig::migrate_legacy(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::LegacyImport { .. }));
    }

    #[test]
    fn test_legacy_import_apply_overwrites_only_found_fields() {
        let mut config = BoardConfig::default();
        config.api_token = Some("current".to_string());
        config.epics.push(tracked("Keep Me"));

        let import = LegacyImport {
            api_token: Some("imported".to_string()),
            workflow: None,
            epics: None,
        };
        import.apply_to(&mut config);
        assert_eq!(config.api_token.as_deref(), Some("imported"));
        // Fields the legacy layout did not have stay as they were.
        assert_eq!(config.epics.len(), 1);
    }
}
