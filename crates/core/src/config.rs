//! Configuration file
//!
//! gd keeps its settings and parent records in one TOML file,
//! `<config dir>/gd/config.toml`, or `$GD_CONFIG_DIR/config.toml` when that
//! variable is set. The file is only ever written with owner-only
//! permissions because parent records name token variables.
//!
//! Bumping [`SCHEMA_VERSION`] requires a matching step in
//! `ConfigManager::migrate`.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::parent::Parent;
use crate::sync::TransferPolicy;

/// Version written into new files
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "GD_CONFIG_DIR";

const FILE_NAME: &str = "config.toml";

/// Whole configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Files written before versioning carry no version and read as 0
    #[serde(default)]
    pub schema_version: u32,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub parents: Vec<Parent>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            parents: Vec::new(),
        }
    }
}

/// Output format used when `--json` is not given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// When to color human-readable output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Settings applied when the command line does not say otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub output: OutputFormat,

    pub color: ColorMode,

    /// Show progress bars during push and pull
    pub progress: bool,

    /// What push and pull do with existing targets
    pub conflict: TransferPolicy,

    /// Parent used when a command does not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: OutputFormat::default(),
            color: ColorMode::default(),
            progress: true,
            conflict: TransferPolicy::default(),
            parent: None,
        }
    }
}

/// Reads and writes the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// Manager for the file in the default location
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("gd"),
        };
        Ok(Self::with_path(dir.join(FILE_NAME)))
    }

    /// Manager for the file at `path`
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn config_path(&self) -> &Path {
        &self.path
    }

    /// Read the file, or the default configuration when there is none
    pub fn load(&self) -> Result<Config> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(e.into()),
        };
        let config: Config = toml::from_str(&content)?;

        match config.schema_version {
            v if v == SCHEMA_VERSION => Ok(config),
            v if v < SCHEMA_VERSION => Ok(Self::migrate(config)),
            v => Err(Error::Config(format!(
                "{} uses schema version {v}, this gd understands up to {SCHEMA_VERSION}; please upgrade gd",
                self.path.display()
            ))),
        }
    }

    /// Write `config`, replacing the file in one step
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let staging = self.path.with_extension("toml.tmp");
        std::fs::write(&staging, toml::to_string_pretty(config)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&staging, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }

    fn migrate(mut config: Config) -> Config {
        debug!(from = config.schema_version, to = SCHEMA_VERSION, "Migrating configuration");
        // v0 files predate the default-parent setting
        if config.schema_version == 0 && config.defaults.parent.is_none() {
            config.defaults.parent = config.parents.first().map(|p| p.name.clone());
        }
        config.schema_version = SCHEMA_VERSION;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> ConfigManager {
        ConfigManager::with_path(dir.path().join("gd").join(FILE_NAME))
    }

    #[test]
    fn test_missing_file_reads_as_default() {
        let dir = TempDir::new().unwrap();
        let config = manager_in(&dir).load().unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults, Defaults::default());
        assert_eq!(config.defaults.conflict, TransferPolicy::Ask);
        assert!(config.defaults.progress);
        assert!(config.parents.is_empty());
    }

    #[test]
    fn test_saved_settings_come_back() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);

        let mut config = Config::default();
        config.defaults.output = OutputFormat::Json;
        config.defaults.conflict = TransferPolicy::CreateCopy;
        config.defaults.parent = Some("team".into());
        config.parents.push(Parent::new("team", "0AExample", "Team Drive"));
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded.defaults, config.defaults);
        assert_eq!(loaded.parents, config.parents);
        assert!(!manager.config_path().with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_hand_written_file() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);
        std::fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
        std::fs::write(
            manager.config_path(),
            r#"
            schema_version = 1

            [defaults]
            conflict = "skip"
            color = "never"

            [[parents]]
            name = "origin"
            drive_id = "root"
            "#,
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.defaults.output, OutputFormat::Human);
        assert_eq!(config.defaults.color, ColorMode::Never);
        assert_eq!(config.defaults.conflict, TransferPolicy::Skip);
        let origin = &config.parents[0];
        assert_eq!(origin.working_id(), "root");
        assert_eq!(origin.display_cwd(), "~");
        assert_eq!(origin.token_env, "GD_ACCESS_TOKEN");
    }

    #[test]
    fn test_unversioned_file_is_migrated() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);
        std::fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
        std::fs::write(
            manager.config_path(),
            "[[parents]]\nname = \"first\"\ndrive_id = \"root\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.parent.as_deref(), Some("first"));
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);
        std::fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
        std::fs::write(
            manager.config_path(),
            format!("schema_version = {}\n", SCHEMA_VERSION + 1),
        )
        .unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("please upgrade gd"));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let manager = manager_in(&dir);
        manager.save(&Config::default()).unwrap();
        let mode = std::fs::metadata(manager.config_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
