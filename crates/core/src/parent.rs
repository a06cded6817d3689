//! Parent management
//!
//! A parent is a named record of one drive: which drive (or shared drive) to
//! address, where the working directory currently is, and which environment
//! variable holds the access token.

use serde::{Deserialize, Serialize};

use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// Default environment variable holding the access token
pub const DEFAULT_TOKEN_ENV: &str = "GD_ACCESS_TOKEN";

/// A named drive with its working directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parent {
    /// Unique name for this parent
    pub name: String,

    /// Id of the drive root, `root` for the user's own drive
    pub drive_id: String,

    /// Display name of the drive
    #[serde(default)]
    pub drive_name: String,

    /// Working directory relative to the drive root
    #[serde(default)]
    pub cwd_path: String,

    /// Id of the working directory, empty means the drive root
    #[serde(default)]
    pub cwd_id: String,

    /// Environment variable holding the access token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

impl Parent {
    /// Create a parent whose working directory is the drive root
    pub fn new(
        name: impl Into<String>,
        drive_id: impl Into<String>,
        drive_name: impl Into<String>,
    ) -> Self {
        let drive_id = drive_id.into();
        Self {
            name: name.into(),
            cwd_id: drive_id.clone(),
            drive_id,
            drive_name: drive_name.into(),
            cwd_path: String::new(),
            token_env: default_token_env(),
        }
    }

    /// Id of the working directory
    pub fn working_id(&self) -> &str {
        if self.cwd_id.is_empty() {
            &self.drive_id
        } else {
            &self.cwd_id
        }
    }

    /// Working directory for display, `~` based
    pub fn display_cwd(&self) -> String {
        if self.cwd_path.is_empty() {
            "~".to_string()
        } else {
            format!("~/{}", self.cwd_path)
        }
    }

    /// Read the access token from the environment
    pub fn access_token(&self) -> Result<String> {
        match std::env::var(&self.token_env) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(Error::Auth(format!(
                "No access token for parent '{}': set {}",
                self.name, self.token_env
            ))),
        }
    }
}

/// Manager for parent operations
pub struct ParentManager {
    config_manager: ConfigManager,
}

impl ParentManager {
    /// Create a new ParentManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new ParentManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// List all configured parents
    pub fn list(&self) -> Result<Vec<Parent>> {
        let config = self.config_manager.load()?;
        Ok(config.parents)
    }

    /// Get a parent by name
    pub fn get(&self, name: &str) -> Result<Parent> {
        let config = self.config_manager.load()?;
        config
            .parents
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ParentNotFound(name.to_string()))
    }

    /// Add or update a parent
    ///
    /// The first parent ever added becomes the default.
    pub fn set(&self, parent: Parent) -> Result<()> {
        let mut config = self.config_manager.load()?;

        config.parents.retain(|p| p.name != parent.name);
        if config.defaults.parent.is_none() {
            config.defaults.parent = Some(parent.name.clone());
        }
        config.parents.push(parent);

        self.config_manager.save(&config)
    }

    /// Add a parent that must not exist yet
    pub fn add(&self, parent: Parent) -> Result<()> {
        if self.exists(&parent.name)? {
            return Err(Error::ParentExists(parent.name));
        }
        self.set(parent)
    }

    /// Remove a parent
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.parents.len();

        config.parents.retain(|p| p.name != name);

        if config.parents.len() == original_len {
            return Err(Error::ParentNotFound(name.to_string()));
        }
        if config.defaults.parent.as_deref() == Some(name) {
            config.defaults.parent = config.parents.first().map(|p| p.name.clone());
        }

        self.config_manager.save(&config)
    }

    /// Check if a parent exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.parents.iter().any(|p| p.name == name))
    }

    /// The default parent
    pub fn default_parent(&self) -> Result<Parent> {
        let config = self.config_manager.load()?;
        let name = config.defaults.parent.ok_or_else(|| {
            Error::Config("No default parent configured. Use 'gd parent set' first.".into())
        })?;
        config
            .parents
            .into_iter()
            .find(|p| p.name == name)
            .ok_or(Error::ParentNotFound(name))
    }

    /// The named parent, or the default one
    pub fn resolve(&self, name: Option<&str>) -> Result<Parent> {
        match name {
            Some(name) => self.get(name),
            None => self.default_parent(),
        }
    }

    /// Make `name` the default parent
    pub fn set_default(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        if !config.parents.iter().any(|p| p.name == name) {
            return Err(Error::ParentNotFound(name.to_string()));
        }
        config.defaults.parent = Some(name.to_string());
        self.config_manager.save(&config)
    }

    /// Record a new working directory for `name`
    pub fn set_cwd(&self, name: &str, cwd_path: &str, cwd_id: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let parent = config
            .parents
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ParentNotFound(name.to_string()))?;
        parent.cwd_path = cwd_path.to_string();
        parent.cwd_id = cwd_id.to_string();
        self.config_manager.save(&config)
    }
}
