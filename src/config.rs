//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/semtree/semtree.toml`
//! 3. Local config: an explicit file passed to [`Settings::load`]
//! 4. Environment variables: `SEMTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::PipelineError;

/// Default name of synthetic results containers.
pub const DEFAULT_FRAGMENT_ROOT_NAME: &str = "results";

/// Settings consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Name given to synthetic results containers (select, branch, empty filter)
    pub fragment_root_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fragment_root_name: DEFAULT_FRAGMENT_ROOT_NAME.into(),
        }
    }
}

/// Get the XDG config directory for semtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "semtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("semtree.toml"))
}

impl Settings {
    pub fn with_fragment_root_name(name: impl Into<String>) -> Self {
        Self {
            fragment_root_name: name.into(),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Optional config file; must exist when given
    pub fn load(local: Option<&Path>) -> Result<Self, PipelineError> {
        let mut builder = Config::builder()
            .set_default("fragment_root_name", DEFAULT_FRAGMENT_ROOT_NAME)
            .map_err(config_err)?;

        if let Some(global_path) = global_config_path() {
            debug!(path = %global_path.display(), "global config");
            builder = builder.add_source(File::from(global_path).required(false));
        }

        if let Some(local_path) = local {
            debug!(path = %local_path.display(), "local config");
            builder = builder.add_source(File::from(local_path.to_path_buf()).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SEMTREE")
                .prefix_separator("_")
                .separator("__"),
        );

        let config = builder.build().map_err(config_err)?;
        let settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.fragment_root_name.trim().is_empty() {
            return Err(PipelineError::Config {
                message: "fragment_root_name must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Effective settings as TOML.
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Config {
            message: format!("serialize settings: {}", e),
        })
    }
}

fn config_err(e: config::ConfigError) -> PipelineError {
    PipelineError::Config {
        message: e.to_string(),
    }
}
