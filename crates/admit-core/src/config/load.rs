//! Configuration loading from files and environment
//!
//! All operations return new instances rather than mutating in place.

use std::path::{Path, PathBuf};

use super::types::{LockServiceKind, SchedulerConfig};
use crate::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════
// PUBLIC API
// ═══════════════════════════════════════════════════════════════════════════

/// Load configuration from all sources with hierarchy
///
/// When `explicit` is given it replaces the project config file and must exist.
///
/// # Errors
///
/// Returns error if:
/// - A config file is malformed TOML
/// - An explicit config path does not exist
/// - An `ADMIT_*` variable holds an invalid value
/// - The merged config fails validation
pub fn load_config(explicit: Option<&Path>) -> Result<SchedulerConfig> {
    load_config_layers(global_config_path().as_deref(), explicit)
}

/// Load configuration with the global config file taken from `global`
/// instead of the user's config directory
///
/// A missing `global` file is skipped, as in `load_config`.
///
/// # Errors
///
/// Same as `load_config`.
pub fn load_config_layers(
    global: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<SchedulerConfig> {
    // 1. Built-in defaults
    let config = SchedulerConfig::default();

    // 2. Global config
    let config = match global {
        Some(path) if path.exists() => config.merge(load_toml_file(path)?),
        _ => config,
    };

    // 3. Project config, or the explicit file
    let config = match explicit {
        Some(path) => config.merge(load_toml_file(path)?),
        None => {
            let project_path = project_config_path()?;
            if project_path.exists() {
                config.merge(load_toml_file(&project_path)?)
            } else {
                config
            }
        }
    };

    // 4. Environment variable overrides
    let config = config.apply_env_vars()?;

    config.validate()?;
    Ok(config)
}

// ═══════════════════════════════════════════════════════════════════════════
// PATH HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Get path to global config file
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "admit")
        .map(|proj_dirs| proj_dirs.config_dir().join("config.toml"))
}

/// Get path to project config file
///
/// # Errors
///
/// Returns error if current directory cannot be determined
pub fn project_config_path() -> Result<PathBuf> {
    std::env::current_dir()
        .map(|dir| dir.join(".admit/config.toml"))
        .map_err(|e| Error::IoError(format!("Failed to get current directory: {e}")))
}

/// Load a TOML file into a config
///
/// # Errors
///
/// Returns error if the file cannot be read, is a directory, or is malformed TOML
pub fn load_toml_file(path: &Path) -> Result<SchedulerConfig> {
    if path.is_dir() {
        return Err(Error::IoError(format!(
            "Config path is a directory, not a file: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::IoError(format!(
            "Failed to read config file {}: {e}",
            path.display()
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::ParseError(format!(
            "Failed to parse config file {}: {e}",
            path.display()
        ))
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// ENVIRONMENT VARIABLE OVERRIDES
// ═══════════════════════════════════════════════════════════════════════════

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidConfig(format!("{name} has invalid value '{value}'")))
}

impl SchedulerConfig {
    /// Apply `ADMIT_*` environment variable overrides
    ///
    /// # Errors
    ///
    /// Returns error if environment variable values are invalid
    pub fn apply_env_vars(mut self) -> Result<Self> {
        if let Ok(value) = std::env::var("ADMIT_LOCK_GROUP") {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "ADMIT_LOCK_GROUP cannot be empty - unset the variable or provide a group"
                        .to_string(),
                ));
            }
            self.lock_group = value;
        }

        if let Ok(value) = std::env::var("ADMIT_LOCK_SERVICE") {
            self.lock_service = parse_env::<LockServiceKind>("ADMIT_LOCK_SERVICE", &value)?;
        }

        if let Ok(value) = std::env::var("ADMIT_ENGINE") {
            self.command.program = value;
        }

        if let Ok(value) = std::env::var("ADMIT_POOL") {
            self.command.pool = value;
        }

        if let Ok(value) = std::env::var("ADMIT_TICK_MS") {
            self.tick_ms = parse_env("ADMIT_TICK_MS", &value)?;
        }

        if let Ok(value) = std::env::var("ADMIT_MAX_ITERATIONS") {
            self.max_iterations = Some(parse_env("ADMIT_MAX_ITERATIONS", &value)?);
        }

        if let Ok(value) = std::env::var("ADMIT_SEED") {
            self.seed = Some(parse_env("ADMIT_SEED", &value)?);
        }

        Ok(self)
    }
}
