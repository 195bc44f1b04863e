//! Session settings
//!
//! Settings are stored as JSON in `{config_dir}/voxdraw/settings.json`.
//! Missing files fall back to defaults; malformed files are an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use voxdraw_script::ScriptLimits;

/// Errors loading or validating settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to access settings file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Largest `max_grid_size` a settings file may request (256³ cells)
pub const GRID_SIZE_LIMIT: usize = 256;

/// Tunables for a drawing session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Edge length of the cubic grid
    pub grid_size: usize,
    /// Largest grid size accepted by `resize`
    pub max_grid_size: usize,
    /// Checkpoint interval in x-rows
    pub yield_every_rows: usize,
    /// Script operations allowed per cell, 0 for unlimited
    pub max_operations_per_cell: u64,
    /// Script call depth limit
    pub max_call_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_size: 16,
            max_grid_size: 128,
            yield_every_rows: 1,
            max_operations_per_cell: 100_000,
            max_call_depth: 64,
        }
    }
}

impl Settings {
    /// `{config_dir}/voxdraw/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("voxdraw").join("settings.json"))
    }

    /// Load from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            serde_json::from_str(&contents).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self, SettingsError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(io_err)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.grid_size == 0 {
            return Err(SettingsError::Invalid("grid_size must be at least 1".into()));
        }
        if self.max_grid_size > GRID_SIZE_LIMIT {
            return Err(SettingsError::Invalid(format!(
                "max_grid_size {} exceeds the limit of {GRID_SIZE_LIMIT}",
                self.max_grid_size
            )));
        }
        if self.grid_size > self.max_grid_size {
            return Err(SettingsError::Invalid(format!(
                "grid_size {} exceeds max_grid_size {}",
                self.grid_size, self.max_grid_size
            )));
        }
        if self.yield_every_rows == 0 {
            return Err(SettingsError::Invalid(
                "yield_every_rows must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Interpreter limits derived from these settings
    pub fn script_limits(&self) -> ScriptLimits {
        ScriptLimits {
            max_operations: self.max_operations_per_cell,
            max_call_depth: self.max_call_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("voxdraw-settings-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert_eq!(settings.grid_size, 16);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        let zero = Settings {
            grid_size: 0,
            ..Settings::default()
        };
        assert!(matches!(zero.validate(), Err(SettingsError::Invalid(_))));

        let too_big = Settings {
            grid_size: 200,
            ..Settings::default()
        };
        assert!(too_big.validate().is_err());

        let no_yield = Settings {
            yield_every_rows: 0,
            ..Settings::default()
        };
        assert!(no_yield.validate().is_err());

        let huge = Settings {
            grid_size: 100_000_000,
            max_grid_size: usize::MAX,
            ..Settings::default()
        };
        assert!(matches!(huge.validate(), Err(SettingsError::Invalid(_))));

        let at_limit = Settings {
            grid_size: 32,
            max_grid_size: GRID_SIZE_LIMIT,
            ..Settings::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_round_trip() {
        let path = temp_path("round_trip.json");
        let settings = Settings {
            grid_size: 24,
            yield_every_rows: 4,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "grid_size": 8 }"#).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.grid_size, 8);
        assert_eq!(loaded.max_grid_size, 128);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_default() {
        let loaded = Settings::load(&temp_path("does-not-exist.json")).unwrap();
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn test_malformed_and_invalid_files() {
        let path = temp_path("malformed.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Parse { .. })
        ));

        fs::write(&path, r#"{ "grid_size": 0 }"#).unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Invalid(_))
        ));

        fs::write(
            &path,
            r#"{ "grid_size": 4000000, "max_grid_size": 18446744073709551615 }"#,
        )
        .unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(SettingsError::Invalid(_))
        ));
        let _ = fs::remove_file(&path);
    }
}
