//! Configuration module
//!
//! Loads and validates game configuration files and exposes them to the
//! session through [`ConfigSource`], which is consulted every time a game
//! starts or tracking is enabled.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{ConfigLoader, LoadResult, LoadWarning, LoaderOptions};
pub use schema::*;
pub use validation::{ValidationResult, Validator};

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::ConfigError;

/// Supplies the current game configuration.
pub trait ConfigSource {
    /// Returns the configuration as it is right now.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration cannot be produced.
    fn load(&mut self) -> Result<GameConfig, ConfigError>;
}

/// Reads a YAML file on every call so edits apply at the next start.
#[derive(Debug)]
pub struct FileConfigSource {
    path: PathBuf,
    loader: ConfigLoader,
}

impl FileConfigSource {
    /// Creates a source for `path` with default loader options.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            loader: ConfigLoader::with_defaults(),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&mut self) -> Result<GameConfig, ConfigError> {
        let result = self.loader.load(&self.path)?;
        for warning in &result.warnings {
            warn!(
                path = %self.path.display(),
                location = warning.location.as_deref().unwrap_or(""),
                "{}",
                warning.message
            );
        }
        Ok(GameConfig::clone(&result.config))
    }
}

/// Serves a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    config: GameConfig,
}

impl StaticConfigSource {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: GameConfig) -> Self {
        Self { config }
    }

    /// Replaces the served configuration.
    pub fn set(&mut self, config: GameConfig) {
        self.config = config;
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&mut self) -> Result<GameConfig, ConfigError> {
        Ok(self.config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_rereads() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "world: arena\nred_light_seconds: 4").unwrap();
        let mut source = FileConfigSource::new(file.path());
        assert_eq!(source.load().unwrap().red_light_seconds, 4);

        std::fs::write(file.path(), "world: arena\nred_light_seconds: 6\n").unwrap();
        assert_eq!(source.load().unwrap().red_light_seconds, 6);
    }

    #[test]
    fn test_file_source_missing() {
        let mut source = FileConfigSource::new("/nonexistent/redlight.yaml");
        assert!(matches!(source.load(), Err(ConfigError::MissingFile { .. })));
    }

    #[test]
    fn test_static_source() {
        let mut source = StaticConfigSource::default();
        assert_eq!(source.load().unwrap(), GameConfig::default());
        source.set(GameConfig {
            debug: true,
            ..GameConfig::default()
        });
        assert!(source.load().unwrap().debug);
    }
}
