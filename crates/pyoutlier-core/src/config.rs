//! Runtime configuration, applied once when the embedded runtime starts.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::ConfigError;

/// Settings consumed by the runtime bootstrap.
///
/// ```toml
/// python_paths = ["./detectors", "/opt/models/lib"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Directories prepended to `sys.path`, first entry searched first.
    pub python_paths: Vec<PathBuf>,
}

impl RuntimeConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Load configuration from a TOML file.
    ///
    /// Relative `python_paths` are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config = Self::from_toml(&contents)?;

        if let Some(base) = path.parent() {
            for entry in &mut config.python_paths {
                if entry.is_relative() {
                    *entry = base.join(&*entry);
                }
            }
        }

        tracing::debug!(path = %path.display(), paths = config.python_paths.len(), "loaded runtime config");
        Ok(config)
    }

    /// Builder-style helper for prepending one search path.
    pub fn with_python_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.python_paths.push(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = RuntimeConfig::from_toml("").unwrap();
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn test_python_paths_parsed_in_order() {
        let config = RuntimeConfig::from_toml(r#"python_paths = ["/a", "/b"]"#).unwrap();
        assert_eq!(
            config.python_paths,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = RuntimeConfig::from_toml("module = \"stats\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("pyoutlier.toml");
        std::fs::write(&file, r#"python_paths = ["detectors", "/abs"]"#).unwrap();

        let config = RuntimeConfig::load(&file).unwrap();
        assert_eq!(config.python_paths[0], dir.path().join("detectors"));
        assert_eq!(config.python_paths[1], PathBuf::from("/abs"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuntimeConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
