//! File-based configuration
//!
//! Loads `strata.toml` from the path given with `--config`, or from the
//! current directory when present. Every field is optional.
//!
//! ```toml
//! output_dir = ".strata"
//! extensions = ["js", "mjs"]
//! progress = true
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE: &str = "strata.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where diffs and the version manifest are written
    pub output_dir: PathBuf,
    /// Source file extensions to parse, without the dot
    pub extensions: Vec<String>,
    /// Show a progress bar while mining
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_dir: PathBuf::from(".strata"),
            extensions: vec!["js".to_string(), "mjs".to_string()],
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the explicit file, else `strata.toml` in the working directory, else defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let local = Path::new(CONFIG_FILE);
        if local.exists() {
            tracing::debug!("Using {}", local.display());
            return Self::from_file(local);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = toml::from_str("output_dir = \"out\"").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.extensions, vec!["js", "mjs"]);
        assert!(config.progress);
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "extensions = [\"js\"]\nprogress = false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.extensions, vec!["js"]);
        assert!(!config.progress);
        assert_eq!(config.output_dir, PathBuf::from(".strata"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/strata.toml"))).is_err());
    }
}
