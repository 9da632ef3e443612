//! Tracer configuration, loadable from a small TOML file.
//!
//! ```toml
//! enabled = true
//! color = false
//! target = "stderr"
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Where trace lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceTarget {
    #[default]
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub enabled: bool,
    pub color: bool,
    pub target: TraceTarget,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: true,
            target: TraceTarget::Stdout,
        }
    }
}

impl TraceConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` when given, otherwise defaults, then applies `NO_COLOR`.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config.with_no_color(env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty())))
    }

    fn with_no_color(mut self, no_color: bool) -> Self {
        if no_color {
            self.color = false;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ============================================================================
    // Parsing
    // ============================================================================

    #[test]
    fn empty_document_uses_defaults() {
        let config = TraceConfig::from_toml_str("").unwrap();
        assert_eq!(config, TraceConfig::default());
        assert!(config.enabled);
        assert!(config.color);
        assert_eq!(config.target, TraceTarget::Stdout);
    }

    #[test]
    fn fields_override_defaults() {
        let config = TraceConfig::from_toml_str("color = false\ntarget = \"stderr\"").unwrap();
        assert!(config.enabled);
        assert!(!config.color);
        assert_eq!(config.target, TraceTarget::Stderr);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = TraceConfig::from_toml_str("colour = true").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn bad_target_is_rejected() {
        assert!(TraceConfig::from_toml_str("target = \"syslog\"").is_err());
    }

    // ============================================================================
    // Loading from disk
    // ============================================================================

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "enabled = false").unwrap();

        let config = TraceConfig::load(file.path()).unwrap();
        assert!(!config.enabled);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        match TraceConfig::load(&missing) {
            Err(ConfigError::Read { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn no_color_turns_color_off() {
        let config = TraceConfig::default().with_no_color(true);
        assert!(!config.color);

        let config = TraceConfig::default().with_no_color(false);
        assert!(config.color);
    }
}
