//! Shared configuration loader for the nafolia converters.
//!
//! `defaults/nafolia.default.toml` is embedded into every binary so that the documented
//! defaults and the runtime behaviour stay in sync. Applications layer user files and single
//! overrides on top of those defaults via [`Loader`] before deserializing into
//! [`NafoliaConfig`], which then turns into [`ConvertOptions`] for the conversion engine.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use nafolia_babel::{ConvertOptions, SenseMode};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/nafolia.default.toml");

/// Top-level configuration, one section per direction.
#[derive(Debug, Clone, Deserialize)]
pub struct NafoliaConfig {
    pub naf2folia: NafToFoliaConfig,
    pub folia2naf: FoliaToNafConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NafToFoliaConfig {
    pub sense_mode: SenseMode,
    pub set_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoliaToNafConfig {
    pub tested_versions: Vec<String>,
    pub processor_name: String,
    pub processor_version: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl NafoliaConfig {
    /// Conversion options for both directions. Document id and source name are per input and
    /// stay unset.
    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            sense_mode: self.naf2folia.sense_mode,
            set_base_url: self.naf2folia.set_base_url.clone(),
            tested_versions: self.folia2naf.tested_versions.clone(),
            processor_name: self.folia2naf.processor_name.clone(),
            processor_version: self.folia2naf.processor_version.clone(),
            timestamp: self.folia2naf.timestamp.clone(),
            ..ConvertOptions::default()
        }
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. from `--set key=value`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Apply a `key=value` override as typed on the command line.
    pub fn set_assignment(self, assignment: &str) -> Result<Self, ConfigError> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            ConfigError::Message(format!("expected key=value, got '{assignment}'"))
        })?;
        self.set_override(key.trim(), value.trim())
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<NafoliaConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<NafoliaConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.naf2folia.sense_mode, SenseMode::Ranked);
        assert_eq!(config.folia2naf.tested_versions, ["1.2.0"]);
        assert_eq!(config.folia2naf.timestamp, None);
    }

    #[test]
    fn defaults_match_library_defaults() {
        let options = load_defaults().expect("defaults").convert_options();
        let library = ConvertOptions::default();
        assert_eq!(options.set_base_url, library.set_base_url);
        assert_eq!(options.tested_versions, library.tested_versions);
        assert_eq!(options.processor_name, library.processor_name);
        assert_eq!(options.sense_mode, library.sense_mode);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("naf2folia.sense_mode", "flat")
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.naf2folia.sense_mode, SenseMode::Flat);
    }

    #[rstest]
    #[case("folia2naf.timestamp=2024-01-01T00:00:00Z", true)]
    #[case(" folia2naf.processor_name = mytool ", true)]
    #[case("folia2naf.processor_name", false)]
    fn command_line_assignments(#[case] assignment: &str, #[case] valid: bool) {
        assert_eq!(Loader::new().set_assignment(assignment).is_ok(), valid);
    }

    #[test]
    fn assignment_reaches_options() {
        let options = Loader::new()
            .set_assignment("folia2naf.timestamp=2024-01-01T00:00:00Z")
            .and_then(Loader::build)
            .expect("config to build")
            .convert_options();
        assert_eq!(options.timestamp.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn unknown_sense_mode_is_rejected() {
        let result = Loader::new()
            .set_override("naf2folia.sense_mode", "weighted")
            .and_then(Loader::build);
        assert!(result.is_err());
    }

    #[test]
    fn missing_files() {
        let absent = "/nonexistent/nafolia.toml";
        assert!(Loader::new().with_file(absent).build().is_err());
        assert!(Loader::new().with_optional_file(absent).build().is_ok());
    }
}
