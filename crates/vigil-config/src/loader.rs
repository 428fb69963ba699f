//! Loading configuration documents and environment overrides.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ConsoleConfig;
use crate::validate::{parse_bool, parse_page_size, validate};

/// Overrides [`ConsoleConfig::api_base_url`].
pub const ENV_API_URL: &str = "VIGIL_API_URL";
/// Overrides [`ConsoleConfig::page_size`].
pub const ENV_PAGE_SIZE: &str = "VIGIL_PAGE_SIZE";
/// Overrides the logging level.
pub const ENV_LOG_LEVEL: &str = "VIGIL_LOG_LEVEL";
/// Overrides the GitHub provisioning feature flag.
pub const ENV_GITHUB_PROVISIONING: &str = "VIGIL_GITHUB_PROVISIONING";
/// Document the browser console fetches next to its bundle.
pub const CONFIG_DOCUMENT: &str = "vigil.json";

impl ConsoleConfig {
    /// Parse and validate a JSON configuration document.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidField`] when validation fails.
    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self =
            serde_json::from_str(raw).map_err(|source| ConfigError::Parse { source })?;
        validate(&config)?;
        Ok(config)
    }

    /// Configuration served next to the console, or the defaults when the
    /// deployment ships no document.
    ///
    /// # Errors
    ///
    /// See [`ConsoleConfig::from_json_str`].
    pub fn from_optional_json(raw: Option<&str>) -> ConfigResult<Self> {
        let Some(raw) = raw else {
            debug!(document = CONFIG_DOCUMENT, "no configuration document, using defaults");
            let config = Self::default();
            validate(&config)?;
            return Ok(config);
        };
        Self::from_json_str(raw)
    }

    /// Read, parse and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise the
    /// errors of [`ConsoleConfig::from_json_str`].
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Layer `VIGIL_*` overrides on top of the current values.
    ///
    /// `lookup` resolves a variable name to its value so callers can pass
    /// `std::env::var` or a fixed map.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when an override cannot be parsed
    /// or the resulting configuration fails validation.
    pub fn apply_env_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            debug!(variable = ENV_API_URL, "applying configuration override");
            self.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            debug!(variable = ENV_PAGE_SIZE, "applying configuration override");
            self.page_size = parse_page_size(&raw)?;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            debug!(variable = ENV_LOG_LEVEL, "applying configuration override");
            self.logging.level = level.trim().to_string();
        }
        if let Some(raw) = lookup(ENV_GITHUB_PROVISIONING) {
            debug!(
                variable = ENV_GITHUB_PROVISIONING,
                "applying configuration override"
            );
            self.features.github_provisioning = parse_bool(ENV_GITHUB_PROVISIONING, &raw)?;
        }
        validate(&self)?;
        Ok(self)
    }

    /// Defaults layered with the process environment.
    ///
    /// # Errors
    ///
    /// See [`ConsoleConfig::apply_env_overrides`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().apply_env_overrides(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use vigil_api_models::Qualifier;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_document_yields_defaults() -> anyhow::Result<()> {
        let config = ConsoleConfig::from_json_str("{}")?;
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.page_size, 50);
        assert!(config.shows_qualifier_filter());
        Ok(())
    }

    #[test]
    fn document_overrides_selected_fields() -> anyhow::Result<()> {
        let config = ConsoleConfig::from_json_str(
            r#"{"page_size": 20, "qualifiers": ["TRK"], "features": {"githubProvisioning": true}}"#,
        )?;
        assert_eq!(config.page_size, 20);
        assert_eq!(config.qualifiers, vec![Qualifier::Project]);
        assert!(!config.shows_qualifier_filter());
        assert!(config.features.github_provisioning);
        Ok(())
    }

    #[test]
    fn served_document_enables_github_provisioning() -> anyhow::Result<()> {
        let served = ConsoleConfig::from_optional_json(Some(
            r#"{"api_base_url": "https://vigil.example", "features": {"githubProvisioning": true}}"#,
        ))?;
        assert!(served.features.github_provisioning);
        assert_eq!(served.api_base_url, "https://vigil.example");

        let missing = ConsoleConfig::from_optional_json(None)?;
        assert_eq!(missing, ConsoleConfig::default());
        assert!(!missing.features.github_provisioning);

        let err = ConsoleConfig::from_optional_json(Some(r#"{"page_size": 0}"#)).err();
        assert!(matches!(err, Some(ConfigError::InvalidField { .. })));
        Ok(())
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = ConsoleConfig::from_json_str("{page_size").err();
        assert!(matches!(err, Some(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_are_applied_and_validated() -> anyhow::Result<()> {
        let config = ConsoleConfig::default().apply_env_overrides(lookup(&[
            (ENV_API_URL, " https://vigil.example/ "),
            (ENV_PAGE_SIZE, "100"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_GITHUB_PROVISIONING, "yes"),
        ]))?;
        assert_eq!(config.api_base_url, "https://vigil.example");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.logging.level, "debug");
        assert!(config.features.github_provisioning);

        let err = ConsoleConfig::default()
            .apply_env_overrides(lookup(&[(ENV_PAGE_SIZE, "0")]))
            .err();
        assert!(matches!(
            err,
            Some(ConfigError::InvalidField {
                field: "page_size",
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn from_path_reads_file_and_reports_missing_files() -> anyhow::Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(br#"{"locale": "fr"}"#)?;
        let config = ConsoleConfig::from_path(file.path())?;
        assert_eq!(config.locale, "fr");

        let missing = ConsoleConfig::from_path(Path::new("/definitely/missing/vigil.json")).err();
        assert!(matches!(missing, Some(ConfigError::Io { .. })));
        Ok(())
    }
}
