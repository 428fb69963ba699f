//! Validation helpers and parsing utilities for configuration values.

use std::collections::HashSet;

use vigil_api_models::Qualifier;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{ConsoleConfig, MAX_PAGE_SIZE};

/// Check every cross-field invariant of the configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first offending field.
pub fn validate(config: &ConsoleConfig) -> ConfigResult<()> {
    check_page_size(config.page_size)?;
    if config.qualifiers.is_empty() {
        return Err(ConfigError::InvalidField {
            field: "qualifiers",
            value: None,
            reason: "at least one qualifier is required",
        });
    }
    let mut seen = HashSet::new();
    for qualifier in &config.qualifiers {
        if !seen.insert(*qualifier) {
            return Err(ConfigError::InvalidField {
                field: "qualifiers",
                value: Some(qualifier.code().to_string()),
                reason: "duplicate qualifier",
            });
        }
    }
    if !seen.contains(&Qualifier::Project) {
        return Err(ConfigError::InvalidField {
            field: "qualifiers",
            value: None,
            reason: "projects must always be listed",
        });
    }
    if config.locale.trim().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "locale",
            value: None,
            reason: "must not be empty",
        });
    }
    Ok(())
}

pub(crate) fn parse_page_size(raw: &str) -> ConfigResult<u32> {
    let value = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidField {
            field: "page_size",
            value: Some(raw.to_string()),
            reason: "must be an integer",
        })?;
    check_page_size(value)?;
    Ok(value)
}

pub(crate) fn parse_bool(field: &'static str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidField {
            field,
            value: Some(raw.to_string()),
            reason: "must be a boolean",
        }),
    }
}

fn check_page_size(value: u32) -> ConfigResult<()> {
    if (1..=MAX_PAGE_SIZE).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidField {
            field: "page_size",
            value: Some(value.to_string()),
            reason: "must be between 1 and 500",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        assert!(validate(&ConsoleConfig::default()).is_ok());
    }

    #[test]
    fn qualifiers_must_include_projects_without_duplicates() {
        let mut config = ConsoleConfig {
            qualifiers: vec![Qualifier::Portfolio],
            ..ConsoleConfig::default()
        };
        assert!(validate(&config).is_err());

        config.qualifiers = vec![Qualifier::Project, Qualifier::Project];
        let err = validate(&config).err();
        assert!(matches!(
            err,
            Some(ConfigError::InvalidField {
                reason: "duplicate qualifier",
                ..
            })
        ));

        config.qualifiers.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn page_size_parsing_enforces_bounds() {
        assert_eq!(parse_page_size(" 50 ").ok(), Some(50));
        assert!(parse_page_size("501").is_err());
        assert!(parse_page_size("fifty").is_err());
    }

    #[test]
    fn booleans_accept_common_spellings() {
        assert_eq!(parse_bool("flag", "ON").ok(), Some(true));
        assert_eq!(parse_bool("flag", "0").ok(), Some(false));
        assert!(parse_bool("flag", "maybe").is_err());
    }
}
