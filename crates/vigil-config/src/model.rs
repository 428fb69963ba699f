//! Typed configuration for the console.

use serde::{Deserialize, Serialize};
use vigil_api_models::{FeatureFlags, Qualifier};

/// Rows fetched per page when the configuration does not say otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Upper bound accepted for the page size.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConsoleConfig {
    /// Base URL of the REST API; empty means same origin.
    pub api_base_url: String,
    /// Rows fetched per page.
    pub page_size: u32,
    /// Qualifiers the instance exposes, in filter order.
    pub qualifiers: Vec<Qualifier>,
    /// Locale code for the translation bundle.
    pub locale: String,
    /// Instance features.
    pub features: FeatureFlags,
    /// Logging preferences.
    pub logging: LoggingSettings,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            qualifiers: Qualifier::all().to_vec(),
            locale: "en".to_string(),
            features: FeatureFlags::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ConsoleConfig {
    /// Whether the qualifier filter control should be offered.
    #[must_use]
    pub fn shows_qualifier_filter(&self) -> bool {
        self.qualifiers.len() > 1
    }
}

/// Logging preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Level directive (e.g. `info`, `vigil_ui=debug`).
    pub level: String,
    /// Output format name (`json` or `pretty`); inferred from the build when absent.
    pub format: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}
