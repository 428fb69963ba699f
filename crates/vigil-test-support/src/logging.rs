//! Tracing subscriber for test runs.

use std::sync::Once;

use vigil_config::LoggingSettings;
use vigil_telemetry::{LogFormat, LoggingConfig, init_logging, log_format_from_config};

static INIT: Once = Once::new();

/// Install the console's logging stack once per test binary.
///
/// Later calls are no-ops; `RUST_LOG` overrides the default level.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let settings = LoggingSettings::default();
        let format = log_format_from_config(settings.format.as_deref()).unwrap_or(LogFormat::Pretty);
        let config = LoggingConfig {
            level: &settings.level,
            format,
            build_sha: "test",
        };
        if let Err(err) = init_logging(&config) {
            tracing::debug!(error = %err, "test subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialisation_is_harmless() {
        init_test_logging();
        init_test_logging();
        assert!(INIT.is_completed());
    }
}
