#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Console entry point.
//!
//! On wasm32 this mounts the projects screen. Natively it resolves the
//! `VIGIL_*` environment into the `vigil.json` document the browser build
//! fetches next to its bundle, and prints it to stdout.

#[cfg(target_arch = "wasm32")]
fn main() {
    vigil_ui::run_app();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use std::io::Write;
    use std::process::ExitCode;

    use tracing::{error, info};
    use vigil_config::{CONFIG_DOCUMENT, ConsoleConfig};
    use vigil_telemetry::{LogFormat, LoggingConfig, init_logging, log_format_from_config};

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            let _ = writeln!(std::io::stderr(), "vigil-ui: {err}");
            return ExitCode::FAILURE;
        }
    };
    let logging = LoggingConfig {
        level: &config.logging.level,
        format: log_format_from_config(config.logging.format.as_deref())
            .unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        let _ = writeln!(std::io::stderr(), "vigil-ui: {err}");
    }

    let document = match render_document(&config) {
        Ok(document) => document,
        Err(err) => {
            error!(error = %err, "configuration document could not be rendered");
            return ExitCode::FAILURE;
        }
    };
    info!(
        document = CONFIG_DOCUMENT,
        api_base_url = %config.api_base_url,
        page_size = config.page_size,
        github_provisioning = config.features.github_provisioning,
        "configuration resolved"
    );
    if writeln!(std::io::stdout(), "{document}").is_err() {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[cfg(not(target_arch = "wasm32"))]
fn render_document(config: &vigil_config::ConsoleConfig) -> serde_json::Result<String> {
    serde_json::to_string_pretty(config)
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use vigil_config::ConsoleConfig;

    #[test]
    fn rendered_document_is_what_the_browser_loads() -> anyhow::Result<()> {
        let config = ConsoleConfig::default().apply_env_overrides(|key| match key {
            vigil_config::ENV_GITHUB_PROVISIONING => Some("true".to_string()),
            vigil_config::ENV_PAGE_SIZE => Some("25".to_string()),
            _ => None,
        })?;
        let document = render_document(&config)?;
        assert!(document.contains("\"githubProvisioning\": true"));

        let served = ConsoleConfig::from_optional_json(Some(&document))?;
        assert_eq!(served, config);
        assert!(served.features.github_provisioning);
        Ok(())
    }
}
