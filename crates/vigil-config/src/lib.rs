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

//! Console configuration for the projects management screen.
//!
//! Layout: `model.rs` (typed configuration and defaults), `loader.rs` (JSON
//! documents and environment overrides), `validate.rs` (invariant checks),
//! `error.rs` (`ConfigError`).

pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_DOCUMENT, ENV_API_URL, ENV_GITHUB_PROVISIONING, ENV_LOG_LEVEL, ENV_PAGE_SIZE};
pub use model::{ConsoleConfig, DEFAULT_PAGE_SIZE, LoggingSettings, MAX_PAGE_SIZE};
