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

//! Telemetry primitives shared across the Vigil workspace.
//!
//! Layout: `init.rs` (subscriber installation and logging configuration),
//! `sink.rs` (line callback writer for hosts without stderr), `error.rs`
//! (`TelemetryError`).

pub mod error;
pub mod init;
pub mod sink;

pub use error::{Result, TelemetryError};
pub use init::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging, log_format_from_config,
};
pub use sink::{LineSink, init_sink_logging, sink_subscriber};
