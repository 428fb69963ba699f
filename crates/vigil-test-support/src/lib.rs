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

//! Shared test helpers used across integration suites.
//! Layout: backend.rs (in-memory facade implementation), fixtures.rs (projects,
//! users, templates and config), logging.rs (test subscriber).

pub mod backend;
pub mod fixtures;
pub mod logging;

pub use backend::{AppliedTemplate, InMemoryBackend, Operation};
pub use logging::init_test_logging;
