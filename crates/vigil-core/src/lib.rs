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
//! Backend facade contracts for the projects management console.
//!
//! Layout: `error.rs` (`ServiceError`), `service.rs` (facade traits and the
//! injectable `Services` bundle).

pub mod error;
pub mod service;

pub use error::{ServiceError, ServiceResult};
pub use service::{
    PermissionService, ProjectCatalog, ProvisioningService, Services, SettingsService,
};
