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
#![allow(clippy::module_name_repetitions)]
//! Vigil projects-management console.
//!
//! Layout: `features/projects` holds the screen state machines and the
//! `ProjectsScreen` controller, `i18n` the translation bundles. The Yew view,
//! the REST client and the shared components only build for wasm32.

pub mod features;
pub mod i18n;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod services;

#[cfg(target_arch = "wasm32")]
pub use app::run_app;

pub use features::projects::screen::{PageFetch, ProjectsScreen, RowMenu, RowView};

#[cfg(test)]
mod tests {
    use crate::i18n::{LocaleCode, TranslationBundle};

    #[test]
    fn translation_fallbacks_work() {
        let bundle = TranslationBundle::new(LocaleCode::Fr);
        assert_eq!(bundle.text("qualifiers.create", "Create"), "Créer un projet");
        assert_eq!(bundle.text("qualifiers.missing_key", "Default"), "Default");
    }
}
