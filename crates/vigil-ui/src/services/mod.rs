//! Backend adapters.

pub(crate) mod api;
