//! Feature slices of the console.

pub mod projects;
