//! Shared UI building blocks.

pub(crate) mod bulk_action_bar;
pub(crate) mod modal;
