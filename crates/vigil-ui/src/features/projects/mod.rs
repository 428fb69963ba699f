//! Projects-management feature: filters, paging, selection, bulk and row
//! actions, dialogs and the screen controller.

pub mod bulk;
pub mod dialogs;
pub mod error;
pub mod pagination;
pub mod row_actions;
pub mod screen;
pub mod state;
pub mod submission;
#[cfg(target_arch = "wasm32")]
pub mod view;
