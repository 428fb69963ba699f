//! Toolbar above the projects table: check-all toggle, selection count and
//! bulk buttons.
//!
//! # Design
//! - Keep labels/counts and actions fully prop-driven.
//! - Render action buttons through child content.

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub(crate) struct BulkActionBarProps {
    pub(crate) toggle_label: AttrValue,
    pub(crate) selected_label: AttrValue,
    pub(crate) all_checked: bool,
    #[prop_or_default]
    pub(crate) on_toggle_all: Callback<MouseEvent>,
    #[prop_or_default]
    pub(crate) children: Children,
}

#[function_component(BulkActionBar)]
pub(crate) fn bulk_action_bar(props: &BulkActionBarProps) -> Html {
    html! {
        <div class="bulk-actions">
            <input
                type="checkbox"
                aria-label={props.toggle_label.clone()}
                checked={props.all_checked}
                onclick={props.on_toggle_all.clone()}
            />
            <span class="muted">{props.selected_label.clone()}</span>
            <div class="bulk-buttons">
                { for props.children.iter() }
            </div>
        </div>
    }
}
