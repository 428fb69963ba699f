//! Dialog shell with header, inline error, body and footer buttons.

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub(crate) struct ModalProps {
    pub(crate) title: AttrValue,
    #[prop_or_default]
    pub(crate) error: Option<AttrValue>,
    #[prop_or_default]
    pub(crate) success: Option<AttrValue>,
    pub(crate) submit_label: AttrValue,
    pub(crate) cancel_label: AttrValue,
    #[prop_or_default]
    pub(crate) submit_disabled: bool,
    #[prop_or_default]
    pub(crate) on_submit: Callback<()>,
    #[prop_or_default]
    pub(crate) on_close: Callback<()>,
    #[prop_or_default]
    pub(crate) children: Children,
}

#[function_component(Modal)]
pub(crate) fn modal(props: &ModalProps) -> Html {
    let on_close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_| on_close.emit(()))
    };
    let on_submit = {
        let on_submit = props.on_submit.clone();
        Callback::from(move |_| on_submit.emit(()))
    };

    html! {
        <div class="modal modal-open" role="dialog" aria-modal="true">
            <div class="modal-box">
                <h2>{props.title.clone()}</h2>
                if let Some(error) = &props.error {
                    <div class="alert alert-error" role="alert">{error.clone()}</div>
                }
                if let Some(success) = &props.success {
                    <div class="alert alert-success" role="status">{success.clone()}</div>
                }
                { for props.children.iter() }
                <div class="modal-action">
                    <button class="btn btn-primary" disabled={props.submit_disabled} onclick={on_submit}>
                        {props.submit_label.clone()}
                    </button>
                    <button class="btn" onclick={on_close.clone()}>{props.cancel_label.clone()}</button>
                </div>
            </div>
            <button class="modal-backdrop" onclick={on_close}></button>
        </div>
    }
}
