//! Wishlist and cart buttons.
//!
//! Buttons carry `data-wishlist-id` or `data-cart-id`. An `is-active` class
//! present at load time seeds the engine with the server-rendered state.
//! Store changes are mirrored back as `is-active` / `is-pending`, and a
//! failed toggle leaves its message in `data-toggle-error` for the page's toast.

use gloo_timers::future::TimeoutFuture;
use sf_api_types::{EntityId, MembershipKind};
use sf_toggle::{MembershipChange, MembershipStore};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::api::HttpMembershipMutation;
use crate::dom;
use crate::events;
use crate::state::Engine;

const ACTIVE_CLASS: &str = "is-active";
const PENDING_CLASS: &str = "is-pending";
const ERROR_ATTR: &str = "data-toggle-error";

fn id_attr(kind: MembershipKind) -> &'static str {
    match kind {
        MembershipKind::Wishlist => "data-wishlist-id",
        MembershipKind::Cart => "data-cart-id",
    }
}

fn buttons_for(kind: MembershipKind, entity_id: &EntityId) -> Vec<web_sys::Element> {
    let attr = id_attr(kind);
    dom::query_all(&format!("[{attr}]"))
        .into_iter()
        .filter(|el| el.get_attribute(attr).as_deref() == Some(entity_id.as_str()))
        .collect()
}

pub fn bind_membership_buttons(engine: &Rc<Engine>) -> Result<(), JsValue> {
    for kind in [MembershipKind::Wishlist, MembershipKind::Cart] {
        let attr = id_attr(kind);
        let mutator = engine.mutator(kind);

        mutator.store().subscribe(Rc::new(move |change: &MembershipChange| {
            let state = change.current.unwrap_or_default();
            for el in buttons_for(kind, &change.entity_id) {
                dom::set_class(&el, ACTIVE_CLASS, state.is_member);
                dom::set_class(&el, PENDING_CLASS, state.pending);
            }
        }));

        for el in dom::query_all(&format!("[{attr}]")) {
            let Some(raw_id) = el.get_attribute(attr) else {
                continue;
            };
            let entity_id = EntityId::new(raw_id);
            mutator.seed(&entity_id, dom::has_class(&el, ACTIVE_CLASS));

            let engine = engine.clone();
            events::listen(&el, "click", move |e: web_sys::MouseEvent| {
                e.prevent_default();
                let engine = engine.clone();
                let entity_id = entity_id.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    toggle_entity(engine, kind, entity_id).await;
                });
            })?;
        }
    }
    Ok(())
}

async fn toggle_entity(engine: Rc<Engine>, kind: MembershipKind, entity_id: EntityId) {
    let mutator = engine.mutator(kind);
    let current = mutator.is_member(&entity_id).unwrap_or(false);
    let mutation = HttpMembershipMutation::new(kind, !current);

    let outcome = match engine.config.mutation_timeout_ms {
        Some(ms) => {
            let deadline = TimeoutFuture::new(u32::try_from(ms).unwrap_or(u32::MAX));
            mutator
                .toggle_with_deadline(&entity_id, current, &mutation, deadline)
                .await
        }
        None => mutator.toggle(&entity_id, current, &mutation).await,
    };

    if outcome.is_already_in_progress() {
        return;
    }

    let error = (!outcome.success).then_some(outcome.message.as_str());
    for el in buttons_for(kind, &entity_id) {
        dom::set_attr(&el, ERROR_ATTR, error);
    }
    if let Some(message) = error {
        gloo_console::warn!(format!("{} toggle for {} failed: {}", kind.as_str(), entity_id, message));
    }
}
