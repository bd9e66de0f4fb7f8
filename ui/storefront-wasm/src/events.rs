//! Event binding.
//!
//! Wires window and button listeners to the engine. Async handlers are
//! spawned with `wasm_bindgen_futures::spawn_local`.

use std::rc::Rc;
use wasm_bindgen::convert::FromWasmAbi;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, EventTarget};

use crate::header;
use crate::membership;
use crate::state::Engine;

/// Attach a listener for the lifetime of the page.
pub fn listen<E, F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
{
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    cb.forget();
    Ok(())
}

/// Same as `listen`, registered as passive so scrolling is never blocked.
pub fn listen_passive<E, F>(target: &EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    E: FromWasmAbi + 'static,
    F: FnMut(E) + 'static,
{
    let options = AddEventListenerOptions::new();
    options.set_passive(true);
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(E)>);
    target.add_event_listener_with_callback_and_add_event_listener_options(
        event,
        cb.as_ref().unchecked_ref(),
        &options,
    )?;
    cb.forget();
    Ok(())
}

/// Bind all listeners. Call once after the engine is installed.
pub fn bind_events(engine: &Rc<Engine>) -> Result<(), JsValue> {
    header::bind_header(engine)?;
    membership::bind_membership_buttons(engine)?;
    Ok(())
}
