//! Sticky header binding.
//!
//! Native `scroll` offsets and `wheel` deltas both go to the engine; the
//! config decides which one drives the show/hide decision. Transitions set
//! `header--hidden` on `[data-sticky-header]`, position sets `header--scrolled`.

use sf_api_types::Visibility;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{Element, WheelEvent};

use crate::dom;
use crate::events;
use crate::state::Engine;

const HIDDEN_CLASS: &str = "header--hidden";
const SCROLLED_CLASS: &str = "header--scrolled";

/// Approximate pixel height of one wheel line in `DOM_DELTA_LINE` mode.
const LINE_HEIGHT_PX: f64 = 16.0;

pub fn bind_header(engine: &Rc<Engine>) -> Result<(), JsValue> {
    let Some(header_el) = dom::query("[data-sticky-header]") else {
        gloo_console::debug!("no [data-sticky-header] element; header tracking disabled");
        return Ok(());
    };

    {
        let el = header_el.clone();
        engine.header.borrow_mut().on_transition(move |transition| {
            dom::set_class(&el, HIDDEN_CLASS, transition.to == Visibility::Hidden);
        });
    }

    let window = dom::window();

    // The page may load already scrolled; the wheel fallback has to start
    // from that offset rather than zero.
    engine
        .header
        .borrow_mut()
        .sync_position(window.scroll_y().unwrap_or(0.0));
    after_sample(engine, &header_el);

    let engine_scroll = engine.clone();
    let el_scroll = header_el.clone();
    events::listen_passive(&window, "scroll", move |_: web_sys::Event| {
        let y = dom::window().scroll_y().unwrap_or(0.0);
        engine_scroll
            .header
            .borrow_mut()
            .on_native_scroll(y, js_sys::Date::now());
        after_sample(&engine_scroll, &el_scroll);
    })?;

    let engine_wheel = engine.clone();
    let el_wheel = header_el;
    events::listen_passive(&window, "wheel", move |e: WheelEvent| {
        let delta = match e.delta_mode() {
            WheelEvent::DOM_DELTA_LINE => e.delta_y() * LINE_HEIGHT_PX,
            WheelEvent::DOM_DELTA_PAGE => e.delta_y() * viewport_height(),
            _ => e.delta_y(),
        };
        engine_wheel.header.borrow_mut().on_wheel(delta, js_sys::Date::now());
        after_sample(&engine_wheel, &el_wheel);
    })?;

    Ok(())
}

fn viewport_height() -> f64 {
    dom::window()
        .inner_height()
        .ok()
        .and_then(|h| h.as_f64())
        .unwrap_or(800.0)
}

fn after_sample(engine: &Engine, header_el: &Element) {
    let header = engine.header.borrow();
    dom::set_class(header_el, SCROLLED_CLASS, header.is_past_threshold());

    if engine.config.debug {
        if let Some(diagnostics) = header.diagnostics() {
            if let Ok(json) = serde_json::to_string(diagnostics) {
                gloo_console::debug!(json);
            }
        }
    }
}
