//! Storefront interaction engine, browser host.
//!
//! Binds the toggle mutator to wishlist/cart buttons and the header
//! visibility machine to window scroll and wheel events. Markup and styling
//! stay in the page; this crate only flips CSS classes.

pub mod api;
pub mod dom;
pub mod events;
pub mod header;
pub mod membership;
pub mod state;

use wasm_bindgen::prelude::*;

/// WASM entry point, called when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let config = state::load_config();
    if config.debug {
        gloo_console::debug!(format!("storefront engine config: {:?}", config));
    }

    let engine = state::install(state::Engine::new(config));
    events::bind_events(&engine)?;

    Ok(())
}

/// Validate and persist an engine config JSON. Applied on the next page load.
#[wasm_bindgen(js_name = setEngineConfig)]
pub fn set_engine_config(json: &str) -> Result<(), JsValue> {
    let config = sf_config::EngineConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let normalized = serde_json::to_string(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    state::local_set(state::CONFIG_KEY, &normalized)
}

/// Current header state as JSON, for pages that style off position.
#[wasm_bindgen(js_name = headerSnapshot)]
pub fn header_snapshot() -> Option<String> {
    let engine = state::engine()?;
    let snapshot = engine.header.borrow().snapshot();
    serde_json::to_string(&snapshot).ok()
}
