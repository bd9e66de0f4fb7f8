//! Engine state shared by every event handler.
//!
//! Held in a `thread_local!` (WASM is single-threaded) and handed out as
//! `Rc<Engine>` so async handlers can keep it across an await.

use sf_api_types::MembershipKind;
use sf_config::EngineConfig;
use sf_scroll::HeaderVisibility;
use sf_toggle::{InMemoryMembershipStore, ToggleMutator};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// localStorage key holding a JSON `EngineConfig`.
pub const CONFIG_KEY: &str = "sf_engine_config";

pub struct Engine {
    pub config: EngineConfig,
    pub wishlist: ToggleMutator<InMemoryMembershipStore>,
    pub cart: ToggleMutator<InMemoryMembershipStore>,
    pub header: RefCell<HeaderVisibility>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            wishlist: ToggleMutator::new(InMemoryMembershipStore::default()),
            cart: ToggleMutator::new(InMemoryMembershipStore::default()),
            header: RefCell::new(HeaderVisibility::new(&config)),
            config,
        }
    }

    pub fn mutator(&self, kind: MembershipKind) -> &ToggleMutator<InMemoryMembershipStore> {
        match kind {
            MembershipKind::Wishlist => &self.wishlist,
            MembershipKind::Cart => &self.cart,
        }
    }
}

thread_local! {
    static ENGINE: RefCell<Option<Rc<Engine>>> = const { RefCell::new(None) };
}

pub fn install(engine: Engine) -> Rc<Engine> {
    let engine = Rc::new(engine);
    ENGINE.with(|slot| *slot.borrow_mut() = Some(engine.clone()));
    engine
}

pub fn engine() -> Option<Rc<Engine>> {
    ENGINE.with(|slot| slot.borrow().clone())
}

/// Config from localStorage, or defaults when absent or invalid.
pub fn load_config() -> EngineConfig {
    let Some(raw) = local_get(CONFIG_KEY) else {
        return EngineConfig::default();
    };
    match EngineConfig::from_json(&raw) {
        Ok(config) => config,
        Err(err) => {
            gloo_console::warn!(format!("ignoring {CONFIG_KEY}: {err}"));
            EngineConfig::default()
        }
    }
}

// ── localStorage helpers ──

fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn local_get(key: &str) -> Option<String> {
    storage()?.get_item(key).ok()?
}

pub fn local_set(key: &str, value: &str) -> Result<(), JsValue> {
    let s = storage().ok_or_else(|| JsValue::from_str("localStorage unavailable"))?;
    s.set_item(key, value)
}
