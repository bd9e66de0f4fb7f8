//! DOM helpers.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, Window};

pub fn window() -> Window {
    web_sys::window().expect("no global window")
}

fn doc() -> Document {
    window().document().expect("window has no document")
}

pub fn body() -> Option<HtmlElement> {
    doc().body()
}

pub fn query(selector: &str) -> Option<Element> {
    doc().query_selector(selector).ok()?
}

pub fn query_all(selector: &str) -> Vec<Element> {
    let Ok(nl) = doc().query_selector_all(selector) else {
        return Vec::new();
    };
    let mut v = Vec::new();
    for i in 0..nl.length() {
        if let Some(e) = nl.item(i) {
            if let Ok(el) = e.dyn_into::<Element>() {
                v.push(el);
            }
        }
    }
    v
}

pub fn has_class(el: &Element, cls: &str) -> bool {
    el.class_list().contains(cls)
}

pub fn set_class(el: &Element, cls: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(cls, on);
}

pub fn set_attr(el: &Element, name: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            let _ = el.set_attribute(name, v);
        }
        None => {
            let _ = el.remove_attribute(name);
        }
    }
}
