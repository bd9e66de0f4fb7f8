//! HTTP API client.
//!
//! Wraps `fetch` for JSON requests to the storefront backend and provides
//! the `MembershipMutation` used by wishlist and cart buttons.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sf_api_types::{EntityId, MembershipKind, MutationOutcome};
use sf_toggle::MembershipMutation;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

use crate::dom;

/// Determine the API base URL.
///
/// Priority: `data-api-base` on `<body>` → same origin.
pub fn base_url() -> String {
    if let Some(body) = dom::body() {
        if let Some(base) = body.get_attribute("data-api-base") {
            let base = base.trim();
            if !base.is_empty() {
                return base.trim_end_matches('/').to_string();
            }
        }
    }

    dom::window().location().origin().unwrap_or_default()
}

/// Perform a fetch request, returning the parsed JSON as `serde_json::Value`.
pub async fn request(path: &str, method: &str, body: Option<String>) -> Result<serde_json::Value, String> {
    let url = format!("{}{}", base_url(), path);

    let opts = RequestInit::new();
    opts.set_method(method);
    opts.set_mode(RequestMode::Cors);

    let headers = Headers::new().map_err(|e| format!("{:?}", e))?;

    if let Some(ref b) = body {
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| format!("{:?}", e))?;
        opts.set_body(&JsValue::from_str(b));
    }

    opts.set_headers(&headers);

    let request = Request::new_with_str_and_init(&url, &opts).map_err(|e| format!("{:?}", e))?;

    let resp_value = JsFuture::from(dom::window().fetch_with_request(&request))
        .await
        .map_err(|e| format!("fetch error: {:?}", e))?;

    let resp: Response = resp_value
        .dyn_into()
        .map_err(|_| "response is not a Response".to_string())?;

    let text = JsFuture::from(resp.text().map_err(|e| format!("{:?}", e))?)
        .await
        .map_err(|e| format!("text error: {:?}", e))?;

    let text_str = text.as_string().unwrap_or_default();

    if !resp.ok() {
        return Err(format!("{} {}: {}", resp.status(), resp.status_text(), text_str));
    }

    serde_json::from_str(&text_str).map_err(|e| format!("JSON parse error: {} (raw: {})", e, text_str))
}

/// POST `/{kind}/toggle` with the membership the user asked for.
pub struct HttpMembershipMutation {
    kind: MembershipKind,
    desired: bool,
}

impl HttpMembershipMutation {
    pub fn new(kind: MembershipKind, desired: bool) -> Self {
        Self { kind, desired }
    }
}

#[async_trait(?Send)]
impl MembershipMutation for HttpMembershipMutation {
    async fn mutate(&self, entity_id: &EntityId) -> Result<MutationOutcome> {
        let body = serde_json::json!({
            "entity_id": entity_id,
            "member": self.desired,
        });
        let path = format!("/{}/toggle", self.kind.as_str());

        let value = request(&path, "POST", Some(body.to_string()))
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(serde_json::from_value(value)?)
    }
}
