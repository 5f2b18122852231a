//! Session Juggler - switch between logged-in accounts on the same site
//! Built with Rust + WASM; runs as the extension's background core

pub mod background;
pub mod badge;
pub mod browser;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod matching;
pub mod session_data;
pub mod site_state;
pub mod storage;

#[cfg(target_arch = "wasm32")]
mod bridge;
#[cfg(test)]
mod testing;

pub use background::{Background, Platform};
pub use commands::{Command, CommandRouter, Request, Response};
pub use domain::DomainInfo;
pub use error::{SessionError, UrlRejection};
pub use session_data::{Cookie, Session, SiteState};

use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
thread_local! {
    static BACKGROUND: std::rc::Rc<Background> = std::rc::Rc::new(Background::new(chrome_platform()));
}

#[cfg(target_arch = "wasm32")]
fn chrome_platform() -> Platform {
    use std::rc::Rc;

    let chrome = Rc::new(bridge::ChromeBridge);
    Platform {
        store: chrome.clone(),
        tabs: chrome.clone(),
        page: chrome.clone(),
        cookies: chrome.clone(),
        badge: chrome,
        clock: Rc::new(bridge::JsClock),
    }
}

#[cfg(target_arch = "wasm32")]
fn background() -> std::rc::Rc<Background> {
    BACKGROUND.with(|bg| bg.clone())
}

// Set up panic hook for better error messages in the browser console
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Badge colors and initial count; call once from the service worker
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn init_background() {
    background().init().await;
}

/// `runtime.onMessage` entry point: `{action, payload?}` in, `{success, message, data?}` out
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn handle_message(request: JsValue) -> JsValue {
    let response = match serde_wasm_bindgen::from_value::<Request>(request) {
        Ok(request) => background().handle_message(request).await,
        Err(e) => Response::failure(format!("Malformed request: {}", e)),
    };

    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    serde::Serialize::serialize(&response, &serializer).unwrap_or(JsValue::NULL)
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn on_tab_activated(tab_id: i32) {
    background()
        .handle_event(events::BrowserEvent::TabActivated { tab_id })
        .await;
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn on_tab_updated(tab_id: i32) {
    background()
        .handle_event(events::BrowserEvent::TabUpdated { tab_id })
        .await;
}

/// `storage.onChanged` entry point, one call per changed key
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn on_storage_changed(key: String, old_value: JsValue, new_value: JsValue) {
    let decode = |value: JsValue| -> Option<serde_json::Value> {
        if value.is_null() || value.is_undefined() {
            None
        } else {
            serde_wasm_bindgen::from_value(value).ok()
        }
    };

    let change = storage::StorageChange {
        key,
        old_value: decode(old_value),
        new_value: decode(new_value),
    };
    background()
        .handle_event(events::BrowserEvent::StorageChanged(change))
        .await;
}

/// Register a UI callback for session list / active pointer changes
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn subscribe_ui(callback: js_sys::Function) {
    background().subscribe(std::rc::Rc::new(move |notification: &events::UiNotification| {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        match serde::Serialize::serialize(notification, &serializer) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    log::warn!("UI listener failed: {:?}", e);
                }
            }
            Err(e) => log::warn!("Cannot serialize notification: {}", e),
        }
    }));
}

// Re-export domain parsing for JavaScript access
#[wasm_bindgen]
pub fn parse_domain(url: &str) -> JsValue {
    serde_wasm_bindgen::to_value(&domain::parse_url(url)).unwrap_or(JsValue::NULL)
}
