//! Capability implementations over the extension APIs, via `background.js`
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use wasm_bindgen::prelude::*;

use crate::browser::{BadgeSink, BrowserTabs, Clock, CookieJar, SitePageAccess, WebStorageMutation};
use crate::error::{Result, SessionError};
use crate::session_data::{Cookie, CookieSetDetails, TabInfo, WebStorage};
use crate::storage::KeyValueStore;

// Import JS bridge functions
#[wasm_bindgen(module = "/background.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getActiveTab() -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn reloadTab(tab_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn readWebStorage(tab_id: i32) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn clearWebStorage(tab_id: i32) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn writeWebStorage(tab_id: i32, values: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getAllCookies(url: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setCookie(details: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeCookie(url: &str, name: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn removeStorage(key: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn setBadgeText(text: &str) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn setBadgeColors(background: &str, text: &str) -> std::result::Result<(), JsValue>;
}

fn js_error(operation: &str, error: JsValue) -> SessionError {
    let message = error
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(&error, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", error));
    SessionError::storage(operation, message)
}

fn from_js<T: DeserializeOwned>(operation: &str, value: JsValue) -> Result<T> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| SessionError::storage(operation, format!("unexpected shape: {}", e)))
}

fn to_js<T: Serialize>(operation: &str, value: &T) -> Result<JsValue> {
    // plain objects, not Maps, so chrome.* APIs accept them
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value
        .serialize(&serializer)
        .map_err(|e| SessionError::storage(operation, format!("cannot serialize: {}", e)))
}

/// The `chrome.*` APIs as seen from the service worker
pub struct ChromeBridge;

#[async_trait(?Send)]
impl BrowserTabs for ChromeBridge {
    async fn active_tab(&self) -> Result<Option<TabInfo>> {
        let tab = getActiveTab().await.map_err(|e| js_error("query active tab", e))?;
        if tab.is_null() || tab.is_undefined() {
            return Ok(None);
        }
        from_js("query active tab", tab).map(Some)
    }

    async fn reload(&self, tab_id: i32) -> Result<()> {
        reloadTab(tab_id).await.map_err(|e| js_error("reload tab", e))
    }
}

#[async_trait(?Send)]
impl SitePageAccess for ChromeBridge {
    async fn read_web_storage(&self, tab_id: i32) -> Result<WebStorage> {
        let value = readWebStorage(tab_id)
            .await
            .map_err(|e| js_error("read web storage", e))?;
        if value.is_null() || value.is_undefined() {
            return Ok(WebStorage::default());
        }
        from_js("read web storage", value)
    }

    async fn write_web_storage(&self, tab_id: i32, mutation: WebStorageMutation) -> Result<()> {
        match mutation {
            WebStorageMutation::Clear => clearWebStorage(tab_id)
                .await
                .map_err(|e| js_error("clear web storage", e)),
            WebStorageMutation::Insert(values) => {
                let values = to_js("write web storage", &values)?;
                writeWebStorage(tab_id, values)
                    .await
                    .map_err(|e| js_error("write web storage", e))
            }
        }
    }
}

#[async_trait(?Send)]
impl CookieJar for ChromeBridge {
    async fn get_all(&self, url: &str) -> Result<Vec<Cookie>> {
        let cookies = getAllCookies(url).await.map_err(|e| js_error("get cookies", e))?;
        from_js("get cookies", cookies)
    }

    async fn set(&self, details: CookieSetDetails) -> Result<()> {
        let details = to_js("set cookie", &details)?;
        setCookie(details).await.map_err(|e| js_error("set cookie", e))
    }

    async fn remove(&self, url: &str, name: &str) -> Result<()> {
        removeCookie(url, name).await.map_err(|e| js_error("remove cookie", e))
    }
}

#[async_trait(?Send)]
impl KeyValueStore for ChromeBridge {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let value = getStorage(key).await.map_err(|e| js_error("read storage", e))?;
        if value.is_null() || value.is_undefined() {
            return Ok(None);
        }
        from_js("read storage", value).map(Some)
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let value = to_js("write storage", &value)?;
        setStorage(key, value).await.map_err(|e| js_error("write storage", e))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        removeStorage(key).await.map_err(|e| js_error("remove storage key", e))
    }
}

#[async_trait(?Send)]
impl BadgeSink for ChromeBridge {
    async fn set_text(&self, text: &str) -> Result<()> {
        setBadgeText(text).await.map_err(|e| js_error("set badge text", e))
    }

    async fn set_colors(&self, background: &str, text: &str) -> Result<()> {
        setBadgeColors(background, text)
            .await
            .map_err(|e| js_error("set badge colors", e))
    }
}

/// `Date.now()` and the local timezone of the browser
pub struct JsClock;

impl Clock for JsClock {
    fn now_millis(&self) -> i64 {
        js_sys::Date::now() as i64
    }

    fn utc_offset_minutes(&self) -> i32 {
        // getTimezoneOffset is minutes *behind* UTC
        -(js_sys::Date::new_0().get_timezone_offset() as i32)
    }
}
