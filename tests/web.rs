//! Smoke tests for the WASM exports; run with `wasm-pack test --headless --chrome`
#![cfg(target_arch = "wasm32")]

use serde_json::Value;
use session_juggler::{handle_message, parse_domain};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn parse_domain_returns_structured_identity() {
    let value: Value = serde_wasm_bindgen::from_value(parse_domain("https://news.bbc.co.uk/x")).unwrap();

    assert_eq!(value["registrableDomain"], "bbc.co.uk");
    assert_eq!(value["subdomain"], "news");
    assert_eq!(value["isIpAddress"], false);
}

#[wasm_bindgen_test]
async fn unknown_action_comes_back_as_failure_envelope() {
    let request = serde_wasm_bindgen::to_value(&serde_json::json!({ "action": "NOPE" })).unwrap();

    let response: Value = serde_wasm_bindgen::from_value(handle_message(request).await).unwrap();

    assert_eq!(response["success"], false);
    assert_eq!(response["message"], "Unknown action: NOPE");
}

#[wasm_bindgen_test]
async fn malformed_request_comes_back_as_failure_envelope() {
    let response: Value = serde_wasm_bindgen::from_value(handle_message(JsValue::from(42)).await).unwrap();

    assert_eq!(response["success"], false);
}
