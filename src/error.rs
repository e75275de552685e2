//! Extension Errors
//!
//! Failures at the browser boundary. The engine's own errors live in
//! `board_engine::error`; these wrap them when they cross a message channel.

use board_engine::FetchError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("browser API call failed: {0}")]
    Browser(String),

    #[error("board container not found: {0}")]
    MissingBoard(&'static str),

    #[error("could not convert value: {0}")]
    Serde(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl From<serde_json::Error> for ExtensionError {
    fn from(e: serde_json::Error) -> Self {
        ExtensionError::Serde(e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for ExtensionError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        let text = value
            .as_string()
            .or_else(|| js_sys::JSON::stringify(&value).ok().and_then(|s| s.as_string()))
            .unwrap_or_else(|| "unknown JavaScript error".to_string());
        ExtensionError::Browser(text)
    }
}

#[cfg(target_arch = "wasm32")]
impl From<serde_wasm_bindgen::Error> for ExtensionError {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        ExtensionError::Serde(e.to_string())
    }
}
