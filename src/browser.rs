//! WebExtension API Bindings
//!
//! Promise-based `chrome.*` calls. Firefox exposes the same namespace.

use board_engine::{Flags, FlagsPatch};
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

use crate::error::ExtensionError;
use crate::messages::FlagsUpdated;

/// Tabs that may host a milestone board.
pub const GITLAB_TABS: &str = "*://gitlab.com/*";

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    async fn storage_get(keys: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    async fn storage_set(items: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "runtime"], js_name = sendMessage)]
    async fn runtime_send_message(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    fn add_runtime_listener(listener: &Closure<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>);

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    async fn tabs_query(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    async fn tabs_send_message(tab_id: f64, message: JsValue) -> Result<JsValue, JsValue>;
}

/// Plain objects rather than `Map`s, as the extension APIs expect.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, ExtensionError> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, ExtensionError> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

// ========================
// Storage
// ========================

/// Stored flags, with defaults for anything never saved.
pub async fn load_flags() -> Result<Flags, ExtensionError> {
    let defaults = to_js(&FlagsPatch::from(Flags::default()))?;
    let stored: serde_json::Value = from_js(storage_get(defaults).await?)?;
    Ok(Flags::default().merged(&Flags::patch_from_json(&stored)))
}

pub async fn save_flags(flags: Flags) -> Result<(), ExtensionError> {
    storage_set(to_js(&FlagsPatch::from(flags))?).await?;
    Ok(())
}

// ========================
// Messaging
// ========================

pub async fn send_runtime_message<T: Serialize, R: DeserializeOwned>(message: &T) -> Result<R, ExtensionError> {
    let reply = runtime_send_message(to_js(message)?).await?;
    from_js(reply)
}

/// Sends `flagsUpdated` to every GitLab tab; returns how many accepted it.
pub async fn broadcast_flags(flags: Flags) -> Result<usize, ExtensionError> {
    let query = to_js(&serde_json::json!({ "url": GITLAB_TABS }))?;
    let tabs: js_sys::Array = tabs_query(query).await?.dyn_into()?;
    let message = to_js(&FlagsUpdated::new(flags))?;

    let mut delivered = 0;
    for tab in tabs.iter() {
        let Some(tab_id) = js_sys::Reflect::get(&tab, &JsValue::from_str("id"))?.as_f64() else {
            continue;
        };
        // Tabs without the content script reject the message.
        match tabs_send_message(tab_id, message.clone()).await {
            Ok(_) => delivered += 1,
            Err(e) => debug!("tab {} did not take flags: {:?}", tab_id, e),
        }
    }
    Ok(delivered)
}

/// Handler for incoming runtime messages. Returning a future keeps the
/// channel open until it resolves and its value is sent back.
pub type MessageHandler = dyn Fn(serde_json::Value) -> Option<LocalBoxFuture<'static, serde_json::Value>>;

pub fn on_runtime_message(handler: Box<MessageHandler>) {
    let listener = Closure::<dyn FnMut(JsValue, JsValue, js_sys::Function) -> JsValue>::new(
        move |message: JsValue, _sender: JsValue, send_response: js_sys::Function| {
            let message: serde_json::Value = match from_js(message) {
                Ok(message) => message,
                Err(e) => {
                    debug!("ignoring unreadable runtime message: {}", e);
                    return JsValue::FALSE;
                }
            };
            let Some(reply) = handler(message) else {
                return JsValue::FALSE;
            };
            wasm_bindgen_futures::spawn_local(async move {
                let value = reply.await;
                let sent = to_js(&value).and_then(|js| Ok(send_response.call1(&JsValue::NULL, &js)?));
                if let Err(e) = sent {
                    warn!("could not answer runtime message: {}", e);
                }
            });
            JsValue::TRUE
        },
    );
    add_runtime_listener(&listener);
    listener.forget();
}
