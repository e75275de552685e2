//! Milestone Lens
//!
//! Browser extension overlay for GitLab milestone boards. One WASM module
//! serves three scripts: the content script reconciling the board, the
//! background worker talking to the GitLab API, and the settings popup.

pub mod error;
pub mod gitlab;
pub mod logging;
pub mod messages;

#[cfg(target_arch = "wasm32")]
mod background;
#[cfg(target_arch = "wasm32")]
mod browser;
#[cfg(target_arch = "wasm32")]
mod content;
#[cfg(target_arch = "wasm32")]
mod popup;
#[cfg(target_arch = "wasm32")]
mod web_dom;

pub use error::ExtensionError;
pub use gitlab::{GitLabClient, GitLabConfig};

#[cfg(target_arch = "wasm32")]
mod entry {
    use tracing::{error, info};
    use wasm_bindgen::prelude::*;

    use crate::error::ExtensionError;

    fn boot() {
        console_error_panic_hook::set_once();
        crate::logging::init();
    }

    #[wasm_bindgen]
    pub fn start_content() {
        boot();
        match crate::content::start() {
            Ok(()) => {}
            Err(ExtensionError::MissingBoard(what)) => info!("no milestone board here ({} missing)", what),
            Err(e) => error!("content script failed to start: {}", e),
        }
    }

    #[wasm_bindgen]
    pub fn start_background() {
        boot();
        crate::background::start();
    }

    #[wasm_bindgen]
    pub fn start_popup() {
        boot();
        leptos::mount::mount_to_body(crate::popup::SettingsPanel);
    }
}
