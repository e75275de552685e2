//! Logging Setup
//!
//! Every entry point calls [`init`]; only the first call installs anything.

use rolling_logger::{LoggerError, Sink};

pub const APP_NAME: &str = "milestone-lens";

pub fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "info,milestone_lens=debug,board_engine=debug"
    } else {
        "info"
    }
}

#[cfg(target_arch = "wasm32")]
fn console_sink(level: tracing::Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        tracing::Level::ERROR => web_sys::console::error_1(&line),
        tracing::Level::WARN => web_sys::console::warn_1(&line),
        tracing::Level::DEBUG | tracing::Level::TRACE => web_sys::console::debug_1(&line),
        _ => web_sys::console::log_1(&line),
    }
}

fn sink() -> Sink {
    #[cfg(target_arch = "wasm32")]
    {
        console_sink
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        rolling_logger::stderr_sink
    }
}

pub fn init() {
    match rolling_logger::init_logger(APP_NAME, default_filter(), sink()) {
        Ok(()) | Err(LoggerError::AlreadyInitialized(_)) => {}
        Err(e) => sink()(tracing::Level::ERROR, &format!("[{}] {}", APP_NAME, e)),
    }
}
