//! Content Script
//!
//! Attaches a [`Session`] to the milestone board, feeds it child-list
//! mutations and configuration changes, and fetches issue hierarchies
//! through the background worker.

use std::rc::Rc;

use async_trait::async_trait;
use board_engine::markup::{BOARD_ID, PROJECT_ID_ATTR};
use board_engine::{ChildDescriptor, ChildFetch, FetchError, FlagsPatch, HierarchySource, MutationKind, Session};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::task::{LocalFutureObj, LocalSpawn, SpawnError};
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

use crate::browser;
use crate::error::ExtensionError;
use crate::messages::{parse_message, FetchIssueDetails, FetchReply, IncomingMessage};
use crate::web_dom::WebDom;

/// Asks the background worker, which may call GitLab cross-origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeHierarchy;

#[async_trait(?Send)]
impl HierarchySource for RuntimeHierarchy {
    async fn fetch_children(&self, request: &ChildFetch) -> Result<Vec<ChildDescriptor>, FetchError> {
        let reply: FetchReply = browser::send_runtime_message(&FetchIssueDetails::new(request))
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        reply.into_children()
    }
}

/// Runs continuations on the page's microtask queue.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserSpawner;

impl LocalSpawn for BrowserSpawner {
    fn spawn_local_obj(&self, future: LocalFutureObj<'static, ()>) -> Result<(), SpawnError> {
        wasm_bindgen_futures::spawn_local(future);
        Ok(())
    }
}

type BoardSession = Session<WebDom, RuntimeHierarchy, BrowserSpawner>;

pub fn start() -> Result<(), ExtensionError> {
    let window = web_sys::window().ok_or(ExtensionError::MissingBoard("window"))?;
    let document = window.document().ok_or(ExtensionError::MissingBoard("document"))?;
    let board = document
        .get_element_by_id(BOARD_ID)
        .ok_or(ExtensionError::MissingBoard("#tab-issues"))?;
    let project = document
        .query_selector(&format!("[{}]", PROJECT_ID_ATTR))?
        .and_then(|el| el.get_attribute(PROJECT_ID_ATTR));
    info!("content script starting, project {:?}", project);

    let session = Rc::new(Session::new(
        WebDom::new(document, board.clone()),
        project,
        RuntimeHierarchy,
        BrowserSpawner,
    ));

    observe_board(&board, Rc::clone(&session))?;
    listen_for_flags(Rc::clone(&session));

    wasm_bindgen_futures::spawn_local(async move {
        let patch = match browser::load_flags().await {
            Ok(flags) => FlagsPatch::from(flags),
            Err(e) => {
                warn!("could not load stored flags, using defaults: {}", e);
                FlagsPatch::default()
            }
        };
        session.apply_config(&patch);
    });
    Ok(())
}

fn observe_board(board: &Element, session: Rc<BoardSession>) -> Result<(), ExtensionError> {
    let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(move |records: js_sys::Array, _observer: MutationObserver| {
        let batch: Vec<MutationKind> = records
            .iter()
            .filter_map(|record| record.dyn_into::<MutationRecord>().ok())
            .filter_map(|record| MutationKind::from_record_type(&record.type_()))
            .collect();
        session.handle_mutations(&batch);
    });

    let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
    let init = MutationObserverInit::new();
    init.set_child_list(true);
    observer.observe_with_options(board, &init)?;
    callback.forget();
    debug!("mutation observer attached to #{}", BOARD_ID);
    Ok(())
}

fn listen_for_flags(session: Rc<BoardSession>) {
    browser::on_runtime_message(Box::new(move |message| -> Option<LocalBoxFuture<'static, serde_json::Value>> {
        match parse_message(&message) {
            Ok(IncomingMessage::FlagsUpdated(patch)) => {
                info!("flags updated from settings");
                session.apply_config(&patch);
                Some(async { serde_json::Value::Bool(true) }.boxed_local())
            }
            Ok(_) => None,
            Err(e) => {
                debug!("ignoring message: {}", e);
                None
            }
        }
    }));
}
