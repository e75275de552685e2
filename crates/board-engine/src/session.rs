//! Session Driver
//!
//! Glues a [`Reconciler`] to a live tree, a [`HierarchySource`] and a local
//! executor. Everything is single-threaded: state lives behind
//! `Rc<RefCell<_>>` and no borrow is held across a spawn or an await.

use std::cell::RefCell;
use std::rc::Rc;

use futures::task::{LocalSpawn, LocalSpawnExt};
use tracing::warn;

use crate::dom::BoardDom;
use crate::error::FetchError;
use crate::flags::FlagsPatch;
use crate::hierarchy::{ChildFetch, HierarchySource};
use crate::reconciler::{MutationKind, Reconciler};

struct State<D: BoardDom> {
    dom: D,
    reconciler: Reconciler<D::Node>,
}

pub struct Session<D: BoardDom, H, S> {
    state: Rc<RefCell<State<D>>>,
    source: Rc<H>,
    spawner: S,
}

impl<D, H, S> Session<D, H, S>
where
    D: BoardDom + 'static,
    H: HierarchySource + 'static,
    S: LocalSpawn,
{
    pub fn new(dom: D, project: Option<String>, source: H, spawner: S) -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                dom,
                reconciler: Reconciler::new(project),
            })),
            source: Rc::new(source),
            spawner,
        }
    }

    pub fn source(&self) -> &H {
        &self.source
    }

    /// Read access to the tree and reconciler between events.
    pub fn inspect<R>(&self, f: impl FnOnce(&D, &Reconciler<D::Node>) -> R) -> R {
        let state = self.state.borrow();
        f(&state.dom, &state.reconciler)
    }

    /// Runs `f` against the tree, as the host page would.
    pub fn with_dom_mut<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.state.borrow_mut().dom)
    }

    pub fn apply_config(&self, patch: &FlagsPatch) {
        let fetches = {
            let mut state = self.state.borrow_mut();
            let State { dom, reconciler } = &mut *state;
            reconciler.apply_config(dom, patch)
        };
        self.spawn_fetches(fetches);
    }

    pub fn handle_mutations(&self, batch: &[MutationKind]) {
        let fetches = {
            let mut state = self.state.borrow_mut();
            let State { dom, reconciler } = &mut *state;
            reconciler.handle_mutations(dom, batch)
        };
        self.spawn_fetches(fetches);
    }

    fn spawn_fetches(&self, fetches: Vec<ChildFetch>) {
        for fetch in fetches {
            let state = Rc::clone(&self.state);
            let source = Rc::clone(&self.source);
            let request = fetch.clone();
            let task = async move {
                let result = source.fetch_children(&request).await;
                let mut state = state.borrow_mut();
                let State { dom, reconciler } = &mut *state;
                reconciler.complete_fetch(dom, &request, result);
            };
            if let Err(e) = self.spawner.spawn_local(task) {
                warn!("could not spawn child fetch for issue {}: {}", fetch.issue, e);
                let mut state = self.state.borrow_mut();
                let State { dom, reconciler } = &mut *state;
                reconciler.complete_fetch(dom, &fetch, Err(FetchError::Spawn(e.to_string())));
            }
        }
    }
}
