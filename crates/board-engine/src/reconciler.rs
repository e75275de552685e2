//! Reconciliation Controller
//!
//! Owns the flags, the session store and the review-column state, and runs
//! one idempotent pass over the board per trigger. Passes never await: child
//! fetches are handed back to the caller as [`ChildFetch`] tickets and their
//! results come back through [`Reconciler::complete_fetch`].

use tracing::{debug, info, warn};

use crate::classify::{board_items, item_nodes};
use crate::dom::BoardDom;
use crate::error::FetchError;
use crate::flags::{Flags, FlagsPatch};
use crate::grouping;
use crate::hierarchy::{ChildDescriptor, ChildFetch};
use crate::review::ReviewColumn;
use crate::stats;
use crate::store::SessionStore;
use crate::style;

/// Kind of a single tree-mutation record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    ChildList,
    Attributes,
    CharacterData,
}

impl MutationKind {
    /// Maps a `MutationRecord.type` string.
    pub fn from_record_type(kind: &str) -> Option<Self> {
        match kind {
            "childList" => Some(MutationKind::ChildList),
            "attributes" => Some(MutationKind::Attributes),
            "characterData" => Some(MutationKind::CharacterData),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Reconciler<N> {
    flags: Flags,
    loaded: bool,
    project: Option<String>,
    store: SessionStore<N>,
    review: ReviewColumn<N>,
}

impl<N: Clone + PartialEq + std::fmt::Debug> Reconciler<N> {
    pub fn new(project: Option<String>) -> Self {
        Self {
            flags: Flags::default(),
            loaded: false,
            project,
            store: SessionStore::new(),
            review: ReviewColumn::Absent,
        }
    }

    pub fn store(&self) -> &SessionStore<N> {
        &self.store
    }

    pub fn review(&self) -> &ReviewColumn<N> {
        &self.review
    }

    /// Merges a configuration update and brings the board in line with it.
    ///
    /// A change to `group_children` (and the very first load) resets the
    /// overlay before reconciling; anything else only reconciles.
    pub fn apply_config<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D, patch: &FlagsPatch) -> Vec<ChildFetch> {
        let previous = self.flags;
        self.flags.merge(patch);
        let first_load = !self.loaded;
        self.loaded = true;

        if first_load || previous.group_children != self.flags.group_children {
            info!(
                "configuration {}: group_children={}, resetting overlay",
                if first_load { "loaded" } else { "changed" },
                self.flags.group_children
            );
            self.full_reset(dom);
        } else if previous != self.flags {
            info!("configuration changed, reconciling without reset");
        }
        self.reconcile_all(dom)
    }

    /// Removes every overlay this session applied, except the review column
    /// itself, which the next pass keeps or tears down.
    pub fn full_reset<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D) {
        for node in item_nodes(dom) {
            style::clear_styles(dom, &node);
        }
        grouping::ungroup_all(dom, &mut self.store);
        // While the column stands, the next pass keeps or returns its items itself.
        if !self.review.is_present() {
            let restored = ReviewColumn::restore_moved(dom, &mut self.store);
            if restored > 0 {
                debug!("restored {} review-moved items", restored);
            }
        }
        grouping::remove_empty_child_lists(dom);
        stats::recompute_all(dom, &self.flags);
    }

    /// One full pass. Returns the child fetches it scheduled.
    pub fn reconcile_all<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D) -> Vec<ChildFetch> {
        self.pass(dom, true)
    }

    /// A pass that never schedules fetches, run after a fetch lands so
    /// completions cannot chain into new requests.
    pub fn settle<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D) {
        self.pass(dom, false);
    }

    fn pass<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D, schedule: bool) -> Vec<ChildFetch> {
        let items = board_items(dom);
        let mut fetches = Vec::new();
        for item in &items {
            style::apply_styles(dom, item, &self.flags);
            if schedule {
                if let Some(fetch) = grouping::begin(dom, &mut self.store, &self.flags, item, self.project.as_deref()) {
                    fetches.push(fetch);
                }
            }
        }

        if self.flags.in_review_board {
            if let Err(e) = self.review.reconcile(dom, &mut self.store) {
                warn!("review column unavailable this pass: {}", e);
            }
        } else {
            self.review.teardown_if_disabled(dom, &mut self.store, &self.flags);
        }

        stats::recompute_all(dom, &self.flags);
        debug!("pass over {} items, {} fetches scheduled", items.len(), fetches.len());
        fetches
    }

    /// Applies a finished child fetch and settles the board if anything moved.
    pub fn complete_fetch<D: BoardDom<Node = N> + ?Sized>(
        &mut self,
        dom: &mut D,
        fetch: &ChildFetch,
        result: Result<Vec<ChildDescriptor>, FetchError>,
    ) -> usize {
        let moved = grouping::complete(dom, &mut self.store, &self.flags, fetch, result);
        if moved > 0 {
            self.settle(dom);
        }
        moved
    }

    /// One pass per batch, and only for batches that added or removed nodes.
    pub fn handle_mutations<D: BoardDom<Node = N> + ?Sized>(&mut self, dom: &mut D, batch: &[MutationKind]) -> Vec<ChildFetch> {
        if !self.loaded {
            debug!("mutations before configuration load, ignoring");
            return Vec::new();
        }
        if !batch.contains(&MutationKind::ChildList) {
            return Vec::new();
        }
        self.reconcile_all(dom)
    }
}
